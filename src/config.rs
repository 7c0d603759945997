// Run configuration

use crate::compile::LatexCompiler;
use crate::render::ExamMeta;
use std::path::PathBuf;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const DEFAULT_TEX_DIR: &str = "latex";
pub const DEFAULT_GRADING_FILE: &str = "grading.csv";
pub const DEFAULT_PDF_DIR: &str = "pdf";
pub const DEFAULT_LATEX: &str = "pdflatex";
pub const DEFAULT_PASSES: u32 = 2;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub questions_file: PathBuf,
    /// Selects `template_<language>.tex`
    pub language: String,
    pub meta: ExamMeta,
    /// Number of exam variants
    pub count: usize,
    /// `None` (or out of range) uses the whole bank
    pub questions_per_exam: Option<usize>,
    pub seed: Option<u64>,
    pub template_dir: PathBuf,
    pub tex_dir: PathBuf,
    pub grading_path: PathBuf,
    /// `None` skips typesetting
    pub compiler: Option<LatexCompiler>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            questions_file: PathBuf::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            meta: ExamMeta::default(),
            count: 1,
            questions_per_exam: None,
            seed: None,
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            tex_dir: PathBuf::from(DEFAULT_TEX_DIR),
            grading_path: PathBuf::from(DEFAULT_GRADING_FILE),
            compiler: Some(LatexCompiler::default()),
        }
    }
}
