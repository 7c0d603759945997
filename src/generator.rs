// Pipeline driver: read bank -> shuffle -> render -> typeset -> grading key

use crate::config::GeneratorConfig;
use crate::question::Exam;
use crate::question_reader;
use crate::render::{self, ExamRenderer};
use crate::shuffle::{self, ExamShuffler};
use crate::template::TemplateLoader;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What a run produced
#[derive(Debug, Clone)]
pub struct Summary {
    pub exams: Vec<Exam>,
    pub tex_files: Vec<PathBuf>,
    pub grading_path: PathBuf,
    pub questions_per_exam: usize,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Run the whole pipeline for `config`.
///
/// A malformed question bank surfaces as a
/// [`ParseError`](crate::question_reader::ParseError) inside the returned error.
pub fn run(config: &GeneratorConfig) -> Result<Summary> {
    let bank = question_reader::read_questions_from_path(&config.questions_file)?;
    tracing::info!(
        questions = bank.len(),
        file = %config.questions_file.display(),
        "loaded question bank"
    );

    let per_exam = shuffle::questions_per_exam(config.questions_per_exam, bank.len());
    if config.questions_per_exam.is_some_and(|m| m != per_exam) {
        tracing::warn!(
            "requested {:?} questions per exam, using {} (bank size)",
            config.questions_per_exam,
            per_exam
        );
    }

    let loader = TemplateLoader::new(&config.template_dir);
    let renderer = ExamRenderer::new(&loader, &config.language).context("Failed to load templates")?;

    ensure_dir(&config.tex_dir)?;
    if let Some(compiler) = &config.compiler {
        ensure_dir(&compiler.output_dir)?;
    }

    let mut shuffler = ExamShuffler::new(config.seed);
    let mut exams = Vec::with_capacity(config.count);
    let mut tex_files = Vec::with_capacity(config.count);

    for number in 1..=config.count {
        let exam = shuffler.generate(number, &bank, per_exam);

        let tex = renderer
            .render_exam(&exam, &config.meta)
            .with_context(|| format!("Failed to render exam {}", number))?;
        let tex_path = config.tex_dir.join(render::exam_file_name(number));
        fs::write(&tex_path, tex).with_context(|| format!("Failed to write {}", tex_path.display()))?;
        tracing::info!(exam = number, path = %tex_path.display(), "wrote exam");

        if let Some(compiler) = &config.compiler {
            compiler.compile(&tex_path)?;
        }

        tex_files.push(tex_path);
        exams.push(exam);
    }

    let grading = renderer
        .render_grading(&exams)
        .context("Failed to render grading key")?;
    fs::write(&config.grading_path, grading)
        .with_context(|| format!("Failed to write {}", config.grading_path.display()))?;
    tracing::info!(path = %config.grading_path.display(), "wrote grading key");

    Ok(Summary {
        exams,
        tex_files,
        grading_path: config.grading_path.clone(),
        questions_per_exam: per_exam,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_reader::ParseError;
    use tempfile::TempDir;

    const BANK: &str = "\
Question,What is 2+2?
Correct Answer,4
Wrong Answer,3
Wrong Answer,5

Question,Capital of France?
Correct Answer,Paris
Wrong Answer,Lyon
Wrong Answer,Nice

Question,Which are primes?
Correct Answer,2
Correct Answer,3
Wrong Answer,4
";

    fn setup(bank: &str) -> (TempDir, GeneratorConfig) {
        let dir = TempDir::with_prefix("examgen-run").unwrap();
        let bank_path = dir.path().join("bank.csv");
        fs::write(&bank_path, bank).unwrap();
        let config = GeneratorConfig {
            questions_file: bank_path,
            seed: Some(11),
            template_dir: dir.path().join("templates"),
            tex_dir: dir.path().join("latex"),
            grading_path: dir.path().join("grading.csv"),
            compiler: None,
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn test_run_writes_exams_and_grading() {
        let (_dir, config) = setup(BANK);
        let config = GeneratorConfig { count: 3, ..config };
        let summary = run(&config).unwrap();

        assert_eq!(summary.exams.len(), 3);
        assert_eq!(summary.questions_per_exam, 3);
        assert_eq!(
            summary.tex_files,
            vec![
                config.tex_dir.join("exam_001.tex"),
                config.tex_dir.join("exam_002.tex"),
                config.tex_dir.join("exam_003.tex"),
            ]
        );
        for path in &summary.tex_files {
            let tex = fs::read_to_string(path).unwrap();
            assert!(tex.contains("Capital of France?"));
        }

        let grading = fs::read_to_string(&config.grading_path).unwrap();
        let lines: Vec<&str> = grading.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Exam,Q1,Q2,Q3");
        assert!(lines[1].starts_with("1,"));
        assert!(lines[3].starts_with("3,"));
    }

    #[test]
    fn test_run_limits_questions() {
        let (_dir, config) = setup(BANK);
        let config = GeneratorConfig {
            questions_per_exam: Some(2),
            ..config
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.questions_per_exam, 2);
        assert_eq!(summary.exams[0].questions.len(), 2);
    }

    #[test]
    fn test_run_out_of_range_limit_uses_all() {
        let (_dir, config) = setup(BANK);
        let config = GeneratorConfig {
            questions_per_exam: Some(50),
            ..config
        };
        assert_eq!(run(&config).unwrap().questions_per_exam, 3);
    }

    #[test]
    fn test_run_is_reproducible_with_seed() {
        let (_dir, config) = setup(BANK);
        let config = GeneratorConfig { count: 2, ..config };
        let first = run(&config).unwrap();
        let first_grading = fs::read_to_string(&config.grading_path).unwrap();
        let second = run(&config).unwrap();
        let second_grading = fs::read_to_string(&config.grading_path).unwrap();

        assert_eq!(first.exams, second.exams);
        assert_eq!(first_grading, second_grading);
    }

    #[test]
    fn test_run_uses_template_dir() {
        let (dir, config) = setup(BANK);
        let tpl_dir = dir.path().join("templates");
        fs::create_dir_all(&tpl_dir).unwrap();
        fs::write(tpl_dir.join("template_fr.tex"), "Examen \\VAR{exam_num}: \\VAR{questions|length}\n").unwrap();

        let config = GeneratorConfig {
            language: "fr".to_string(),
            ..config
        };
        let summary = run(&config).unwrap();
        let tex = fs::read_to_string(&summary.tex_files[0]).unwrap();
        assert_eq!(tex, "Examen 1: 3\n");
    }

    #[test]
    fn test_run_parse_error_is_downcastable() {
        let (_dir, config) = setup("Question,Q\nCorrect Answer,a\nBogus,row\n");
        let err = run(&config).unwrap_err();
        let parse = err.downcast_ref::<ParseError>().expect("parse error");
        assert!(matches!(parse, ParseError::UnexpectedRow { line: 3, .. }));
        assert!(!config.tex_dir.exists());
    }

    #[test]
    fn test_run_unknown_language_fails() {
        let (_dir, config) = setup(BANK);
        let config = GeneratorConfig {
            language: "xx".to_string(),
            ..config
        };
        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to load templates"));
    }

    #[test]
    fn test_run_empty_bank() {
        let (_dir, config) = setup("");
        let summary = run(&config).unwrap();
        assert_eq!(summary.questions_per_exam, 0);
        assert!(summary.exams[0].questions.is_empty());
        let grading = fs::read_to_string(&config.grading_path).unwrap();
        assert_eq!(grading, "Exam\n1\n");
    }
}
