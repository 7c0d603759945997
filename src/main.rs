use anyhow::Result;
use clap::Parser;
use examgen::compile::LatexCompiler;
use examgen::config::{self, GeneratorConfig};
use examgen::generator;
use examgen::question_reader::ParseError;
use examgen::render::ExamMeta;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "examgen")]
#[command(about = "Generate randomized multiple-choice exams from a question bank", long_about = None)]
struct Args {
    #[arg(help = "Question bank (CSV: Question / Correct Answer / Wrong Answer rows)")]
    questions_file: PathBuf,

    #[arg(short = 'l', long = "lang", default_value = config::DEFAULT_LANGUAGE, help = "Template language (selects template_<lang>.tex)")]
    lang: String,

    #[arg(short = 't', long = "title", default_value = "", help = "Exam title")]
    title: String,

    #[arg(short = 'd', long = "date", default_value = "", help = "Exam date")]
    date: String,

    #[arg(short = 'i', long = "introtext", default_value = "", help = "Introductory text")]
    introtext: String,

    #[arg(short = 'n', long = "count", default_value = "1", help = "Number of exams to generate")]
    count: usize,

    #[arg(
        short = 'm',
        long = "questions",
        allow_negative_numbers = true,
        help = "Number of questions per exam (values below 1 mean all)"
    )]
    questions: Option<i64>,

    #[arg(long = "seed", help = "Random seed")]
    seed: Option<u64>,

    #[arg(long = "templates", default_value = config::DEFAULT_TEMPLATE_DIR, help = "Template directory")]
    template_dir: PathBuf,

    #[arg(long = "tex-dir", default_value = config::DEFAULT_TEX_DIR, help = "Output directory for .tex files")]
    tex_dir: PathBuf,

    #[arg(long = "pdf-dir", default_value = config::DEFAULT_PDF_DIR, help = "Output directory for compiled PDFs")]
    pdf_dir: PathBuf,

    #[arg(long = "grading", default_value = config::DEFAULT_GRADING_FILE, help = "Grading key output path")]
    grading: PathBuf,

    #[arg(long = "latex", default_value = config::DEFAULT_LATEX, help = "LaTeX compiler to invoke")]
    latex: String,

    #[arg(long = "passes", default_value_t = config::DEFAULT_PASSES, help = "Compiler runs per exam")]
    passes: u32,

    #[arg(long = "no-compile", help = "Only write .tex files, skip typesetting")]
    no_compile: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help = "More log output (-v debug, -vv trace)")]
    verbose: u8,

    #[arg(short = 'q', long = "quiet", help = "Only log warnings and errors")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            _ => "trace",
        }
    }

    fn questions_per_exam(&self) -> Option<usize> {
        self.questions
            .filter(|&m| m >= 1)
            .and_then(|m| usize::try_from(m).ok())
    }

    fn into_config(self) -> GeneratorConfig {
        let questions_per_exam = self.questions_per_exam();
        let compiler = (!self.no_compile).then(|| LatexCompiler {
            program: self.latex,
            passes: self.passes,
            output_dir: self.pdf_dir,
        });

        GeneratorConfig {
            questions_file: self.questions_file,
            language: self.lang,
            meta: ExamMeta {
                title: self.title,
                introtext: self.introtext,
                date: self.date,
            },
            count: self.count,
            questions_per_exam,
            seed: self.seed,
            template_dir: self.template_dir,
            tex_dir: self.tex_dir,
            grading_path: self.grading,
            compiler,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level());

    let config = args.into_config();
    match generator::run(&config) {
        Ok(summary) => {
            tracing::info!(
                exams = summary.tex_files.len(),
                questions = summary.questions_per_exam,
                grading = %summary.grading_path.display(),
                "done"
            );
            Ok(())
        }
        Err(err) => {
            match err.downcast_ref::<ParseError>() {
                Some(ParseError::Io { .. }) | None => {}
                Some(parse) => {
                    eprintln!("PARSE ERROR: {}", parse);
                    process::exit(1);
                }
            }
            Err(err)
        }
    }
}
