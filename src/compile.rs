// External typesetting step

use crate::config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs a LaTeX compiler over generated `.tex` files.
///
/// The compiler is treated as a black box: only spawning it can fail the run.
/// A non-zero exit status is logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    pub program: String,
    /// Number of runs per file (cross references need two)
    pub passes: u32,
    pub output_dir: PathBuf,
}

impl Default for LatexCompiler {
    fn default() -> Self {
        LatexCompiler {
            program: config::DEFAULT_LATEX.to_string(),
            passes: config::DEFAULT_PASSES,
            output_dir: PathBuf::from(config::DEFAULT_PDF_DIR),
        }
    }
}

/// Outcome of compiling one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub passes_run: u32,
    pub failed_passes: u32,
}

impl LatexCompiler {
    pub fn command(&self, tex_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-output-directory").arg(&self.output_dir).arg(tex_path);
        cmd
    }

    pub fn compile(&self, tex_path: &Path) -> Result<CompileReport> {
        let mut report = CompileReport {
            passes_run: 0,
            failed_passes: 0,
        };

        for pass in 1..=self.passes {
            let output = self
                .command(tex_path)
                .output()
                .with_context(|| format!("Failed to run '{}' on {}", self.program, tex_path.display()))?;
            report.passes_run += 1;

            tracing::debug!(
                pass,
                file = %tex_path.display(),
                stdout = %String::from_utf8_lossy(&output.stdout),
                "compiler output"
            );

            if !output.status.success() {
                report.failed_passes += 1;
                tracing::warn!(
                    "{} exited with {} on {} (pass {})",
                    self.program,
                    output.status,
                    tex_path.display(),
                    pass
                );
            }
        }

        Ok(report)
    }
}
