// Template lookup: a directory on disk first, then the bundled defaults

use super::{Template, TemplateError};
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("template_en.tex", include_str!("../../templates/template_en.tex")),
    ("template_de.tex", include_str!("../../templates/template_de.tex")),
    ("grading.csv", include_str!("../../templates/grading.csv")),
];

pub fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, src)| *src)
}

#[derive(Debug, Clone)]
pub struct TemplateLoader {
    dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TemplateLoader { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and parse `name`
    pub fn load(&self, name: &str) -> Result<Template, TemplateError> {
        let path = self.dir.join(name);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading template");
            let source = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.display().to_string(),
                source,
            })?;
            return Template::parse(name, &source);
        }

        match builtin(name) {
            Some(source) => {
                tracing::debug!(name, dir = %self.dir.display(), "using bundled template");
                Template::parse(name, source)
            }
            None => Err(TemplateError::NotFound {
                name: name.to_string(),
                dir: self.dir.display().to_string(),
            }),
        }
    }
}
