// Template engine with LaTeX-friendly delimiters
//
//   \VAR{expr}      output
//   \BLOCK{stmt}    for / if statements
//   \#{ ... }       comment
//   %% stmt         line statement
//   %# ...          line comment

pub mod ast;
pub mod eval;
pub mod filters;
pub mod lexer;
pub mod loader;
pub mod parser;

pub use loader::TemplateLoader;

use ast::Node;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("{template}:{line}: syntax error: {message}")]
    Syntax {
        template: String,
        line: usize,
        message: String,
    },

    #[error("{template}:{line}: unterminated '{what}'")]
    Unterminated {
        template: String,
        line: usize,
        what: String,
    },

    #[error("{template}:{line}: {message}")]
    Render {
        template: String,
        line: usize,
        message: String,
    },

    #[error("template '{name}' not found in {dir}")]
    NotFound { name: String, dir: String },

    #[error("failed to build template context: {0}")]
    Context(#[from] serde_json::Error),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// A parsed template, ready to render any number of times
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse with `trim_blocks` enabled
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let tokens = lexer::tokenize(name, source, true)?;
        let nodes = parser::parse_template(name, tokens)?;
        Ok(Template {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, context: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        eval::Evaluator::new(&self.name, context).render(&self.nodes, &mut out)?;
        Ok(out)
    }
}
