// Exam and grading key rendering

use crate::question::{Exam, ExamQuestion};
use crate::template::{Template, TemplateError, TemplateLoader};
use serde::Serialize;

pub const GRADING_TEMPLATE: &str = "grading.csv";

/// Cover-page fields shared by every exam variant
#[derive(Debug, Clone, Default)]
pub struct ExamMeta {
    pub title: String,
    pub introtext: String,
    pub date: String,
}

#[derive(Serialize)]
struct ExamContext<'a> {
    questions: &'a [ExamQuestion],
    title: &'a str,
    introtext: &'a str,
    date: &'a str,
    exam_num: usize,
}

#[derive(Serialize)]
struct GradingContext<'a> {
    /// Question lists only, one per exam
    exams: Vec<&'a [ExamQuestion]>,
    exam_list: &'a [Exam],
}

pub fn exam_template_name(language: &str) -> String {
    format!("template_{}.tex", language)
}

/// `exam_001.tex`, `exam_002.tex`, ...
pub fn exam_file_name(number: usize) -> String {
    format!("exam_{:03}.tex", number)
}

pub struct ExamRenderer {
    exam_template: Template,
    grading_template: Template,
}

impl ExamRenderer {
    /// Load `template_<language>.tex` and `grading.csv`
    pub fn new(loader: &TemplateLoader, language: &str) -> Result<Self, TemplateError> {
        Ok(ExamRenderer {
            exam_template: loader.load(&exam_template_name(language))?,
            grading_template: loader.load(GRADING_TEMPLATE)?,
        })
    }

    pub fn from_templates(exam_template: Template, grading_template: Template) -> Self {
        ExamRenderer {
            exam_template,
            grading_template,
        }
    }

    pub fn render_exam(&self, exam: &Exam, meta: &ExamMeta) -> Result<String, TemplateError> {
        let context = serde_json::to_value(ExamContext {
            questions: &exam.questions,
            title: &meta.title,
            introtext: &meta.introtext,
            date: &meta.date,
            exam_num: exam.number,
        })?;
        self.exam_template.render(&context)
    }

    pub fn render_grading(&self, exams: &[Exam]) -> Result<String, TemplateError> {
        let context = serde_json::to_value(GradingContext {
            exams: exams.iter().map(|e| e.questions.as_slice()).collect(),
            exam_list: exams,
        })?;
        self.grading_template.render(&context)
    }
}
