// Question bank data model

use serde::Serialize;

/// A single answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    pub correct: bool,
}

impl Answer {
    pub fn correct(text: impl Into<String>) -> Self {
        Answer {
            text: text.into(),
            correct: true,
        }
    }

    pub fn wrong(text: impl Into<String>) -> Self {
        Answer {
            text: text.into(),
            correct: false,
        }
    }
}

/// A question as read from the bank, answers in file order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub correct: Vec<Answer>,
    pub wrong: Vec<Answer>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Question {
            text: text.into(),
            correct: Vec::new(),
            wrong: Vec::new(),
        }
    }

    /// Correct answers followed by wrong answers
    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.correct.iter().chain(self.wrong.iter())
    }

    pub fn answer_count(&self) -> usize {
        self.correct.len() + self.wrong.len()
    }
}

/// A question placed in an exam variant.
///
/// `idx`, `correct_index` and `correct_indices` are 1-based positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamQuestion {
    pub idx: usize,
    #[serde(rename = "question")]
    pub text: String,
    pub answers: Vec<Answer>,
    /// Last correct position when there are several
    pub correct_index: Option<usize>,
    pub correct_indices: Vec<usize>,
}

/// One shuffled exam variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exam {
    pub number: usize,
    pub questions: Vec<ExamQuestion>,
}
