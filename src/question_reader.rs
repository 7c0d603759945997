// Question bank reader

use crate::question::{Answer, Question};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const TAG_QUESTION: &str = "Question";
const TAG_CORRECT: &str = "Correct Answer";
const TAG_WRONG: &str = "Wrong Answer";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line {line} of file \"{source_name}\" seems problematic (\"{row}\")")]
    UnexpectedRow {
        line: u64,
        source_name: String,
        row: String,
    },

    #[error("Line {line} of file \"{source_name}\" has no text (\"{row}\")")]
    MissingText {
        line: u64,
        source_name: String,
        row: String,
    },

    #[error("Failed to read record from \"{source_name}\": {err}")]
    Csv {
        source_name: String,
        #[source]
        err: csv::Error,
    },

    #[error("Failed to open \"{path}\": {err}")]
    Io {
        path: String,
        #[source]
        err: std::io::Error,
    },
}

/// Row kinds recognized in the first cell of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Question,
    CorrectAnswer,
    WrongAnswer,
}

impl RowKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_QUESTION => Some(RowKind::Question),
            TAG_CORRECT => Some(RowKind::CorrectAnswer),
            TAG_WRONG => Some(RowKind::WrongAnswer),
            _ => None,
        }
    }
}

/// Read a question bank from a file on disk
pub fn read_questions_from_path(path: &Path) -> Result<Vec<Question>, ParseError> {
    let file = File::open(path).map_err(|err| ParseError::Io {
        path: path.display().to_string(),
        err,
    })?;
    read_questions(file, &path.display().to_string())
}

/// Read a question bank from any reader.
///
/// `source_name` is only used in error messages.
pub fn read_questions<R: Read>(input: R, source_name: &str) -> Result<Vec<Question>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut questions = Vec::new();
    let mut current: Option<Question> = None;

    for result in reader.records() {
        let record = result.map_err(|err| ParseError::Csv {
            source_name: source_name.to_string(),
            err,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let tag = match record.get(0) {
            Some(tag) if !tag.is_empty() => tag,
            // Blank row
            _ => continue,
        };

        let Some(kind) = RowKind::from_tag(tag) else {
            return Err(unexpected_row(line, source_name, &record));
        };

        let text = record.get(1).ok_or_else(|| ParseError::MissingText {
            line,
            source_name: source_name.to_string(),
            row: format_row(&record),
        })?;

        match kind {
            RowKind::Question => {
                if let Some(q) = current.take() {
                    questions.push(q);
                }
                current = Some(Question::new(text));
            }
            RowKind::CorrectAnswer => match current.as_mut() {
                Some(q) => q.correct.push(Answer::correct(text)),
                None => return Err(unexpected_row(line, source_name, &record)),
            },
            RowKind::WrongAnswer => match current.as_mut() {
                Some(q) => q.wrong.push(Answer::wrong(text)),
                None => return Err(unexpected_row(line, source_name, &record)),
            },
        }
    }

    if let Some(q) = current {
        questions.push(q);
    }

    tracing::debug!(count = questions.len(), source = source_name, "read question bank");
    Ok(questions)
}

fn unexpected_row(line: u64, source_name: &str, record: &StringRecord) -> ParseError {
    ParseError::UnexpectedRow {
        line,
        source_name: source_name.to_string(),
        row: format_row(record),
    }
}

fn format_row(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(content: &str) -> Result<Vec<Question>, ParseError> {
        read_questions(Cursor::new(content), "bank.csv")
    }

    #[test]
    fn test_read_single_question() {
        let bank = parse("Question,What is 2+2?\nCorrect Answer,4\nWrong Answer,3\nWrong Answer,5\n").unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].text, "What is 2+2?");
        assert_eq!(bank[0].correct, vec![Answer::correct("4")]);
        assert_eq!(bank[0].wrong, vec![Answer::wrong("3"), Answer::wrong("5")]);
    }

    #[test]
    fn test_read_multiple_questions_in_order() {
        let bank = parse(
            "Question,First\nCorrect Answer,a\n\nQuestion,Second\nWrong Answer,b\nCorrect Answer,c\nQuestion,Third\n",
        )
        .unwrap();
        let texts: Vec<&str> = bank.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);
        assert_eq!(bank[1].correct, vec![Answer::correct("c")]);
        assert_eq!(bank[1].wrong, vec![Answer::wrong("b")]);
        // A question without answers is still kept
        assert_eq!(bank[2].answer_count(), 0);
    }

    #[test]
    fn test_read_quoted_cells() {
        let bank = parse("Question,\"Which of a, b, c?\"\nCorrect Answer,\"say \"\"b\"\"\"\n").unwrap();
        assert_eq!(bank[0].text, "Which of a, b, c?");
        assert_eq!(bank[0].correct[0].text, "say \"b\"");
    }

    #[test]
    fn test_read_skips_rows_with_empty_first_cell() {
        let bank = parse("Question,Q\n,ignored note\nCorrect Answer,yes\n,,\n").unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].answer_count(), 1);
    }

    #[test]
    fn test_read_ignores_extra_cells() {
        let bank = parse("Question,Q,extra,cells\nCorrect Answer,yes,1\n").unwrap();
        assert_eq!(bank[0].text, "Q");
        assert_eq!(bank[0].correct[0].text, "yes");
    }

    #[test]
    fn test_read_multiline_quoted_question() {
        let bank = parse("Question,\"line one\nline two\"\nCorrect Answer,x\n").unwrap();
        assert_eq!(bank[0].text, "line one\nline two");
    }

    #[test]
    fn test_read_empty_input() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_answer_before_question_is_error() {
        let err = parse("Correct Answer,orphan\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRow { line: 1, .. }));
        assert!(err.to_string().contains("Line 1 of file \"bank.csv\""));
    }

    #[test]
    fn test_wrong_answer_before_question_is_error() {
        let err = parse("\nWrong Answer,orphan\n").unwrap_err();
        match err {
            ParseError::UnexpectedRow { row, .. } => {
                assert_eq!(row, "Wrong Answer, orphan");
            }
            other => panic!("Expected UnexpectedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_reports_line() {
        let err = parse("Question,Q\nCorrect Answer,a\nHint,nope\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRow { line: 3, .. }));
        assert!(err.to_string().contains("seems problematic"));
        assert!(err.to_string().contains("Hint, nope"));
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(parse("question,lowercase\n").is_err());
    }

    #[test]
    fn test_missing_text_is_error() {
        let err = parse("Question\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingText { line: 1, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_questions_from_path(Path::new("/nonexistent/bank.csv")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
