// Lexer for the LaTeX-friendly template syntax
//
// Splits a template source into raw text, `\VAR{...}` output tags and
// statements (`\BLOCK{...}` or `%%` line statements). Comments are dropped
// here so the parser never sees them.

use super::TemplateError;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till1, take_while, take_while1},
    character::complete::{char, line_ending, multispace0, not_line_ending, space0},
    combinator::{not, opt, peek, recognize},
    multi::many0,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};

pub const VAR_START: &str = "\\VAR{";
pub const BLOCK_START: &str = "\\BLOCK{";
pub const COMMENT_START: &str = "\\#{";
pub const TAG_END: char = '}';
pub const LINE_STATEMENT_PREFIX: &str = "%%";
pub const LINE_COMMENT_PREFIX: &str = "%#";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),
    Var(String),
    Block(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Parse and consume whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier
/// Format: [a-zA-Z_][a-zA-Z0-9_]*
pub fn identifier(input: &str) -> IResult<&str, String> {
    let (rest, ident) = recognize(take_while1(|c: char| c.is_alphanumeric() || c == '_'))(input)?;

    if let Some(first) = ident.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Alpha)));
        }
    }

    Ok((rest, ident.to_string()))
}

/// Match a keyword that is not the prefix of a longer identifier
pub fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(
        tag(word),
        not(peek(take_while1(|c: char| c.is_alphanumeric() || c == '_'))),
    )
}

/// Parse a string literal in single or double quotes (no escapes)
pub fn string_literal(input: &str) -> IResult<&str, String> {
    let (input, content) = alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
    ))(input)?;

    Ok((input, content.to_string()))
}

/// Parse an integer literal
pub fn integer_literal(input: &str) -> IResult<&str, i64> {
    nom::character::complete::i64(input)
}

/// `%% stmt` on a line of its own; the trailing newline is consumed
fn line_statement(input: &str) -> IResult<&str, &str> {
    let (input, (_, _, stmt, _)) = tuple((
        space0,
        tag(LINE_STATEMENT_PREFIX),
        not_line_ending,
        opt(line_ending),
    ))(input)?;
    Ok((input, stmt))
}

/// Tag contents up to the closing brace; braces inside quoted strings do not count
fn tag_body(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((recognize(string_literal), is_not("}'\"")))))(input)
}

/// `start ... }` returning the inner text
fn delimited_tag<'a>(start: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(tag(start), terminated(tag_body, char(TAG_END)))
}

/// The newline directly after a tag, if any
fn trailing_newline(input: &str) -> Option<&str> {
    line_ending::<_, nom::error::Error<&str>>(input)
        .ok()
        .map(|(rest, _)| rest)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    preceded(tag(LINE_COMMENT_PREFIX), not_line_ending)(input)
}

/// Plain text up to the next character that may start a tag
fn text_chunk(input: &str) -> IResult<&str, &str> {
    take_till1(|c| c == '\\' || c == '%' || c == '\n')(input)
}

struct Tokens {
    tokens: Vec<Token>,
    text: String,
    text_line: usize,
}

impl Tokens {
    fn push_text(&mut self, s: &str, line: usize) {
        if self.text.is_empty() {
            self.text_line = line;
        }
        self.text.push_str(s);
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(Token {
                kind: TokenKind::Text(std::mem::take(&mut self.text)),
                line: self.text_line,
            });
        }
    }

    fn push(&mut self, kind: TokenKind, line: usize) {
        self.flush();
        self.tokens.push(Token { kind, line });
    }
}

fn newlines(s: &str) -> usize {
    s.matches('\n').count()
}

/// Tokenize a template source.
///
/// `trim_blocks` removes the first newline following a `\BLOCK{...}` or
/// `\#{...}` tag.
pub fn tokenize(name: &str, source: &str, trim_blocks: bool) -> Result<Vec<Token>, TemplateError> {
    let unterminated = |line: usize, what: &str| TemplateError::Unterminated {
        template: name.to_string(),
        line,
        what: what.to_string(),
    };

    let mut out = Tokens {
        tokens: Vec::new(),
        text: String::new(),
        text_line: 1,
    };
    let mut rest = source;
    let mut line = 1;
    let mut at_line_start = true;

    while !rest.is_empty() {
        if at_line_start {
            if let Ok((after, stmt)) = line_statement(rest) {
                out.push(TokenKind::Block(stmt.trim().to_string()), line);
                line += newlines(&rest[..rest.len() - after.len()]);
                rest = after;
                continue;
            }
        }

        if rest.starts_with(VAR_START) {
            let (after, inner) = delimited_tag(VAR_START)(rest).map_err(|_| unterminated(line, VAR_START))?;
            out.push(TokenKind::Var(inner.trim().to_string()), line);
            line += newlines(inner);
            rest = after;
            at_line_start = false;
        } else if rest.starts_with(BLOCK_START) {
            let (mut after, inner) =
                delimited_tag(BLOCK_START)(rest).map_err(|_| unterminated(line, BLOCK_START))?;
            out.push(TokenKind::Block(inner.trim().to_string()), line);
            line += newlines(inner);
            at_line_start = false;
            if let Some(trimmed) = trailing_newline(after).filter(|_| trim_blocks) {
                after = trimmed;
                line += 1;
                at_line_start = true;
            }
            rest = after;
        } else if rest.starts_with(COMMENT_START) {
            let (mut after, inner) =
                delimited_tag(COMMENT_START)(rest).map_err(|_| unterminated(line, COMMENT_START))?;
            line += newlines(inner);
            at_line_start = false;
            if let Some(trimmed) = trailing_newline(after).filter(|_| trim_blocks) {
                after = trimmed;
                line += 1;
                at_line_start = true;
            }
            rest = after;
        } else if let Ok((after, _)) = line_comment(rest) {
            rest = after;
        } else if let Ok((after, chunk)) = text_chunk(rest) {
            out.push_text(chunk, line);
            rest = after;
            at_line_start = false;
        } else {
            // A lone '\', '%' or newline
            let mut chars = rest.chars();
            let c = chars.next().unwrap_or_default();
            let mut buf = [0u8; 4];
            out.push_text(c.encode_utf8(&mut buf), line);
            rest = chars.as_str();
            if c == '\n' {
                line += 1;
                at_line_start = true;
            } else {
                at_line_start = false;
            }
        }
    }

    out.flush();
    Ok(out.tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize("t", source, true)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.to_string())
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("foo"), Ok(("", "foo".to_string())));
        assert_eq!(identifier("_bar.baz"), Ok((".baz", "_bar".to_string())));
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(keyword("not")("not x").is_ok());
        assert!(keyword("not")("notes").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""hello""#), Ok(("", "hello".to_string())));
        assert_eq!(string_literal("'it'"), Ok(("", "it".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", "".to_string())));
        assert!(string_literal(r#""unclosed"#).is_err());
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(integer_literal("42"), Ok(("", 42)));
        assert_eq!(integer_literal("-3"), Ok(("", -3)));
    }

    #[test]
    fn test_plain_latex_is_text() {
        assert_eq!(
            kinds("\\section{Intro}\n\\item 50\\% done"),
            vec![text("\\section{Intro}\n\\item 50\\% done")]
        );
    }

    #[test]
    fn test_var_tag() {
        assert_eq!(
            kinds("Exam \\VAR{ exam_num }."),
            vec![text("Exam "), TokenKind::Var("exam_num".to_string()), text(".")]
        );
    }

    #[test]
    fn test_block_tag_trims_newline() {
        assert_eq!(
            kinds("\\BLOCK{for q in questions}\nx\n\\BLOCK{endfor}\n"),
            vec![
                TokenKind::Block("for q in questions".to_string()),
                text("x\n"),
                TokenKind::Block("endfor".to_string()),
            ]
        );
    }

    #[test]
    fn test_block_tag_keeps_newline_without_trim() {
        let tokens = tokenize("t", "\\BLOCK{if a}\nx\\BLOCK{endif}", false).unwrap();
        assert_eq!(tokens[1].kind, text("\nx"));
    }

    #[test]
    fn test_line_statement() {
        assert_eq!(
            kinds("a\n  %% for x in xs\nb\n%% endfor\nc"),
            vec![
                text("a\n"),
                TokenKind::Block("for x in xs".to_string()),
                text("b\n"),
                TokenKind::Block("endfor".to_string()),
                text("c"),
            ]
        );
    }

    #[test]
    fn test_line_statement_only_at_line_start() {
        assert_eq!(kinds("a %% b"), vec![text("a %% b")]);
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(kinds("a\\#{ note }b"), vec![text("ab")]);
        assert_eq!(kinds("a %# note\nb"), vec![text("a \nb")]);
    }

    #[test]
    fn test_comment_tag_trims_newline() {
        assert_eq!(kinds("a\n\\#{ note }\nb"), vec![text("a\nb")]);
        let tokens = tokenize("t", "a\n\\#{ note }\nb", false).unwrap();
        assert_eq!(tokens[0].kind, text("a\n\nb"));
    }

    #[test]
    fn test_comment_tag_keeps_line_numbers() {
        let tokens = tokenize("t", "\\#{ one\ntwo }\n\\VAR{x}", true).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Var("x".to_string()));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_brace_inside_string_argument() {
        assert_eq!(
            kinds("\\VAR{xs|join('}')}!"),
            vec![TokenKind::Var("xs|join('}')".to_string()), text("!")]
        );
        assert_eq!(
            kinds("\\VAR{x|default(\"\\textbf{n/a}\")}"),
            vec![TokenKind::Var("x|default(\"\\textbf{n/a}\")".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string_in_tag() {
        let err = tokenize("t", "\\VAR{x|join('})", true).unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated { line: 1, .. }));
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("t", "one\ntwo\n\\VAR{x}\n\\BLOCK{if y}\nz", true).unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[3].line, 4);
        assert_eq!(tokens[4].line, 5);
    }

    #[test]
    fn test_unterminated_var() {
        let err = tokenize("t", "line\n\\VAR{oops", true).unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated { line: 2, .. }));
    }

    #[test]
    fn test_unicode_text() {
        assert_eq!(kinds("Prüfung ß ü\n"), vec![text("Prüfung ß ü\n")]);
    }
}
