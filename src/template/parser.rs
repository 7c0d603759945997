// Template grammar: expressions, statements and the node tree

use super::ast::{BinOp, Expr, Node, PathSegment};
use super::lexer::{identifier, integer_literal, keyword, string_literal, ws, Token, TokenKind};
use super::TemplateError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, u64 as unsigned},
    combinator::{all_consuming, map, opt, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use serde_json::Value;

/// Parse an expression
/// Format: or_expr with `not`, comparisons, filters and dotted paths
pub fn parse_expr(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

fn fold_binary(first: Expr, rest: Vec<Expr>, op: BinOp) -> Expr {
    rest.into_iter().fold(first, |lhs, rhs| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(keyword("or")), and_expr))(input)?;
    Ok((input, fold_binary(first, rest, BinOp::Or)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(ws(keyword("and")), not_expr))(input)?;
    Ok((input, fold_binary(first, rest, BinOp::And)))
}

fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(keyword("not")), not_expr), |e| Expr::Not(Box::new(e))),
        comparison,
    ))(input)
}

fn comparison_op(input: &str) -> IResult<&str, BinOp> {
    alt((
        value(BinOp::Eq, tag("==")),
        value(BinOp::Ne, tag("!=")),
        value(BinOp::Le, tag("<=")),
        value(BinOp::Ge, tag(">=")),
        value(BinOp::Lt, tag("<")),
        value(BinOp::Gt, tag(">")),
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, lhs) = filtered(input)?;
    let (input, rhs) = opt(pair(ws(comparison_op), filtered))(input)?;
    let expr = match rhs {
        Some((op, rhs)) => Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        None => lhs,
    };
    Ok((input, expr))
}

/// `name` or `name(arg, ...)` after a pipe
fn filter_call(input: &str) -> IResult<&str, (String, Vec<Expr>)> {
    let (input, name) = ws(identifier)(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), parse_expr),
        ws(char(')')),
    ))(input)?;
    Ok((input, (name, args.unwrap_or_default())))
}

fn filtered(input: &str) -> IResult<&str, Expr> {
    let (input, base) = primary(input)?;
    let (input, filters) = many0(preceded(ws(char('|')), filter_call))(input)?;
    let expr = filters.into_iter().fold(base, |expr, (name, args)| Expr::Filter {
        expr: Box::new(expr),
        name,
        args,
    });
    Ok((input, expr))
}

fn constant(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), alt((keyword("true"), keyword("True")))),
        value(Value::Bool(false), alt((keyword("false"), keyword("False")))),
        value(Value::Null, alt((keyword("none"), keyword("None")))),
    ))(input)
}

fn path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    let (input, head) = identifier(input)?;
    let (input, tail) = many0(alt((
        map(preceded(char('.'), identifier), PathSegment::Key),
        map(delimited(char('['), ws(unsigned), char(']')), |i| {
            PathSegment::Index(i as usize)
        }),
    )))(input)?;

    let mut segments = vec![PathSegment::Key(head)];
    segments.extend(tail);
    Ok((input, segments))
}

fn primary(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        delimited(char('('), parse_expr, char(')')),
        map(string_literal, |s| Expr::Literal(Value::String(s))),
        map(integer_literal, |n| Expr::Literal(Value::from(n))),
        map(constant, Expr::Literal),
        map(path, Expr::Path),
    )))(input)
}

/// Control statements found in `\BLOCK{...}` tags and `%%` lines
#[derive(Debug, Clone, PartialEq)]
enum Stmt {
    For { var: String, iter: Expr },
    EndFor,
    If(Expr),
    Elif(Expr),
    Else,
    EndIf,
}

impl Stmt {
    fn keyword(&self) -> &'static str {
        match self {
            Stmt::For { .. } => "for",
            Stmt::EndFor => "endfor",
            Stmt::If(_) => "if",
            Stmt::Elif(_) => "elif",
            Stmt::Else => "else",
            Stmt::EndIf => "endif",
        }
    }
}

fn parse_stmt(input: &str) -> IResult<&str, Stmt> {
    all_consuming(ws(alt((
        map(
            tuple((keyword("for"), ws(identifier), keyword("in"), parse_expr)),
            |(_, var, _, iter)| Stmt::For { var, iter },
        ),
        value(Stmt::EndFor, keyword("endfor")),
        map(preceded(keyword("if"), parse_expr), Stmt::If),
        map(preceded(keyword("elif"), parse_expr), Stmt::Elif),
        value(Stmt::Else, keyword("else")),
        value(Stmt::EndIf, keyword("endif")),
    ))))(input)
}

/// Build the node tree for a tokenized template
pub fn parse_template(name: &str, tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut builder = TreeBuilder {
        name,
        tokens: tokens.into_iter(),
    };
    let (nodes, end) = builder.parse_body()?;
    match end {
        None => Ok(nodes),
        Some((stmt, line)) => Err(builder.unexpected(&stmt, line)),
    }
}

struct TreeBuilder<'a> {
    name: &'a str,
    tokens: std::vec::IntoIter<Token>,
}

type Body = (Vec<Node>, Option<(Stmt, usize)>);

impl TreeBuilder<'_> {
    fn syntax(&self, line: usize, message: String) -> TemplateError {
        TemplateError::Syntax {
            template: self.name.to_string(),
            line,
            message,
        }
    }

    fn unexpected(&self, stmt: &Stmt, line: usize) -> TemplateError {
        self.syntax(line, format!("unexpected '{}'", stmt.keyword()))
    }

    fn unclosed(&self, what: &str, line: usize) -> TemplateError {
        TemplateError::Unterminated {
            template: self.name.to_string(),
            line,
            what: what.to_string(),
        }
    }

    fn expr(&self, src: &str, line: usize) -> Result<Expr, TemplateError> {
        all_consuming(ws(parse_expr))(src)
            .map(|(_, e)| e)
            .map_err(|_| self.syntax(line, format!("invalid expression '{}'", src)))
    }

    fn stmt(&self, src: &str, line: usize) -> Result<Stmt, TemplateError> {
        parse_stmt(src)
            .map(|(_, s)| s)
            .map_err(|_| self.syntax(line, format!("invalid statement '{}'", src)))
    }

    /// Collect nodes until a closing statement or end of input
    fn parse_body(&mut self) -> Result<Body, TemplateError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.tokens.next() {
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::Var(src) => nodes.push(Node::Output {
                    expr: self.expr(&src, token.line)?,
                    line: token.line,
                }),
                TokenKind::Block(src) => match self.stmt(&src, token.line)? {
                    Stmt::For { var, iter } => nodes.push(self.parse_for(var, iter, token.line)?),
                    Stmt::If(cond) => nodes.push(self.parse_if(cond, token.line)?),
                    closing => return Ok((nodes, Some((closing, token.line)))),
                },
            }
        }
        Ok((nodes, None))
    }

    fn parse_for(&mut self, var: String, iter: Expr, line: usize) -> Result<Node, TemplateError> {
        let (body, end) = self.parse_body()?;
        let else_body = match end {
            Some((Stmt::EndFor, _)) => Vec::new(),
            Some((Stmt::Else, _)) => {
                let (else_body, end) = self.parse_body()?;
                match end {
                    Some((Stmt::EndFor, _)) => else_body,
                    Some((other, l)) => return Err(self.unexpected(&other, l)),
                    None => return Err(self.unclosed("for", line)),
                }
            }
            Some((other, l)) => return Err(self.unexpected(&other, l)),
            None => return Err(self.unclosed("for", line)),
        };

        Ok(Node::For {
            var,
            iter,
            body,
            else_body,
            line,
        })
    }

    fn parse_if(&mut self, cond: Expr, line: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut cond = cond;
        loop {
            let (body, end) = self.parse_body()?;
            branches.push((cond, body));
            match end {
                Some((Stmt::Elif(next), _)) => cond = next,
                Some((Stmt::Else, _)) => {
                    let (else_body, end) = self.parse_body()?;
                    return match end {
                        Some((Stmt::EndIf, _)) => Ok(Node::If {
                            branches,
                            else_body,
                            line,
                        }),
                        Some((other, l)) => Err(self.unexpected(&other, l)),
                        None => Err(self.unclosed("if", line)),
                    };
                }
                Some((Stmt::EndIf, _)) => {
                    return Ok(Node::If {
                        branches,
                        else_body: Vec::new(),
                        line,
                    })
                }
                Some((other, l)) => return Err(self.unexpected(&other, l)),
                None => return Err(self.unclosed("if", line)),
            }
        }
    }
}
