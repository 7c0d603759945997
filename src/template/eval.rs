// Template evaluation against a serde_json context

use super::ast::{BinOp, Expr, Node, PathSegment};
use super::filters;
use super::TemplateError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Text form of a value as written into the output
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Walks a node tree, keeping a stack of variable scopes
pub struct Evaluator<'a> {
    template: &'a str,
    scopes: Vec<Map<String, Value>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(template: &'a str, context: &Value) -> Self {
        let root = match context {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        Evaluator {
            template,
            scopes: vec![root],
        }
    }

    fn error(&self, line: usize, message: String) -> TemplateError {
        TemplateError::Render {
            template: self.template.to_string(),
            line,
            message,
        }
    }

    fn lookup(&self, name: &str) -> Value {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn render(&mut self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, line } => {
                    let value = self.eval(expr, *line)?;
                    out.push_str(&display(&value));
                }
                Node::For {
                    var,
                    iter,
                    body,
                    else_body,
                    line,
                } => {
                    let items = self.iterate(self.eval(iter, *line)?, *line)?;
                    if items.is_empty() {
                        self.render(else_body, out)?;
                        continue;
                    }
                    let length = items.len();
                    for (i, item) in items.into_iter().enumerate() {
                        let mut scope = Map::new();
                        scope.insert(var.clone(), item);
                        scope.insert("loop".to_string(), loop_info(i, length));
                        self.scopes.push(scope);
                        let result = self.render(body, out);
                        self.scopes.pop();
                        result?;
                    }
                }
                Node::If {
                    branches,
                    else_body,
                    line,
                } => {
                    let mut taken = false;
                    for (cond, body) in branches {
                        if is_truthy(&self.eval(cond, *line)?) {
                            self.render(body, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.render(else_body, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn iterate(&self, value: Value, line: usize) -> Result<Vec<Value>, TemplateError> {
        match value {
            Value::Array(items) => Ok(items),
            Value::Object(map) => Ok(map.into_iter().map(|(k, _)| Value::String(k)).collect()),
            Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(self.error(line, format!("cannot iterate over {}", other))),
        }
    }

    pub fn eval(&self, expr: &Expr, line: usize) -> Result<Value, TemplateError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path(segments) => Ok(self.resolve(segments)),
            Expr::Not(inner) => Ok(Value::Bool(!is_truthy(&self.eval(inner, line)?))),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, line),
            Expr::Filter { expr, name, args } => {
                let value = self.eval(expr, line)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a, line))
                    .collect::<Result<Vec<_>, _>>()?;
                filters::apply(name, value, &args).map_err(|msg| self.error(line, msg))
            }
        }
    }

    /// Undefined names and missing keys resolve to null
    fn resolve(&self, segments: &[PathSegment]) -> Value {
        let mut iter = segments.iter();
        let mut current = match iter.next() {
            Some(PathSegment::Key(name)) => self.lookup(name),
            _ => return Value::Null,
        };
        for segment in iter {
            current = match (segment, &current) {
                (PathSegment::Key(k), Value::Object(map)) => map.get(k).cloned().unwrap_or(Value::Null),
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        current
    }

    fn binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr, line: usize) -> Result<Value, TemplateError> {
        let left = self.eval(lhs, line)?;
        match op {
            BinOp::And => {
                if !is_truthy(&left) {
                    return Ok(left);
                }
                self.eval(rhs, line)
            }
            BinOp::Or => {
                if is_truthy(&left) {
                    return Ok(left);
                }
                self.eval(rhs, line)
            }
            BinOp::Eq => Ok(Value::Bool(values_equal(&left, &self.eval(rhs, line)?))),
            BinOp::Ne => Ok(Value::Bool(!values_equal(&left, &self.eval(rhs, line)?))),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let right = self.eval(rhs, line)?;
                let ordering = compare(&left, &right).ok_or_else(|| {
                    self.error(line, format!("cannot compare {} with {}", left, right))
                })?;
                let result = match op {
                    BinOp::Lt => ordering == Ordering::Less,
                    BinOp::Gt => ordering == Ordering::Greater,
                    BinOp::Le => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
        }
    }
}

fn loop_info(index0: usize, length: usize) -> Value {
    serde_json::json!({
        "index": index0 + 1,
        "index0": index0,
        "revindex": length - index0,
        "first": index0 == 0,
        "last": index0 + 1 == length,
        "length": length,
    })
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
