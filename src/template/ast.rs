// Abstract Syntax Tree for templates

use serde_json::Value;

/// One step of a dotted path: `q.answers[0].answer`
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Variable lookup; the first segment is always a `Key`
    Path(Vec<PathSegment>),
    Not(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Filter {
        expr: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn var(name: &str) -> Self {
        Expr::Path(vec![PathSegment::Key(name.to_string())])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Output {
        expr: Expr,
        line: usize,
    },
    For {
        var: String,
        iter: Expr,
        body: Vec<Node>,
        /// Rendered when the sequence is empty
        else_body: Vec<Node>,
        line: usize,
    },
    If {
        branches: Vec<(Expr, Vec<Node>)>,
        else_body: Vec<Node>,
        line: usize,
    },
}
