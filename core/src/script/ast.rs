use std::rc::Rc;

use crate::value::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Is,
    IsNot,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Is => "is",
            BinOp::IsNot => "is not",
        }
    }

    /// Dunder method consulted on a native left operand.
    pub fn dunder(self) -> Option<&'static str> {
        match self {
            BinOp::Add => Some("__add__"),
            BinOp::Sub => Some("__sub__"),
            BinOp::Mul => Some("__mul__"),
            BinOp::Div => Some("__truediv__"),
            BinOp::Eq => Some("__eq__"),
            BinOp::Ne => Some("__ne__"),
            BinOp::Is | BinOp::IsNot => None,
        }
    }

    /// In-place variant used by augmented assignment.
    pub fn inplace_dunder(self) -> Option<&'static str> {
        match self {
            BinOp::Add => Some("__iadd__"),
            BinOp::Sub => Some("__isub__"),
            BinOp::Mul => Some("__imul__"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Lit(Val),
    Name(Rc<str>),
    Attr(Box<Expr>, Rc<str>),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(Rc<str>, Expr)>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Neg(Box<Expr>),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub enum Target {
    Name(Rc<str>),
    Attr(Expr, Rc<str>),
}

#[derive(Debug, Clone)]
pub struct Handler {
    /// `None` for a bare `except:`
    pub kind: Option<Rc<str>>,
    pub alias: Option<Rc<str>>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Assign(Target, Expr),
    AugAssign(Target, BinOp, Expr),
    Pass,
    Try { body: Vec<Stmt>, handlers: Vec<Handler> },
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}
