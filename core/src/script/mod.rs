//! Front end of the embedded scripting language: lexer, parser and a
//! tree-walking evaluator over [`crate::runtime::Vm`].

pub mod ast;
mod eval;
pub mod lexer;
pub mod parser;

#[cfg(test)]
mod parser_test;

pub use eval::Interpreter;

use crate::runtime::VmResult;
use ast::{Expr, Stmt};
use lexer::Tokenizer;
use parser::Parser;

pub fn parse_program(source: &str) -> VmResult<Vec<Stmt>> {
    let tokens = Tokenizer::tokenize(source)?;
    Parser::new(&tokens).parse_program()
}

pub fn parse_expression(source: &str) -> VmResult<Expr> {
    let tokens = Tokenizer::tokenize_fragment(source)?;
    Parser::new(&tokens).parse_expression()
}
