//! Tokenizer and parser producing the arena AST.

pub mod lexer;
pub mod parser;

use crate::ast::Ast;
use crate::CompileError;

/// Tokenize and parse a whole compilation unit.
pub fn parse(source: &str) -> Result<Ast, CompileError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).program()
}
