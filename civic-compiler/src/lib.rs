//! CiviC compiler library.
//!
//! Front to back: tokenizer and parser produce an arena AST, two
//! normalization passes separate initializers and loop induction variables,
//! the analyzer binds and type-checks the tree, four desugaring passes
//! remove constructs the machine cannot encode, and the backend emits the
//! textual instruction stream.

pub mod analysis;
pub mod ast;
pub mod backend;
pub mod frontend;
pub mod lower;

use std::fmt;
use thiserror::Error;

/// One accumulated semantic diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error at line {} column {}: {}",
            self.line, self.col, self.message
        )
    }
}

#[derive(Error, Debug)]
pub enum CompileError {
    /// Fatal tokenizer error; aborts immediately, no partial output.
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    /// Fatal grammar violation at the offending token.
    #[error("Parse error at line {line} column {col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    /// Accumulated analyzer diagnostics. The driver prints the whole buffer
    /// and aborts before lowering.
    #[error("{}", .diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))]
    Semantic { diagnostics: Vec<Diagnostic> },
}

/// Compile one CiviC source unit to stack-machine assembly text.
pub fn compile_to_assembly(source: &str) -> Result<String, CompileError> {
    let mut ast = frontend::parse(source)?;
    lower::normalize(&mut ast);
    analysis::analyze(&mut ast)?;
    lower::desugar(&mut ast);
    Ok(backend::generate(&ast))
}

/// Parse, normalize and analyze only; reports the same errors as a full
/// compilation without emitting code.
pub fn check(source: &str) -> Result<(), CompileError> {
    let mut ast = frontend::parse(source)?;
    lower::normalize(&mut ast);
    analysis::analyze(&mut ast)
}
