//! Comet-to-C transpiler
//!
//! Comet is a small statically-typed imperative language. This crate
//! turns one Comet source file into one C translation unit with
//! equivalent observable semantics.
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → Context builder → C emitter
//! ```
//!
//! The stages run strictly in sequence; each returns at most one error
//! carrying the nearest source trace. The context builder enriches the
//! AST in place (scope handles, back-filled types, synthesized
//! deallocation nodes); the emitter then lowers it without re-analysing.
//!
//! # Example
//!
//! ```
//! let source = "fn main() -> int { }\n";
//! let output = comet::transpile(source).unwrap();
//! assert!(output.c_source.contains("int32_t main()"));
//! ```

pub mod ast;
pub mod codegen;
pub mod common;
pub mod context;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

pub use ast::Ast;
pub use context::ScopeTree;
pub use diagnostics::{CompileError, Hint};
pub use lexer::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The result of a full pipeline run
#[derive(Debug)]
pub struct Transpiled {
    pub c_source: String,
    pub hints: Vec<Hint>,
}

/// Tokenize Comet source
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    lexer::tokenize(source)
}

/// Parse Comet source to an AST
pub fn parse(source: &str) -> Result<Ast, CompileError> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(&tokens)
}

/// Run the pipeline up to and including the context pass
pub fn analyze(source: &str) -> Result<(Ast, ScopeTree, Vec<Hint>), CompileError> {
    let tokens = lexer::tokenize(source)?;
    tracing::debug!("lexed {} tokens", tokens.len());

    let mut ast = parser::parse(&tokens)?;
    tracing::debug!("parsed {} nodes", ast.nodes.len());

    let (scopes, hints) = context::grow(&mut ast)?;
    Ok((ast, scopes, hints))
}

/// Transpile Comet source to a C translation unit
pub fn transpile(source: &str) -> Result<Transpiled, CompileError> {
    let (ast, scopes, hints) = analyze(source)?;

    let c_source = codegen::compile_c(&ast, &scopes)?;
    tracing::debug!("emitted {} bytes of C", c_source.len());

    Ok(Transpiled { c_source, hints })
}
