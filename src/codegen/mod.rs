//! Code generation backends
//!
//! The only backend is C text emission; the pipeline hands it the
//! context-enriched AST and the scope tree.

pub mod c;

pub use c::compile_c;
