//! Frontend for the sift analyzer: lexer, parser, and the arena AST the
//! semantic pass consumes.
//!
//! The bundled parser covers the Python dialect. The AST taxonomy is
//! frontend-neutral -- a Ruby-family parser produces the same
//! [`ast::ModuleAst`] shape (block arguments, trailing-after-rest formals)
//! and plugs into the analyzer unchanged.
//!
//! # Architecture
//!
//! - [`ast`]: arena nodes, builder, docstrings, literal evaluation
//! - [`lexer`]: indentation-aware tokenizer
//! - [`parser`]: recursive-descent statements, precedence-ladder expressions
//! - [`visit`]: generic pre-order traversal
//! - [`error`]: hard parse failures

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod visit;

pub use ast::{ModuleAst, NodeId, NodeKind};
pub use error::ParseError;
pub use visit::{walk, Visitor};

/// Parse one module's source text into a sealed arena.
///
/// The returned tree has no file identity yet; the loader stamps it via
/// [`ModuleAst::set_file`] once the path and content hash are known.
pub fn parse_module(source: &str) -> Result<ModuleAst, ParseError> {
    parser::Parser::parse(source)
}
