//! Whole-program type inference and cross-reference indexing for
//! dynamically typed scripting languages.
//!
//! The analyzer is an abstract interpreter over the frontend's arena AST:
//! a recursive `transform` pass threads a lexical scope through every node
//! and produces a type in a lattice of structural and nominal types.
//! Recursion is broken by a per-call-node stack guard plus per-function
//! memoization of argument-tuple to result mappings. The outputs are
//! bindings (name, definition site, type, qualified name), references to
//! those bindings, and best-effort diagnostics -- everything a
//! cross-reference consumer needs.
//!
//! # Architecture
//!
//! - [`ty`]: the type lattice and its arena pool
//! - [`state`]: lexical scopes with branch-flow copy/merge
//! - [`binding`]: definition sites and references
//! - [`binder`]: destructuring pattern binds
//! - [`analyzer`]: the driver, registry, and query surface
//! - [`transform`]: the abstract-interpretation pass and call evaluation
//! - [`builtins`]: the seeded root environment
//! - [`cache`]: content-hashed AST memoization with an on-disk layer
//! - [`diagnostics`]: problem records and rendering

pub mod analyzer;
pub mod binder;
pub mod binding;
pub mod builtins;
pub mod cache;
pub mod diagnostics;
pub mod state;
pub mod transform;
pub mod ty;

use sift_parser::NodeId;

pub use analyzer::{Analyzer, AnalyzerOptions};
pub use binding::{Binding, BindingId, BindingKind, Ref};
pub use diagnostics::{Diagnostic, DiagnosticOptions};

/// Handle to a loaded source file within one analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// Process-wide node identity: a node handle qualified by its file.
///
/// The call-stack cycle guard, the problems map, and every binding use this
/// to name AST nodes across module arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}
