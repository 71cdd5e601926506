//! Bindings and references.
//!
//! A [`Binding`] ties a name to a definition site and an inferred type,
//! under a stable qualified name. A [`Ref`] is one observed use. Bindings
//! live in the analyzer's arena for the whole run; after creation they are
//! only refined (type union) and extended (more refs).

use rustc_hash::FxHashSet;
use sift_common::Span;

use crate::ty::TypeId;
use crate::{FileId, NodeRef};

/// Handle to a binding in the analyzer's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Module,
    Class,
    Method,
    Function,
    Constructor,
    Parameter,
    Variable,
    /// Names introduced at module level or by loop targets.
    Scope,
    Attribute,
}

/// One observed use of a name or attribute.
///
/// Identity is (file, start, length): two lookups of the same occurrence
/// collapse to one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ref {
    pub node: NodeRef,
    pub span: Span,
}

impl Ref {
    pub fn new(node: NodeRef, span: Span) -> Self {
        Ref { node, span }
    }

    pub fn file(&self) -> FileId {
        self.node.file
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    /// The defining node.
    pub node: NodeRef,
    /// Dotted path from the module through enclosing scopes to the name.
    pub qname: String,
    pub kind: BindingKind,
    /// Path of the defining file; empty for synthesized definitions.
    pub file: String,
    pub span: Span,
    pub ty: TypeId,
    pub refs: FxHashSet<Ref>,
    pub builtin: bool,
    /// Documentation link, carried by builtin bindings.
    pub url: Option<String>,
}

impl Binding {
    pub fn new(
        name: impl Into<String>,
        node: NodeRef,
        qname: impl Into<String>,
        kind: BindingKind,
        file: impl Into<String>,
        span: Span,
        ty: TypeId,
    ) -> Self {
        Binding {
            name: name.into(),
            node,
            qname: qname.into(),
            kind,
            file: file.into(),
            span,
            ty,
            refs: FxHashSet::default(),
            builtin: false,
            url: None,
        }
    }

    pub fn start(&self) -> u32 {
        self.span.start
    }

    pub fn length(&self) -> u32 {
        self.span.len()
    }

    pub fn add_ref(&mut self, r: Ref) {
        self.refs.insert(r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::UNKNOWN;
    use sift_parser::NodeId;

    fn dummy_node() -> NodeRef {
        NodeRef {
            file: FileId(0),
            node: NodeId(0),
        }
    }

    #[test]
    fn refs_deduplicate_by_location() {
        let mut b = Binding::new(
            "x",
            dummy_node(),
            "mod.x",
            BindingKind::Variable,
            "mod.py",
            Span::new(0, 1),
            UNKNOWN,
        );
        let r = Ref::new(dummy_node(), Span::new(10, 11));
        b.add_ref(r);
        b.add_ref(r);
        assert_eq!(b.refs.len(), 1);
    }

    #[test]
    fn binding_span_accessors() {
        let b = Binding::new(
            "name",
            dummy_node(),
            "m.name",
            BindingKind::Scope,
            "m.py",
            Span::new(4, 8),
            UNKNOWN,
        );
        assert_eq!(b.start(), 4);
        assert_eq!(b.length(), 4);
    }
}
