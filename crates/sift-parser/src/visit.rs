//! Generic pre-order traversal over a module arena.

use crate::ast::{ModuleAst, NodeId};

/// Receives every node of a traversal.
///
/// Return `false` to prune: the node's children are skipped but traversal
/// continues with its siblings.
pub trait Visitor {
    fn visit(&mut self, ast: &ModuleAst, id: NodeId) -> bool;
}

/// Walk `id` and its subtree in source order, dispatching to `visitor`.
pub fn walk(ast: &ModuleAst, id: NodeId, visitor: &mut dyn Visitor) {
    if visitor.visit(ast, id) {
        for child in ast.children(id) {
            walk(ast, child, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parse_module;

    struct NameCollector {
        names: Vec<String>,
        skip_functions: bool,
    }

    impl Visitor for NameCollector {
        fn visit(&mut self, ast: &ModuleAst, id: NodeId) -> bool {
            match ast.kind(id) {
                NodeKind::Name { id: text } => {
                    self.names.push(text.clone());
                    true
                }
                NodeKind::Function { .. } => !self.skip_functions,
                _ => true,
            }
        }
    }

    #[test]
    fn walk_visits_in_source_order() {
        let ast = parse_module("a = b\nc = d\n").unwrap();
        let mut v = NameCollector {
            names: Vec::new(),
            skip_functions: false,
        };
        walk(&ast, ast.root(), &mut v);
        assert_eq!(v.names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn returning_false_prunes_the_subtree() {
        let ast = parse_module("def f(p):\n    return q\nz = 1\n").unwrap();
        let mut v = NameCollector {
            names: Vec::new(),
            skip_functions: true,
        };
        walk(&ast, ast.root(), &mut v);
        assert_eq!(v.names, vec!["z"]);
    }
}
