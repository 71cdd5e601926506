//! Lexical styling: decorations derivable from the tree alone.

use sift_parser::{ModuleAst, NodeId, NodeKind, Visitor};

use crate::style::{StyleKind, StyleRun};

const BUILTIN_NAMES: &[&str] = &[
    "None",
    "True",
    "False",
    "NotImplemented",
    "Ellipsis",
    "__debug__",
];

/// Walks one module tree and collects styles for numbers, strings,
/// docstrings, function names, and builtin constants.
pub struct Styler {
    styles: Vec<StyleRun>,
}

impl Styler {
    pub fn new() -> Self {
        Styler { styles: Vec::new() }
    }

    /// Decorate one source file.
    pub fn add_styles(mut self, ast: &ModuleAst, source: &str) -> Vec<StyleRun> {
        let mut visitor = StyleVisitor {
            styles: &mut self.styles,
            source,
        };
        sift_parser::walk(ast, ast.root(), &mut visitor);
        self.styles
    }
}

impl Default for Styler {
    fn default() -> Self {
        Self::new()
    }
}

struct StyleVisitor<'a> {
    styles: &'a mut Vec<StyleRun>,
    source: &'a str,
}

impl StyleVisitor<'_> {
    fn add(&mut self, ast: &ModuleAst, id: NodeId, kind: StyleKind) {
        let span = ast.span(id);
        self.styles.push(StyleRun::new(kind, span.start, span.len()));
    }

    /// A string literal that opens with a tripled quote renders as a
    /// docstring.
    fn is_triple_quoted(&self, ast: &ModuleAst, id: NodeId) -> bool {
        let span = ast.span(id);
        self.source
            .get(span.start as usize..span.end as usize)
            .map(|s| s.starts_with("\"\"\"") || s.starts_with("'''"))
            .unwrap_or(false)
    }
}

impl Visitor for StyleVisitor<'_> {
    fn visit(&mut self, ast: &ModuleAst, id: NodeId) -> bool {
        match ast.kind(id) {
            NodeKind::Int { .. } | NodeKind::Float { .. } => {
                self.add(ast, id, StyleKind::Number);
            }
            NodeKind::Str { .. } => {
                if self.is_triple_quoted(ast, id) {
                    self.add(ast, id, StyleKind::DocString);
                } else {
                    self.add(ast, id, StyleKind::String);
                }
            }
            NodeKind::Name { id: text } => {
                // The name position of a def gets function styling; vararg
                // and kwarg names read as parameters.
                if let Some(parent) = ast.parent(id) {
                    if let NodeKind::Function {
                        name,
                        vararg,
                        kwarg,
                        ..
                    } = ast.kind(parent)
                    {
                        if *name == Some(id) {
                            self.add(ast, id, StyleKind::FunctionName);
                            return true;
                        }
                        if *vararg == Some(id) || *kwarg == Some(id) {
                            self.add(ast, id, StyleKind::Parameter);
                            return true;
                        }
                    }
                }
                if BUILTIN_NAMES.contains(&text.as_str()) {
                    self.add(ast, id, StyleKind::Builtin);
                }
            }
            _ => {}
        }
        true
    }
}
