//! Arena AST for the analyzed dialects.
//!
//! A [`ModuleAst`] owns every node of one source file in a flat `Vec`;
//! children and parent back-links are [`NodeId`] handles into that arena.
//! Only the module carries the file path and content hash -- any node
//! resolves its file through the owning arena. The whole structure derives
//! serde, which is what makes the on-disk AST cache a plain round-trip.

use serde::{Deserialize, Serialize};
use sift_common::Span;

/// Handle to a node within its module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A single AST node: a tagged kind plus location and parent link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOpKind {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOpKind {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    In,
}

/// The node taxonomy shared by every frontend.
///
/// The Python-dialect parser produces most of these; `blockarg` slots and
/// `after_rest` formals exist for Ruby-family frontends and for callers
/// that build trees directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Module {
        body: NodeId,
    },
    Block {
        stmts: Vec<NodeId>,
    },
    ExprStmt {
        value: NodeId,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Name {
        id: String,
    },
    Attribute {
        target: NodeId,
        /// A `Name` node; its span locates the attribute for refs.
        attr: NodeId,
    },
    Subscript {
        value: NodeId,
        index: Option<NodeId>,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
        kwargs: Option<NodeId>,
        starargs: Option<NodeId>,
        blockarg: Option<NodeId>,
    },
    Keyword {
        arg: String,
        value: NodeId,
    },
    Function {
        /// `None` for lambdas.
        name: Option<NodeId>,
        args: Vec<NodeId>,
        /// Default expressions covering the last `defaults.len()` formals.
        defaults: Vec<NodeId>,
        vararg: Option<NodeId>,
        kwarg: Option<NodeId>,
        /// Trailing positional formals declared after the vararg.
        after_rest: Vec<NodeId>,
        blockarg: Option<NodeId>,
        /// A `Block` for definitions, a bare expression for lambdas.
        body: NodeId,
        is_lambda: bool,
    },
    Class {
        name: NodeId,
        bases: Vec<NodeId>,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Yield {
        value: Option<NodeId>,
    },
    If {
        test: NodeId,
        body: NodeId,
        orelse: Option<NodeId>,
    },
    IfExp {
        test: NodeId,
        body: NodeId,
        orelse: NodeId,
    },
    While {
        test: NodeId,
        body: NodeId,
        orelse: Option<NodeId>,
    },
    For {
        target: NodeId,
        iter: NodeId,
        body: NodeId,
        orelse: Option<NodeId>,
    },
    Try {
        body: NodeId,
        handlers: Vec<NodeId>,
        orelse: Option<NodeId>,
        finalbody: Option<NodeId>,
    },
    Handler {
        exceptions: Vec<NodeId>,
        /// The `as` name binding, when present.
        binder: Option<NodeId>,
        body: NodeId,
    },
    Import {
        names: Vec<NodeId>,
    },
    BinOp {
        op: BinOpKind,
        left: NodeId,
        right: NodeId,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: NodeId,
    },
    BoolOp {
        op: BoolOpKind,
        values: Vec<NodeId>,
    },
    Compare {
        op: CmpOpKind,
        left: NodeId,
        right: NodeId,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        value: String,
    },
    Tuple {
        elts: Vec<NodeId>,
    },
    ListLit {
        elts: Vec<NodeId>,
    },
    DictLit {
        keys: Vec<NodeId>,
        values: Vec<NodeId>,
    },
    SetLit {
        elts: Vec<NodeId>,
    },
    Starred {
        value: NodeId,
    },
    Pass,
    Break,
    Continue,
    Global {
        names: Vec<String>,
    },
    /// External documentation link; the defining node of builtin bindings.
    Url {
        url: String,
    },
}

impl NodeKind {
    /// Children in source order. Drives parent fix-up and the visitor.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        let mut out = Vec::new();
        let one = |id: &NodeId, out: &mut Vec<NodeId>| out.push(*id);
        let opt = |id: &Option<NodeId>, out: &mut Vec<NodeId>| {
            if let Some(id) = id {
                out.push(*id);
            }
        };
        let many = |ids: &[NodeId], out: &mut Vec<NodeId>| out.extend_from_slice(ids);
        match self {
            Module { body } => one(body, &mut out),
            Block { stmts } => many(stmts, &mut out),
            ExprStmt { value } => one(value, &mut out),
            Assign { target, value } => {
                one(target, &mut out);
                one(value, &mut out);
            }
            Attribute { target, attr } => {
                one(target, &mut out);
                one(attr, &mut out);
            }
            Subscript { value, index } => {
                one(value, &mut out);
                opt(index, &mut out);
            }
            Call {
                func,
                args,
                keywords,
                kwargs,
                starargs,
                blockarg,
            } => {
                one(func, &mut out);
                many(args, &mut out);
                many(keywords, &mut out);
                opt(kwargs, &mut out);
                opt(starargs, &mut out);
                opt(blockarg, &mut out);
            }
            Keyword { value, .. } => one(value, &mut out),
            Function {
                name,
                args,
                defaults,
                vararg,
                kwarg,
                after_rest,
                blockarg,
                body,
                ..
            } => {
                opt(name, &mut out);
                many(args, &mut out);
                many(defaults, &mut out);
                opt(vararg, &mut out);
                opt(kwarg, &mut out);
                many(after_rest, &mut out);
                opt(blockarg, &mut out);
                one(body, &mut out);
            }
            Class { name, bases, body } => {
                one(name, &mut out);
                many(bases, &mut out);
                one(body, &mut out);
            }
            Return { value } | Yield { value } => opt(value, &mut out),
            If { test, body, orelse } | While { test, body, orelse } => {
                one(test, &mut out);
                one(body, &mut out);
                opt(orelse, &mut out);
            }
            IfExp { test, body, orelse } => {
                one(test, &mut out);
                one(body, &mut out);
                one(orelse, &mut out);
            }
            For {
                target,
                iter,
                body,
                orelse,
            } => {
                one(target, &mut out);
                one(iter, &mut out);
                one(body, &mut out);
                opt(orelse, &mut out);
            }
            Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                one(body, &mut out);
                many(handlers, &mut out);
                opt(orelse, &mut out);
                opt(finalbody, &mut out);
            }
            Handler {
                exceptions,
                binder,
                body,
            } => {
                many(exceptions, &mut out);
                opt(binder, &mut out);
                one(body, &mut out);
            }
            Import { names } => many(names, &mut out),
            BinOp { left, right, .. } | Compare { left, right, .. } => {
                one(left, &mut out);
                one(right, &mut out);
            }
            UnaryOp { operand, .. } => one(operand, &mut out),
            BoolOp { values, .. } => many(values, &mut out),
            Tuple { elts } | ListLit { elts } | SetLit { elts } => many(elts, &mut out),
            DictLit { keys, values } => {
                // Interleave so visitation follows source order.
                for (k, v) in keys.iter().zip(values.iter()) {
                    out.push(*k);
                    out.push(*v);
                }
            }
            Starred { value } => one(value, &mut out),
            Name { .. } | Int { .. } | Float { .. } | Str { .. } | Pass | Break | Continue
            | Global { .. } | Url { .. } => {}
        }
        out
    }
}

/// The parsed tree of one module, plus its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleAst {
    nodes: Vec<Node>,
    root: NodeId,
    file: String,
    sha1: String,
}

impl ModuleAst {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Path of the source file, set by whoever loaded the tree. Files in
    /// different directories may share contents (and a cache entry), so a
    /// deserialized tree must be re-stamped with [`ModuleAst::set_file`].
    pub fn file(&self) -> &str {
        &self.file
    }

    /// SHA-1 of the source this tree was parsed from.
    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    pub fn set_file(&mut self, file: impl Into<String>, sha1: impl Into<String>) {
        self.file = file.into();
        self.sha1 = sha1.into();
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The identifier of a `Name` node, if `id` is one.
    pub fn name_text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Name { id: text } => Some(text),
            _ => None,
        }
    }

    /// The docstring of a module, function, or class node.
    ///
    /// Only the first statement of the body block is inspected; a leading
    /// string expression is the docstring, anything else (including
    /// comments) is not.
    pub fn doc_string(&self, id: NodeId) -> Option<NodeId> {
        let body = match self.kind(id) {
            NodeKind::Module { body } => *body,
            NodeKind::Function { body, .. } => *body,
            NodeKind::Class { body, .. } => *body,
            _ => return None,
        };
        let NodeKind::Block { stmts } = self.kind(body) else {
            return None;
        };
        let first = *stmts.first()?;
        let NodeKind::ExprStmt { value } = self.kind(first) else {
            return None;
        };
        match self.kind(*value) {
            NodeKind::Str { .. } => Some(*value),
            _ => None,
        }
    }

    /// Whether every reachable child points back at its parent. Exercised
    /// by tests; trees built through [`AstBuilder::finish`] always satisfy
    /// this.
    pub fn parents_consistent(&self) -> bool {
        if self.node(self.root).parent.is_some() {
            return false;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            for child in self.children(id) {
                if self.node(child).parent != Some(id) {
                    return false;
                }
                stack.push(child);
            }
        }
        true
    }
}

/// Incremental arena construction. Parsers (and tests) add nodes bottom-up,
/// then `finish` wires every parent link in one pass.
#[derive(Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    /// Span of an already-built node. The arena is append-only, so this is
    /// stable for the rest of the build.
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    /// Seal the arena with `root` as the module root and set every child's
    /// parent back-link.
    pub fn finish(mut self, root: NodeId) -> ModuleAst {
        for i in 0..self.nodes.len() {
            for child in self.nodes[i].kind.children() {
                self.nodes[child.0 as usize].parent = Some(NodeId(i as u32));
            }
        }
        self.nodes[root.0 as usize].parent = None;
        ModuleAst {
            nodes: self.nodes,
            root,
            file: String::new(),
            sha1: String::new(),
        }
    }
}

/// Evaluate an integer literal's text.
///
/// Reproduces the original scanner faithfully: underscores are stripped, a
/// sign prefix is honored, and the base comes from `0b`/`0x`/`0o` prefixes,
/// a bare `x` hex prefix, or a leading zero (octal). Values saturate at the
/// i64 range.
pub fn parse_int_literal(literal: &str) -> Option<i64> {
    let cleaned: String = literal.chars().filter(|c| *c != '_').collect();
    let mut s = cleaned.as_str();
    let mut sign = 1i64;
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if let Some(rest) = s.strip_prefix('-') {
        s = rest;
        sign = -1;
    }

    let (base, digits) = if let Some(rest) = s.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = s.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = s.strip_prefix('x') {
        (16, rest)
    } else if let Some(rest) = s.strip_prefix("0o") {
        (8, rest)
    } else if s.starts_with('0') && s.len() >= 2 {
        (8, &s[1..])
    } else {
        (10, s)
    };

    if digits.is_empty() {
        return None;
    }
    let mut value = 0i64;
    for c in digits.chars() {
        let d = c.to_digit(base)? as i64;
        value = value.saturating_mul(base as i64).saturating_add(d);
    }
    Some(if sign == -1 { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(builder: &mut AstBuilder, kind: NodeKind) -> NodeId {
        builder.add(kind, Span::new(0, 0))
    }

    #[test]
    fn builder_wires_parents() {
        let mut b = AstBuilder::new();
        let x = leaf(&mut b, NodeKind::Name { id: "x".into() });
        let one = leaf(&mut b, NodeKind::Int { value: 1 });
        let assign = leaf(&mut b, NodeKind::Assign { target: x, value: one });
        let block = leaf(&mut b, NodeKind::Block { stmts: vec![assign] });
        let module = leaf(&mut b, NodeKind::Module { body: block });
        let ast = b.finish(module);

        assert_eq!(ast.parent(x), Some(assign));
        assert_eq!(ast.parent(assign), Some(block));
        assert_eq!(ast.parent(module), None);
        assert!(ast.parents_consistent());
    }

    #[test]
    fn doc_string_only_first_statement() {
        let mut b = AstBuilder::new();
        let doc = leaf(&mut b, NodeKind::Str { value: "docs".into() });
        let doc_stmt = leaf(&mut b, NodeKind::ExprStmt { value: doc });
        let pass = leaf(&mut b, NodeKind::Pass);
        let block = leaf(
            &mut b,
            NodeKind::Block {
                stmts: vec![doc_stmt, pass],
            },
        );
        let module = leaf(&mut b, NodeKind::Module { body: block });
        let ast = b.finish(module);
        assert_eq!(ast.doc_string(module), Some(doc));
    }

    #[test]
    fn doc_string_absent_when_first_statement_is_not_a_string() {
        let mut b = AstBuilder::new();
        let pass = leaf(&mut b, NodeKind::Pass);
        let s = leaf(&mut b, NodeKind::Str { value: "late".into() });
        let stmt = leaf(&mut b, NodeKind::ExprStmt { value: s });
        let block = leaf(
            &mut b,
            NodeKind::Block {
                stmts: vec![pass, stmt],
            },
        );
        let module = leaf(&mut b, NodeKind::Module { body: block });
        let ast = b.finish(module);
        assert_eq!(ast.doc_string(module), None);
    }

    #[test]
    fn int_literal_bases() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("1_000"), Some(1000));
        assert_eq!(parse_int_literal("-7"), Some(-7));
        assert_eq!(parse_int_literal("+7"), Some(7));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("0o17"), Some(15));
    }

    #[test]
    fn int_literal_legacy_forms() {
        // Leading-zero octal and the bare `x` hex prefix both survive from
        // the original scanner.
        assert_eq!(parse_int_literal("0755"), Some(493));
        assert_eq!(parse_int_literal("xFF"), Some(255));
    }

    #[test]
    fn int_literal_rejects_garbage() {
        assert_eq!(parse_int_literal("0x"), None);
        assert_eq!(parse_int_literal("12ab"), None);
        assert_eq!(parse_int_literal("089"), None);
    }

    #[test]
    fn int_literal_saturates() {
        assert_eq!(
            parse_int_literal("99999999999999999999999999"),
            Some(i64::MAX)
        );
    }
}
