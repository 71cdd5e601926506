//! Integration tests for the Python-dialect parser.
//!
//! Each test parses a snippet and asserts on the resulting arena shape.
//! The serde round-trip test at the bottom covers the cache's on-disk form.

use sift_parser::ast::{BinOpKind, CmpOpKind, ModuleAst, NodeId, NodeKind};
use sift_parser::parse_module;

/// Statements of the module body block.
fn body_stmts(ast: &ModuleAst) -> Vec<NodeId> {
    let NodeKind::Module { body } = ast.kind(ast.root()) else {
        panic!("root is not a module");
    };
    let NodeKind::Block { stmts } = ast.kind(*body) else {
        panic!("module body is not a block");
    };
    stmts.clone()
}

#[test]
fn assignment_and_arithmetic() {
    let ast = parse_module("x = 1\ny = x + 2\n").unwrap();
    let stmts = body_stmts(&ast);
    assert_eq!(stmts.len(), 2);

    let NodeKind::Assign { target, value } = ast.kind(stmts[1]) else {
        panic!("expected assignment");
    };
    assert_eq!(ast.name_text(*target), Some("y"));
    let NodeKind::BinOp { op, left, right } = ast.kind(*value) else {
        panic!("expected binop");
    };
    assert_eq!(*op, BinOpKind::Add);
    assert_eq!(ast.name_text(*left), Some("x"));
    assert!(matches!(ast.kind(*right), NodeKind::Int { value: 2 }));
}

#[test]
fn semicolons_separate_statements() {
    let ast = parse_module("x = 1; y = x + 2\n").unwrap();
    assert_eq!(body_stmts(&ast).len(), 2);
}

#[test]
fn function_with_default() {
    let ast = parse_module("def f(a, b=2):\n    return a + b\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Function {
        name,
        args,
        defaults,
        vararg,
        is_lambda,
        ..
    } = ast.kind(stmts[0])
    else {
        panic!("expected function");
    };
    assert_eq!(ast.name_text(name.unwrap()), Some("f"));
    assert_eq!(args.len(), 2);
    assert_eq!(defaults.len(), 1);
    assert!(vararg.is_none());
    assert!(!is_lambda);
}

#[test]
fn varargs_and_after_rest() {
    let ast = parse_module("def f(a, *rest, b, **kw):\n    pass\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Function {
        args,
        vararg,
        after_rest,
        kwarg,
        ..
    } = ast.kind(stmts[0])
    else {
        panic!("expected function");
    };
    assert_eq!(args.len(), 1);
    assert!(vararg.is_some());
    assert_eq!(after_rest.len(), 1);
    assert!(kwarg.is_some());
}

#[test]
fn class_with_method() {
    let ast = parse_module("class A(Base):\n    def m(self):\n        return 1\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Class { name, bases, body } = ast.kind(stmts[0]) else {
        panic!("expected class");
    };
    assert_eq!(ast.name_text(*name), Some("A"));
    assert_eq!(bases.len(), 1);
    let NodeKind::Block { stmts: class_stmts } = ast.kind(*body) else {
        panic!("expected block");
    };
    assert!(matches!(
        ast.kind(class_stmts[0]),
        NodeKind::Function { .. }
    ));
}

#[test]
fn call_forms() {
    let ast = parse_module("f(1, x=2, *rest, **kw)\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::ExprStmt { value } = ast.kind(stmts[0]) else {
        panic!("expected expr stmt");
    };
    let NodeKind::Call {
        args,
        keywords,
        kwargs,
        starargs,
        ..
    } = ast.kind(*value)
    else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    assert_eq!(keywords.len(), 1);
    assert!(kwargs.is_some());
    assert!(starargs.is_some());
    let NodeKind::Keyword { arg, .. } = ast.kind(keywords[0]) else {
        panic!("expected keyword");
    };
    assert_eq!(arg, "x");
}

#[test]
fn attribute_chain_and_subscript() {
    let ast = parse_module("a.b.c[0]\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::ExprStmt { value } = ast.kind(stmts[0]) else {
        panic!("expected expr stmt");
    };
    let NodeKind::Subscript { value: sub, index } = ast.kind(*value) else {
        panic!("expected subscript");
    };
    assert!(index.is_some());
    let NodeKind::Attribute { target, attr } = ast.kind(*sub) else {
        panic!("expected attribute");
    };
    assert_eq!(ast.name_text(*attr), Some("c"));
    assert!(matches!(ast.kind(*target), NodeKind::Attribute { .. }));
}

#[test]
fn if_elif_else_nests() {
    let ast = parse_module("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::If { orelse, .. } = ast.kind(stmts[0]) else {
        panic!("expected if");
    };
    // The elif chain parses as a nested If in the orelse slot.
    assert!(matches!(ast.kind(orelse.unwrap()), NodeKind::If { .. }));
}

#[test]
fn ternary_expression() {
    let ast = parse_module("y = 1 if n <= 1 else 2\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Assign { value, .. } = ast.kind(stmts[0]) else {
        panic!("expected assign");
    };
    let NodeKind::IfExp { test, .. } = ast.kind(*value) else {
        panic!("expected conditional expression");
    };
    let NodeKind::Compare { op, .. } = ast.kind(*test) else {
        panic!("expected comparison");
    };
    assert_eq!(*op, CmpOpKind::LtE);
}

#[test]
fn tuple_unpack_targets() {
    let ast = parse_module("a, b = (1, \"hi\")\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Assign { target, value } = ast.kind(stmts[0]) else {
        panic!("expected assign");
    };
    let NodeKind::Tuple { elts } = ast.kind(*target) else {
        panic!("expected tuple target");
    };
    assert_eq!(elts.len(), 2);
    assert!(matches!(ast.kind(*value), NodeKind::Tuple { .. }));
}

#[test]
fn starred_target() {
    let ast = parse_module("a, *mid, b = xs\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Assign { target, .. } = ast.kind(stmts[0]) else {
        panic!("expected assign");
    };
    let NodeKind::Tuple { elts } = ast.kind(*target) else {
        panic!("expected tuple target");
    };
    assert!(matches!(ast.kind(elts[1]), NodeKind::Starred { .. }));
}

#[test]
fn try_except_finally() {
    let src = "try:\n    x = f()\nexcept IOError as e:\n    x = 0\nfinally:\n    done()\n";
    let ast = parse_module(src).unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Try {
        handlers,
        finalbody,
        ..
    } = ast.kind(stmts[0])
    else {
        panic!("expected try");
    };
    assert_eq!(handlers.len(), 1);
    assert!(finalbody.is_some());
    let NodeKind::Handler {
        exceptions, binder, ..
    } = ast.kind(handlers[0])
    else {
        panic!("expected handler");
    };
    assert_eq!(exceptions.len(), 1);
    assert_eq!(ast.name_text(binder.unwrap()), Some("e"));
}

#[test]
fn for_and_while_loops() {
    let ast = parse_module("for i in xs:\n    use(i)\nwhile a:\n    break\n").unwrap();
    let stmts = body_stmts(&ast);
    assert!(matches!(ast.kind(stmts[0]), NodeKind::For { .. }));
    assert!(matches!(ast.kind(stmts[1]), NodeKind::While { .. }));
}

#[test]
fn membership_and_boolean_operators() {
    let ast = parse_module("ok = x in xs and not y\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Assign { value, .. } = ast.kind(stmts[0]) else {
        panic!("expected assign");
    };
    let NodeKind::BoolOp { values, .. } = ast.kind(*value) else {
        panic!("expected boolean op");
    };
    assert!(matches!(
        ast.kind(values[0]),
        NodeKind::Compare {
            op: CmpOpKind::In,
            ..
        }
    ));
    assert!(matches!(ast.kind(values[1]), NodeKind::UnaryOp { .. }));
}

#[test]
fn lambda_is_a_function_node() {
    let ast = parse_module("f = lambda x: x + 1\n").unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Assign { value, .. } = ast.kind(stmts[0]) else {
        panic!("expected assign");
    };
    let NodeKind::Function {
        name,
        args,
        is_lambda,
        ..
    } = ast.kind(*value)
    else {
        panic!("expected lambda function");
    };
    assert!(name.is_none());
    assert_eq!(args.len(), 1);
    assert!(is_lambda);
}

#[test]
fn containers() {
    let ast = parse_module("a = [1, 2]\nb = {1: \"x\"}\nc = {1, 2}\nd = {}\n").unwrap();
    let stmts = body_stmts(&ast);
    let value_of = |i: usize| {
        let NodeKind::Assign { value, .. } = ast.kind(stmts[i]) else {
            panic!("expected assign");
        };
        ast.kind(*value)
    };
    assert!(matches!(value_of(0), NodeKind::ListLit { elts } if elts.len() == 2));
    assert!(matches!(value_of(1), NodeKind::DictLit { keys, .. } if keys.len() == 1));
    assert!(matches!(value_of(2), NodeKind::SetLit { elts } if elts.len() == 2));
    assert!(matches!(value_of(3), NodeKind::DictLit { keys, .. } if keys.is_empty()));
}

#[test]
fn import_and_global() {
    let ast = parse_module("import util, sys\ndef f():\n    global counter\n    counter = 1\n")
        .unwrap();
    let stmts = body_stmts(&ast);
    let NodeKind::Import { names } = ast.kind(stmts[0]) else {
        panic!("expected import");
    };
    assert_eq!(names.len(), 2);
}

#[test]
fn parse_error_on_bad_syntax() {
    assert!(parse_module("def (:\n").is_err());
    assert!(parse_module("x = = 1\n").is_err());
}

#[test]
fn parents_are_wired_for_every_node() {
    let src = "class A:\n    def m(self, k=1):\n        if k:\n            return [k, 2]\n";
    let ast = parse_module(src).unwrap();
    assert!(ast.parents_consistent());
}

#[test]
fn serde_round_trip_preserves_structure() {
    let src = "def f(a, b=2):\n    return a + b\nf(3)\n";
    let mut ast = parse_module(src).unwrap();
    ast.set_file("one.py", "deadbeef");

    let json = serde_json::to_string(&ast).unwrap();
    let mut back: ModuleAst = serde_json::from_str(&json).unwrap();
    assert_eq!(ast, back);

    // Different paths may share content; only the file identity moves.
    back.set_file("two.py", "deadbeef");
    assert_eq!(back.node_count(), ast.node_count());
    assert_eq!(back.file(), "two.py");
    assert!(back.parents_consistent());
}
