//! Parameter-binding ties: defaults, keywords, star/kwarg spill, trailing
//! formals after the rest parameter, and block arguments.

use std::fs;

use sift_common::Span;
use sift_parser::ast::{AstBuilder, NodeKind};
use sift_analysis::state::StateKind;
use sift_analysis::transform;
use sift_analysis::ty::{ClassData, InstanceData, TypeKind, STR};
use sift_analysis::{Analyzer, AnalyzerOptions, Binding, BindingKind, NodeRef};

fn analyze(source: &str) -> Analyzer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.py");
    fs::write(&path, source).unwrap();
    let mut az = Analyzer::new(AnalyzerOptions::default());
    az.analyze(&path).unwrap();
    az.finish();
    az
}

fn binding<'a>(az: &'a Analyzer, qname: &str) -> &'a Binding {
    az.get_all_bindings()
        .iter()
        .find(|b| b.qname == qname)
        .unwrap_or_else(|| panic!("no binding with qname {qname}"))
}

fn int_of(az: &Analyzer, qname: &str) -> Option<i64> {
    let r = az.types.as_int(binding(az, qname).ty)?;
    r.is_actual_value().then_some(r.lower)
}

#[test]
fn keywords_fill_formals_before_starargs() {
    let az = analyze("def f(a, b, c=9):\n    return b\nf(1, b=2)\n");
    assert_eq!(int_of(&az, "m.f.a"), Some(1));
    assert_eq!(int_of(&az, "m.f.b"), Some(2));
    assert_eq!(int_of(&az, "m.f.c"), Some(9));
}

#[test]
fn starargs_supply_missing_positionals() {
    let az = analyze("pair = (1, \"s\")\ndef f(a, b):\n    return b\nf(*pair)\n");
    assert_eq!(int_of(&az, "m.f.a"), Some(1));
    assert!(matches!(
        az.types.kind(binding(&az, "m.f.b").ty),
        TypeKind::Str(_)
    ));
}

#[test]
fn leftover_keywords_feed_the_kwarg_dict() {
    let az = analyze("def f(a, **kw):\n    return kw\nf(1, x=2, y=\"s\")\n");
    let kw = binding(&az, "m.f.kw");
    let TypeKind::Dict { key, value } = az.types.kind(kw.ty) else {
        panic!("expected dict, got {}", az.types.render(kw.ty, true));
    };
    assert!(matches!(az.types.kind(*key), TypeKind::Str(_)));
    let rendered = az.types.render(*value, false);
    assert!(rendered.contains("int") && rendered.contains("str"), "{rendered}");
}

#[test]
fn surplus_positionals_feed_rest_honoring_trailing_formals() {
    let az = analyze("def f(a, *rest, b):\n    return b\nf(1, 2, 3, 4)\n");
    assert_eq!(int_of(&az, "m.f.a"), Some(1));
    // The last actual lands in the trailing formal, the middle in rest.
    assert_eq!(int_of(&az, "m.f.b"), Some(4));
    let rest = binding(&az, "m.f.rest");
    let TypeKind::Tuple { elts } = az.types.kind(rest.ty) else {
        panic!("expected tuple, got {}", az.types.render(rest.ty, true));
    };
    assert_eq!(elts.len(), 2);
}

#[test]
fn rest_without_surplus_is_unknown() {
    let az = analyze("def f(a, *rest):\n    return a\nf(1)\n");
    assert_eq!(int_of(&az, "m.f.a"), Some(1));
    assert!(matches!(
        az.types.kind(binding(&az, "m.f.rest").ty),
        TypeKind::Unknown
    ));
}

#[test]
fn receiver_without_a_self_formal_binds_under_the_conventional_name() {
    // Ruby-family methods declare no self formal; the receiver must still
    // be reachable under the conventional name inside the body. Build
    // `def area(scale): return self.width` by hand and apply it with an
    // instance threaded as the receiver.
    let mut b = AstBuilder::new();
    let scale = b.add(NodeKind::Name { id: "scale".into() }, Span::new(0, 5));
    let self_ref = b.add(NodeKind::Name { id: "self".into() }, Span::new(6, 10));
    let width = b.add(NodeKind::Name { id: "width".into() }, Span::new(11, 16));
    let attr = b.add(
        NodeKind::Attribute {
            target: self_ref,
            attr: width,
        },
        Span::new(6, 16),
    );
    let ret = b.add(NodeKind::Return { value: Some(attr) }, Span::new(6, 16));
    let body = b.add(NodeKind::Block { stmts: vec![ret] }, Span::new(6, 16));
    let fname = b.add(NodeKind::Name { id: "area".into() }, Span::new(17, 21));
    let func = b.add(
        NodeKind::Function {
            name: Some(fname),
            args: vec![scale],
            defaults: vec![],
            vararg: None,
            kwarg: None,
            after_rest: vec![],
            blockarg: None,
            body,
            is_lambda: false,
        },
        Span::new(0, 21),
    );
    let stmt_block = b.add(NodeKind::Block { stmts: vec![func] }, Span::new(0, 21));
    let root = b.add(NodeKind::Module { body: stmt_block }, Span::new(0, 21));
    let mut ast = b.finish(root);
    ast.set_file("<synthetic>", "");

    let mut az = Analyzer::new(AnalyzerOptions::default());
    let file = az.add_synthetic_file("<synthetic>", ast);
    let module_state = az.states.add(Some(az.globaltable), StateKind::Module);
    az.states.set_path(module_state, "synthetic");
    transform::transform(&mut az, file, stmt_block, module_state);

    // A class with one instance whose table carries a width attribute.
    let class_state = az.states.add(Some(az.globaltable), StateKind::Class);
    az.states.set_path(class_state, "Rect");
    let cls = az.types.add(TypeKind::Class(ClassData {
        name: "Rect".into(),
        def: None,
        table: class_state,
        bases: vec![],
    }));
    let instance_state = az.states.add(Some(class_state), StateKind::Instance);
    az.states.set_path(instance_state, "Rect");
    let instance = az.types.add(TypeKind::Instance(InstanceData {
        class: cls,
        table: instance_state,
        call: None,
        args: vec![],
    }));
    let three = az.types.int_value(3);
    az.insert(
        instance_state,
        "width",
        NodeRef { file, node: width },
        three,
        BindingKind::Attribute,
    );

    let fun = binding(&az, "synthetic.area").ty;
    let two = az.types.int_value(2);
    let result = transform::apply(
        &mut az,
        fun,
        Some(instance),
        &[two],
        rustc_hash::FxHashMap::default(),
        None,
        None,
        None,
        None,
    );

    // The first formal took the positional as-is, the receiver was bound
    // directly under `self`, and the body read the instance attribute.
    assert_eq!(
        az.types.as_int(result).map(|r| (r.lower, r.upper)),
        Some((3, 3))
    );
    assert_eq!(int_of(&az, "synthetic.area.scale"), Some(2));
    assert!(matches!(
        az.types.kind(binding(&az, "synthetic.area.self").ty),
        TypeKind::Instance(_)
    ));
}

#[test]
fn block_argument_binds_when_supplied() {
    // Block formals come from the Ruby-family frontends; build the tree
    // directly and apply the function with a block type.
    let mut b = AstBuilder::new();
    let blk = b.add(NodeKind::Name { id: "blk".into() }, Span::new(0, 3));
    let a = b.add(NodeKind::Name { id: "a".into() }, Span::new(4, 5));
    let use_blk = b.add(NodeKind::Name { id: "blk".into() }, Span::new(6, 9));
    let ret = b.add(
        NodeKind::Return {
            value: Some(use_blk),
        },
        Span::new(6, 9),
    );
    let body = b.add(NodeKind::Block { stmts: vec![ret] }, Span::new(6, 9));
    let fname = b.add(NodeKind::Name { id: "each".into() }, Span::new(10, 14));
    let func = b.add(
        NodeKind::Function {
            name: Some(fname),
            args: vec![a],
            defaults: vec![],
            vararg: None,
            kwarg: None,
            after_rest: vec![],
            blockarg: Some(blk),
            body,
            is_lambda: false,
        },
        Span::new(0, 14),
    );
    let stmt_block = b.add(NodeKind::Block { stmts: vec![func] }, Span::new(0, 14));
    let root = b.add(NodeKind::Module { body: stmt_block }, Span::new(0, 14));
    let mut ast = b.finish(root);
    ast.set_file("<synthetic>", "");

    let mut az = Analyzer::new(AnalyzerOptions::default());
    let file = az.add_synthetic_file("<synthetic>", ast);
    let module_state = az.states.add(Some(az.globaltable), StateKind::Module);
    az.states.set_path(module_state, "synthetic");
    transform::transform(&mut az, file, stmt_block, module_state);

    let fun = binding(&az, "synthetic.each").ty;
    let one = az.types.int_value(1);
    let result = transform::apply(
        &mut az,
        fun,
        None,
        &[one],
        rustc_hash::FxHashMap::default(),
        None,
        None,
        Some(STR),
        None,
    );
    // The body returns the bound block.
    assert!(matches!(az.types.kind(result), TypeKind::Str(_)));
    assert!(matches!(
        az.types.kind(binding(&az, "synthetic.each.blk").ty),
        TypeKind::Str(_)
    ));
}
