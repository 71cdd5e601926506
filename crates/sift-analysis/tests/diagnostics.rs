//! Diagnostic behavior: every problem is recoverable and analysis of the
//! rest of the program continues.

use std::fs;

use sift_analysis::{Analyzer, AnalyzerOptions};

fn analyze(source: &str) -> Analyzer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.py");
    fs::write(&path, source).unwrap();
    let mut az = Analyzer::new(AnalyzerOptions::default());
    az.analyze(&path).unwrap();
    az.finish();
    az
}

fn messages(az: &Analyzer) -> Vec<String> {
    az.all_problems()
        .into_iter()
        .map(|d| d.message.clone())
        .collect()
}

#[test]
fn undefined_name() {
    let az = analyze("y = missing\n");
    assert!(messages(&az).iter().any(|m| m == "undefined name: missing"));
    // The assignment still bound y (to Unknown).
    assert!(az.get_all_bindings().iter().any(|b| b.qname == "m.y"));
}

#[test]
fn calling_a_non_callable() {
    let az = analyze("x = 1\nx()\n");
    assert!(
        messages(&az)
            .iter()
            .any(|m| m.starts_with("calling non-function and non-class")),
        "got {:?}",
        messages(&az)
    );
}

#[test]
fn attribute_not_found() {
    let az = analyze("import math\nv = math.tau\n");
    assert!(messages(&az).iter().any(|m| m == "attribute not found: tau"));
}

#[test]
fn unable_to_bind_argument() {
    let az = analyze("def g(a, b):\n    return a\ng(1)\n");
    assert!(
        messages(&az)
            .iter()
            .any(|m| m == "unable to bind argument: b"),
        "got {:?}",
        messages(&az)
    );
}

#[test]
fn function_not_always_returns() {
    let az = analyze("def f(c):\n    if c:\n        return 1\nf(2)\n");
    let msgs = messages(&az);
    assert!(msgs.iter().any(|m| m == "function not always returns a value"));
    assert!(msgs.iter().any(|m| m == "call not always returns a value"));
}

#[test]
fn parse_failure_skips_only_that_module() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.py"), "def (:\n").unwrap();
    fs::write(dir.path().join("good.py"), "x = 1\n").unwrap();

    let mut az = Analyzer::new(AnalyzerOptions::default());
    az.analyze(dir.path()).unwrap();
    az.finish();

    // The bad file produced a file-level problem, the good one analyzed.
    assert_eq!(az.get_file_problems().len(), 1);
    assert!(az.get_all_bindings().iter().any(|b| b.qname == "good.x"));
    assert!(az.get_ast_for_file(&dir.path().join("bad.py")).is_none());
}

#[test]
fn unknown_callee_is_silent() {
    // Unknown cascades without a non-callable warning.
    let az = analyze("def f(h):\n    return h()\nf(1)\n");
    // h is Int at the call, so this one does warn; an unknown h must not.
    let az2 = analyze("def f(h):\n    return h()\n");
    assert!(messages(&az)
        .iter()
        .any(|m| m.starts_with("calling non-function and non-class")));
    assert!(!messages(&az2)
        .iter()
        .any(|m| m.starts_with("calling non-function and non-class")));
}

#[test]
fn problems_are_ordered_by_file_and_offset() {
    let az = analyze("a = one\nb = two\n");
    let spans: Vec<u32> = az.all_problems().iter().map(|d| d.span.start).collect();
    let mut sorted = spans.clone();
    sorted.sort();
    assert_eq!(spans, sorted);
}
