//! Whole-program invariant checks over a fixture with most language
//! features exercised at once.

use std::fs;

use sift_analysis::ty::TypeKind;
use sift_analysis::{Analyzer, AnalyzerOptions};

const FIXTURE: &str = "\
import math

LIMIT = 10

def clamp(v, lo=0, hi=LIMIT):
    if v < 0:
        return lo
    return v

class Counter:
    def __init__(self, start):
        self.value = start
    def bump(self, by=1):
        self.value = self.value + by
        return self.value

def run(xs):
    c = Counter(0)
    for x in xs:
        c.bump(x)
    return c.value

clamp(5)
clamp(5, 1)
run([1, 2, 3])
r = math.sqrt(2)
";

fn analyze_fixture() -> Analyzer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.py");
    fs::write(&path, FIXTURE).unwrap();
    let mut az = Analyzer::new(AnalyzerOptions::default());
    az.analyze(&path).unwrap();
    az.finish();
    az
}

#[test]
fn unions_stay_flat_and_deduplicated() {
    let az = analyze_fixture();
    for b in az.get_all_bindings() {
        let TypeKind::Union { members } = az.types.kind(b.ty) else {
            continue;
        };
        for (i, m) in members.iter().enumerate() {
            assert!(
                !matches!(az.types.kind(*m), TypeKind::Union { .. }),
                "nested union in {}",
                b.qname
            );
            for n in &members[i + 1..] {
                assert!(!az.types.eq(*m, *n), "duplicate member in {}", b.qname);
            }
        }
    }
}

#[test]
fn reference_index_matches_binding_refs() {
    let az = analyze_fixture();
    let refs = az.get_references();

    // Every indexed ref points at bindings that own it.
    for (r, bids) in refs {
        assert!(!bids.is_empty());
        for bid in bids {
            assert!(
                az.binding(*bid).refs.contains(r),
                "index lists a binding that does not own the ref"
            );
        }
    }
    // Every binding ref appears in the index and leads back to the
    // binding.
    for (i, b) in az.get_all_bindings().iter().enumerate() {
        for r in &b.refs {
            let listed = refs.get(r).expect("binding ref missing from index");
            assert!(
                listed.iter().any(|bid| bid.0 as usize == i),
                "index entry does not lead back to {}",
                b.qname
            );
        }
    }
}

#[test]
fn loaded_trees_keep_parent_consistency() {
    let az = analyze_fixture();
    for file in az.loaded_files() {
        assert!(
            file.ast.parents_consistent(),
            "inconsistent parents in {}",
            file.path
        );
    }
}

#[test]
fn every_qname_is_rooted_in_a_module_or_builtin() {
    let az = analyze_fixture();
    for b in az.get_all_bindings() {
        assert!(!b.qname.is_empty(), "empty qname for {}", b.name);
        if !b.builtin {
            assert!(
                !b.qname.starts_with('.') && !b.qname.ends_with('.'),
                "malformed qname {}",
                b.qname
            );
        }
    }
}

#[test]
fn analysis_is_repeatable() {
    let a = analyze_fixture();
    let b = analyze_fixture();
    let names = |az: &Analyzer| -> Vec<(String, String)> {
        az.get_all_bindings()
            .iter()
            .map(|x| (x.qname.clone(), az.types.render(x.ty, true)))
            .collect()
    };
    assert_eq!(names(&a), names(&b));
}
