//! The seeded root environment.
//!
//! Populates the analyzer's global scope with the singleton constants, a
//! representative table of builtin functions (declared return types, no
//! bodies), and a few standard-library modules. Every binding created here
//! is marked builtin and carries a documentation URL; the defining nodes
//! live in one synthesized `<builtins>` module so they have file identity
//! like everything else.

use sift_parser::NodeId;

use crate::analyzer::{synthetic_module, Analyzer};
use crate::binding::{BindingId, BindingKind};
use crate::state::StateKind;
use crate::ty::{
    ClassData, FunData, ModuleData, TypeId, TypeKind, BOOL, FALSE, FLOAT, INT, NIL, STR, TRUE,
    UNKNOWN,
};
use crate::{FileId, NodeRef};

const DOCS: &str = "https://docs.python.org/3/library";

struct Entry {
    name: &'static str,
    ty: Ty,
    url: &'static str,
}

enum Ty {
    Const(TypeId),
    /// A constant list-of value, e.g. `sys.argv`.
    ListOf(TypeId),
    /// A builtin function with this declared return type.
    Fn(TypeId),
    /// A builtin function returning a list of the given element type.
    FnListOf(TypeId),
}

const CONSTANTS: &[Entry] = &[
    Entry { name: "True", ty: Ty::Const(TRUE), url: "constants.html#True" },
    Entry { name: "False", ty: Ty::Const(FALSE), url: "constants.html#False" },
    Entry { name: "None", ty: Ty::Const(NIL), url: "constants.html#None" },
];

const FUNCTIONS: &[Entry] = &[
    Entry { name: "print", ty: Ty::Fn(NIL), url: "functions.html#print" },
    Entry { name: "len", ty: Ty::Fn(INT), url: "functions.html#len" },
    Entry { name: "range", ty: Ty::FnListOf(INT), url: "functions.html#func-range" },
    Entry { name: "abs", ty: Ty::Fn(INT), url: "functions.html#abs" },
    Entry { name: "str", ty: Ty::Fn(STR), url: "functions.html#func-str" },
    Entry { name: "repr", ty: Ty::Fn(STR), url: "functions.html#repr" },
    Entry { name: "int", ty: Ty::Fn(INT), url: "functions.html#int" },
    Entry { name: "float", ty: Ty::Fn(FLOAT), url: "functions.html#float" },
    Entry { name: "bool", ty: Ty::Fn(BOOL), url: "functions.html#bool" },
    Entry { name: "isinstance", ty: Ty::Fn(BOOL), url: "functions.html#isinstance" },
    Entry { name: "open", ty: Ty::Fn(UNKNOWN), url: "functions.html#open" },
];

const EXCEPTIONS: &[(&str, &str)] = &[
    ("Exception", "exceptions.html#Exception"),
    ("IOError", "exceptions.html#IOError"),
    ("ValueError", "exceptions.html#ValueError"),
    ("TypeError", "exceptions.html#TypeError"),
    ("KeyError", "exceptions.html#KeyError"),
    ("IndexError", "exceptions.html#IndexError"),
    ("StopIteration", "exceptions.html#StopIteration"),
];

struct ModuleSpec {
    name: &'static str,
    url: &'static str,
    attrs: &'static [Entry],
}

const MODULES: &[ModuleSpec] = &[
    ModuleSpec {
        name: "sys",
        url: "sys.html",
        attrs: &[
            Entry { name: "argv", ty: Ty::ListOf(STR), url: "sys.html#sys.argv" },
            Entry { name: "path", ty: Ty::ListOf(STR), url: "sys.html#sys.path" },
            Entry { name: "platform", ty: Ty::Const(STR), url: "sys.html#sys.platform" },
            Entry { name: "maxsize", ty: Ty::Const(INT), url: "sys.html#sys.maxsize" },
        ],
    },
    ModuleSpec {
        name: "os",
        url: "os.html",
        attrs: &[
            Entry { name: "sep", ty: Ty::Const(STR), url: "os.html#os.sep" },
            Entry { name: "name", ty: Ty::Const(STR), url: "os.html#os.name" },
            Entry { name: "getcwd", ty: Ty::Fn(STR), url: "os.html#os.getcwd" },
        ],
    },
    ModuleSpec {
        name: "math",
        url: "math.html",
        attrs: &[
            Entry { name: "pi", ty: Ty::Const(FLOAT), url: "math.html#math.pi" },
            Entry { name: "e", ty: Ty::Const(FLOAT), url: "math.html#math.e" },
            Entry { name: "sqrt", ty: Ty::Fn(FLOAT), url: "math.html#math.sqrt" },
            Entry { name: "floor", ty: Ty::Fn(INT), url: "math.html#math.floor" },
            Entry { name: "ceil", ty: Ty::Fn(INT), url: "math.html#math.ceil" },
        ],
    },
];

/// Seed the analyzer's global scope. Called once from `Analyzer::new`.
pub fn register(az: &mut Analyzer) {
    // One defining URL node per binding, in registration order.
    let mut urls: Vec<String> = Vec::new();
    for e in CONSTANTS.iter().chain(FUNCTIONS.iter()) {
        urls.push(format!("{DOCS}/{}", e.url));
    }
    for (_, url) in EXCEPTIONS {
        urls.push(format!("{DOCS}/{url}"));
    }
    for m in MODULES {
        urls.push(format!("{DOCS}/{}", m.url));
        for e in m.attrs {
            urls.push(format!("{DOCS}/{}", e.url));
        }
    }
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let (ast, nodes) = synthetic_module(&url_refs);
    let file = az.add_synthetic_file("<builtins>", ast);

    let mut next = nodes.into_iter();
    let globaltable = az.globaltable;

    for e in CONSTANTS {
        let node = next.next().expect("one node per builtin");
        define(az, file, node, globaltable, e, BindingKind::Scope);
    }
    for e in FUNCTIONS {
        let node = next.next().expect("one node per builtin");
        define(az, file, node, globaltable, e, BindingKind::Function);
    }

    // Exception classes: all siblings of a root Exception class.
    let mut root_exc = None;
    for (name, url) in EXCEPTIONS {
        let node = next.next().expect("one node per builtin");
        let table = az.states.add(Some(globaltable), StateKind::Class);
        az.states.set_path(table, *name);
        let cls = az.types.add(TypeKind::Class(ClassData {
            name: name.to_string(),
            def: None,
            table,
            bases: root_exc.into_iter().collect(),
        }));
        if root_exc.is_none() {
            root_exc = Some(cls);
        }
        let bid = az.insert(
            globaltable,
            name,
            NodeRef { file, node },
            cls,
            BindingKind::Class,
        );
        mark(az, bid, url);
    }

    for m in MODULES {
        let node = next.next().expect("one node per builtin");
        let table = az.states.add(Some(globaltable), StateKind::Module);
        az.states.set_path(table, m.name);
        let mt = az.types.add(TypeKind::Module(ModuleData {
            name: m.name.to_string(),
            file: String::new(),
            table,
        }));
        let bid = az.insert(
            globaltable,
            m.name,
            NodeRef { file, node },
            mt,
            BindingKind::Module,
        );
        mark(az, bid, m.url);

        for e in m.attrs {
            let node = next.next().expect("one node per builtin");
            let kind = match e.ty {
                Ty::Fn(_) | Ty::FnListOf(_) => BindingKind::Function,
                _ => BindingKind::Attribute,
            };
            define(az, file, node, table, e, kind);
        }
    }
}

fn define(
    az: &mut Analyzer,
    file: FileId,
    node: NodeId,
    state: crate::state::StateId,
    entry: &Entry,
    kind: BindingKind,
) {
    let ty = match entry.ty {
        Ty::Const(t) => t,
        Ty::ListOf(elt) => az.types.list_of(elt),
        Ty::Fn(ret) => builtin_fn(az, ret),
        Ty::FnListOf(elt) => {
            let ret = az.types.list_of(elt);
            builtin_fn(az, ret)
        }
    };
    let bid = az.insert(state, entry.name, NodeRef { file, node }, ty, kind);
    mark(az, bid, entry.url);
}

fn builtin_fn(az: &mut Analyzer, ret: TypeId) -> TypeId {
    let env = az.globaltable;
    az.types.add(TypeKind::Function(FunData {
        def: None,
        env,
        def_state: env,
        defaults: Vec::new(),
        ret,
        cache: Vec::new(),
    }))
}

fn mark(az: &mut Analyzer, bid: BindingId, url: &str) {
    let full = format!("{DOCS}/{url}");
    az.mark_builtin(bid, Some(&full));
}

#[cfg(test)]
mod tests {
    use crate::analyzer::{Analyzer, AnalyzerOptions};

    #[test]
    fn constants_and_functions_are_seeded() {
        let az = Analyzer::new(AnalyzerOptions::default());
        for name in ["True", "False", "None", "print", "len", "range"] {
            assert!(
                az.states.lookup(az.globaltable, name).is_some(),
                "missing builtin {name}"
            );
        }
    }

    #[test]
    fn builtin_bindings_carry_urls() {
        let az = Analyzer::new(AnalyzerOptions::default());
        let bids = az.states.lookup(az.globaltable, "len").unwrap();
        let b = az.binding(bids[0]);
        assert!(b.builtin);
        assert!(b.url.as_deref().unwrap().contains("docs.python.org"));
    }

    #[test]
    fn builtin_modules_expose_attributes() {
        let az = Analyzer::new(AnalyzerOptions::default());
        let bids = az.states.lookup(az.globaltable, "math").unwrap();
        let module = az.binding(bids[0]).ty;
        let table = az.types.table_of(module).unwrap();
        assert!(az.states.lookup_attr(table, "sqrt").is_some());
        assert!(az.states.lookup_attr(table, "pi").is_some());
    }
}
