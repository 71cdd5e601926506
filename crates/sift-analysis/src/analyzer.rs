//! The analyzer: file discovery, module loading, registries, and the query
//! surface consumed by downstream tooling.
//!
//! One `Analyzer` is one whole-program analysis. It owns every arena (AST
//! files, types, scopes, bindings), the call stack used for cycle breaking,
//! the uncalled-function set, the problems map, and the reference index.
//! Nothing here is a process-wide singleton; tests build as many fresh
//! analyzers as they like.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use sift_common::Span;
use sift_parser::ast::AstBuilder;
use sift_parser::{ModuleAst, NodeKind};
use tracing::{debug, info};

use crate::binding::{Binding, BindingId, BindingKind, Ref};
use crate::builtins;
use crate::cache::AstCache;
use crate::diagnostics::Diagnostic;
use crate::state::{StateId, StateKind, StatePool};
use crate::transform;
use crate::ty::{ModuleData, TypeId, TypeKind, TypePool, UNKNOWN};
use crate::{FileId, NodeRef};

/// Source-file extension the discovery walk accepts.
const SOURCE_EXTENSION: &str = "py";

/// Configuration threaded in at construction.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Directory for the serialized AST cache; `None` disables the disk
    /// layer.
    pub cache_dir: Option<PathBuf>,
    pub quiet: bool,
    /// Debug rendering: integer bounds in type strings, extra logging.
    pub debug: bool,
}

/// A loaded source file and its sealed tree.
pub struct LoadedFile {
    pub path: String,
    pub ast: Rc<ModuleAst>,
}

pub struct Analyzer {
    pub types: TypePool,
    pub states: StatePool,
    bindings: Vec<Binding>,
    files: Vec<LoadedFile>,
    file_ids: FxHashMap<String, FileId>,
    /// Root scope holding builtins and loaded modules.
    pub globaltable: StateId,
    /// File path to module type.
    modules: FxHashMap<String, TypeId>,
    /// Paths currently mid-load; guards import re-entrancy.
    loading: FxHashSet<String>,
    /// Call nodes currently being applied; the cycle guard.
    call_stack: Vec<NodeRef>,
    /// Functions defined but not yet invoked.
    uncalled: FxHashSet<TypeId>,
    pub n_called: u64,
    problems: FxHashMap<NodeRef, Vec<Diagnostic>>,
    file_problems: FxHashMap<String, Vec<Diagnostic>>,
    references: FxHashMap<Ref, Vec<BindingId>>,
    cache: AstCache,
    options: AnalyzerOptions,
    /// Directory imports are resolved against.
    root: Option<PathBuf>,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        let mut states = StatePool::new();
        let globaltable = states.add(None, StateKind::Global);
        let cache = AstCache::new(options.cache_dir.clone());
        let mut analyzer = Analyzer {
            types: TypePool::new(),
            states,
            bindings: Vec::new(),
            files: Vec::new(),
            file_ids: FxHashMap::default(),
            globaltable,
            modules: FxHashMap::default(),
            loading: FxHashSet::default(),
            call_stack: Vec::new(),
            uncalled: FxHashSet::default(),
            n_called: 0,
            problems: FxHashMap::default(),
            file_problems: FxHashMap::default(),
            references: FxHashMap::default(),
            cache,
            options,
            root: None,
        };
        builtins::register(&mut analyzer);
        analyzer
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    // ── Driving ────────────────────────────────────────────────────────

    /// Analyze every source file under `path` (or the single file itself).
    /// Per-file parse failures become problems, never errors.
    pub fn analyze(&mut self, path: &Path) -> std::io::Result<()> {
        self.root = Some(if path.is_file() {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            path.to_path_buf()
        });
        if path.is_file() {
            self.load_file(path);
            return Ok(());
        }
        let files = discover_source_files(path)?;
        info!(count = files.len(), "discovered source files");
        for file in &files {
            self.load_file(file);
        }
        Ok(())
    }

    /// Load (or return the already-loaded) module for one file.
    pub fn load_file(&mut self, path: &Path) -> Option<TypeId> {
        let key = canonical_key(path);
        if let Some(mt) = self.modules.get(&key) {
            return Some(*mt);
        }
        if self.loading.contains(&key) {
            return None;
        }
        self.loading.insert(key.clone());
        let loaded = self.load_file_inner(&key);
        self.loading.remove(&key);
        loaded
    }

    fn load_file_inner(&mut self, key: &str) -> Option<TypeId> {
        let ast = match self.cache.get(key) {
            Ok(ast) => ast,
            Err(Some(err)) => {
                self.put_file_problem(key, err.span, format!("parse failure: {err}"));
                return None;
            }
            Err(None) => return None,
        };
        debug!(file = key, "transforming module");

        let file_id = FileId(self.files.len() as u32);
        self.files.push(LoadedFile {
            path: key.to_string(),
            ast: ast.clone(),
        });
        self.file_ids.insert(key.to_string(), file_id);

        let module_name = module_name_of(key);
        let module_state = self.states.add(Some(self.globaltable), StateKind::Module);
        self.states.set_path(module_state, module_name.clone());
        let module_type = self.types.add(TypeKind::Module(ModuleData {
            name: module_name.clone(),
            file: key.to_string(),
            table: module_state,
        }));
        self.modules.insert(key.to_string(), module_type);
        self.insert(
            self.globaltable,
            &module_name,
            NodeRef {
                file: file_id,
                node: ast.root(),
            },
            module_type,
            BindingKind::Module,
        );

        if let NodeKind::Module { body } = ast.kind(ast.root()) {
            transform::transform(self, file_id, *body, module_state);
        }
        Some(module_type)
    }

    /// Resolve `import name` from a file: a builtin module wins, then a
    /// sibling of the importing file, then the analysis root.
    pub fn resolve_import(&mut self, from: FileId, name: &str) -> Option<TypeId> {
        if let Some(bids) = self.states.lookup_attr(self.globaltable, name) {
            let ty = self.bindings[bids[0].0 as usize].ty;
            if matches!(self.types.kind(ty), TypeKind::Module(_)) {
                return Some(ty);
            }
        }
        let mut candidates = Vec::new();
        if let Some(dir) = Path::new(self.file_path(from)).parent() {
            candidates.push(dir.join(format!("{name}.{SOURCE_EXTENSION}")));
        }
        if let Some(root) = self.root.clone() {
            candidates.push(root.join(format!("{name}.{SOURCE_EXTENSION}")));
        }
        for candidate in candidates {
            if candidate.is_file() {
                return self.load_file(&candidate);
            }
        }
        None
    }

    /// Post-pass: apply every function that was never called with unknown
    /// arguments (recovering definitions only reached through indirect
    /// dispatch), then build the reference index by inverting every
    /// binding's ref set.
    pub fn finish(&mut self) {
        info!(uncalled = self.uncalled.len(), "applying uncalled functions");
        while !self.uncalled.is_empty() {
            let batch: Vec<TypeId> = self.uncalled.iter().copied().collect();
            for fun in batch {
                transform::apply(
                    self,
                    fun,
                    None,
                    &[],
                    FxHashMap::default(),
                    None,
                    None,
                    None,
                    None,
                );
            }
        }

        self.references.clear();
        for (i, binding) in self.bindings.iter().enumerate() {
            for r in &binding.refs {
                self.references
                    .entry(*r)
                    .or_default()
                    .push(BindingId(i as u32));
            }
        }
        for list in self.references.values_mut() {
            list.sort();
            list.dedup();
        }
        info!(
            files = self.files.len(),
            bindings = self.bindings.len(),
            references = self.references.len(),
            "analysis finished"
        );
    }

    /// Release the cache, clearing its disk directory.
    pub fn close(&mut self) {
        self.cache.close();
    }

    // ── Bindings ───────────────────────────────────────────────────────

    /// Create-or-refine a binding for `name` in `state`.
    ///
    /// An existing binding at this exact scope absorbs the new type by
    /// union and gains the defining node as a reference. A `global`
    /// declaration redirects the insert to the enclosing module scope.
    /// Function bindings landing in a class scope become methods (or the
    /// constructor).
    pub fn insert(
        &mut self,
        state: StateId,
        name: &str,
        node: NodeRef,
        ty: TypeId,
        kind: BindingKind,
    ) -> BindingId {
        let target = if self.states.get(state).global_names.contains(name) {
            self.states.enclosing_module(state).unwrap_or(state)
        } else {
            state
        };

        let kind = match (kind, self.states.get(target).kind) {
            (BindingKind::Function, StateKind::Class) => {
                if name == "__init__" || name == "initialize" {
                    BindingKind::Constructor
                } else {
                    BindingKind::Method
                }
            }
            (k, _) => k,
        };

        if let Some(existing) = self.states.lookup_attr(target, name) {
            let bid = existing[0];
            let old = self.bindings[bid.0 as usize].ty;
            let refined = self.types.union(old, ty);
            let span = self.node_span(node);
            let binding = &mut self.bindings[bid.0 as usize];
            binding.ty = refined;
            binding.add_ref(Ref::new(node, span));
            return bid;
        }

        let qname = match self.types.kind(ty) {
            TypeKind::Module(m) => m.name.clone(),
            _ => self.states.extend_path(target, name),
        };
        let span = self.node_span(node);
        let file = self.file_path(node.file).to_string();
        let bid = BindingId(self.bindings.len() as u32);
        self.bindings
            .push(Binding::new(name, node, qname, kind, file, span, ty));
        self.states.update(target, name, vec![bid]);
        bid
    }

    /// Shadow `name` in exactly `state` with a narrowed copy of its current
    /// primary binding. Comparison refinement uses this so the original
    /// binding keeps its unrefined type.
    pub fn narrow(&mut self, state: StateId, name: &str, ty: TypeId) {
        let Some(bids) = self.states.lookup(state, name) else {
            return;
        };
        let mut shadow = self.bindings[bids[0].0 as usize].clone();
        shadow.ty = ty;
        shadow.refs = FxHashSet::default();
        let bid = BindingId(self.bindings.len() as u32);
        self.bindings.push(shadow);
        self.states.update(state, name, vec![bid]);
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0 as usize]
    }

    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.0 as usize]
    }

    /// Mark the most recent binding for a builtin, attaching its docs URL.
    pub fn mark_builtin(&mut self, id: BindingId, url: Option<&str>) {
        let b = &mut self.bindings[id.0 as usize];
        b.builtin = true;
        b.url = url.map(str::to_string);
    }

    /// Record one use of every binding in `bids` at `node`.
    pub fn put_ref(&mut self, node: NodeRef, bids: &[BindingId]) {
        let span = self.node_span(node);
        let r = Ref::new(node, span);
        for bid in bids {
            self.bindings[bid.0 as usize].add_ref(r);
        }
    }

    /// Union of the types of a binding list; what a name lookup evaluates
    /// to.
    pub fn union_of_bindings(&mut self, bids: &[BindingId]) -> TypeId {
        let mut result = UNKNOWN;
        for bid in bids {
            let ty = self.bindings[bid.0 as usize].ty;
            result = self.types.union(result, ty);
        }
        result
    }

    // ── Call stack, uncalled set ───────────────────────────────────────

    pub fn in_stack(&self, call: NodeRef) -> bool {
        self.call_stack.contains(&call)
    }

    pub fn push_call(&mut self, call: NodeRef) {
        self.call_stack.push(call);
    }

    pub fn pop_call(&mut self, call: NodeRef) {
        if let Some(pos) = self.call_stack.iter().rposition(|c| *c == call) {
            self.call_stack.remove(pos);
        }
    }

    pub fn add_uncalled(&mut self, fun: TypeId) {
        self.uncalled.insert(fun);
    }

    pub fn remove_uncalled(&mut self, fun: TypeId) {
        self.uncalled.remove(&fun);
    }

    // ── Problems ───────────────────────────────────────────────────────

    pub fn put_problem(&mut self, node: NodeRef, message: impl Into<String>) {
        let span = self.node_span(node);
        let file = self.file_path(node.file).to_string();
        self.problems
            .entry(node)
            .or_default()
            .push(Diagnostic::new(file, span, message));
    }

    pub fn put_file_problem(&mut self, file: &str, span: Span, message: impl Into<String>) {
        self.file_problems
            .entry(file.to_string())
            .or_default()
            .push(Diagnostic::new(file, span, message));
    }

    // ── Query surface ──────────────────────────────────────────────────

    pub fn get_ast_for_file(&self, path: &Path) -> Option<Rc<ModuleAst>> {
        let key = canonical_key(path);
        let id = self.file_ids.get(&key)?;
        Some(self.files[id.0 as usize].ast.clone())
    }

    pub fn get_all_bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn get_references(&self) -> &FxHashMap<Ref, Vec<BindingId>> {
        &self.references
    }

    pub fn get_problems(&self) -> &FxHashMap<NodeRef, Vec<Diagnostic>> {
        &self.problems
    }

    pub fn get_file_problems(&self) -> &FxHashMap<String, Vec<Diagnostic>> {
        &self.file_problems
    }

    /// Every diagnostic, ordered by file then offset. The CLI report.
    pub fn all_problems(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self
            .problems
            .values()
            .chain(self.file_problems.values())
            .flatten()
            .collect();
        all.sort_by(|a, b| {
            (a.file.as_str(), a.span.start, a.message.as_str())
                .cmp(&(b.file.as_str(), b.span.start, b.message.as_str()))
        });
        all
    }

    pub fn loaded_files(&self) -> &[LoadedFile] {
        &self.files
    }

    pub fn module_type(&self, path: &Path) -> Option<TypeId> {
        self.modules.get(&canonical_key(path)).copied()
    }

    // ── Node access for the transform pass ─────────────────────────────

    pub fn ast(&self, file: FileId) -> &Rc<ModuleAst> {
        &self.files[file.0 as usize].ast
    }

    pub fn file_path(&self, file: FileId) -> &str {
        &self.files[file.0 as usize].path
    }

    pub fn node_span(&self, node: NodeRef) -> Span {
        self.files[node.file.0 as usize].ast.span(node.node)
    }

    /// Register a synthesized module (the builtins table) so its nodes have
    /// a file identity like any other.
    pub fn add_synthetic_file(&mut self, path: &str, ast: ModuleAst) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(LoadedFile {
            path: path.to_string(),
            ast: Rc::new(ast),
        });
        self.file_ids.insert(path.to_string(), id);
        id
    }
}

/// Stable map key for a path: canonical where the filesystem cooperates.
fn canonical_key(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Module name of a file: the stem, `util` for `a/util.py`.
pub fn module_name_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string())
}

/// Recursively collect source files under `root`, sorted for determinism.
/// Hidden entries (leading `.`) are skipped.
pub fn discover_source_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    discover_recursive(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn discover_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            discover_recursive(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// Build the tiny synthesized tree builtins hang their bindings on: one
/// module whose extra nodes are documentation URLs.
pub(crate) fn synthetic_module(urls: &[&str]) -> (ModuleAst, Vec<sift_parser::NodeId>) {
    let mut builder = AstBuilder::new();
    let mut nodes = Vec::new();
    for url in urls {
        nodes.push(builder.add(
            NodeKind::Url {
                url: (*url).to_string(),
            },
            Span::new(0, 0),
        ));
    }
    let body = builder.add(NodeKind::Block { stmts: vec![] }, Span::new(0, 0));
    let root = builder.add(NodeKind::Module { body }, Span::new(0, 0));
    let mut ast = builder.finish(root);
    ast.set_file("<builtins>", "");
    (ast, nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn discovery_is_sorted_and_skips_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        for (name, content) in [
            ("zeta.py", ""),
            ("pkg/alpha.py", ""),
            (".hidden/secret.py", ""),
            ("notes.txt", ""),
        ] {
            let mut f = fs::File::create(root.join(name)).unwrap();
            f.write_all(content.as_bytes()).unwrap();
        }
        let files = discover_source_files(root).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["pkg/alpha.py", "zeta.py"]);
    }

    #[test]
    fn module_names() {
        assert_eq!(module_name_of("a/util.py"), "util");
        assert_eq!(module_name_of("m.py"), "m");
    }

    #[test]
    fn fresh_analyzers_are_independent() {
        let a = Analyzer::new(AnalyzerOptions::default());
        let b = Analyzer::new(AnalyzerOptions::default());
        // Builtins are seeded per analyzer, not shared statics.
        assert_eq!(a.get_all_bindings().len(), b.get_all_bindings().len());
        assert!(!a.get_all_bindings().is_empty());
    }
}
