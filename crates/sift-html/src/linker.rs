//! Cross-reference linking: turns bindings into anchors and references
//! into hyperlinks, grouped per file.

use std::path::{Component, Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use sift_analysis::{Analyzer, Binding, BindingId, BindingKind, Ref};
use tracing::debug;

use crate::style::{StyleKind, StyleRun};

pub struct Linker {
    root: PathBuf,
    file_styles: FxHashMap<String, Vec<StyleRun>>,
    // Prevent duplicate anchors and links per location.
    seen_def: FxHashSet<(String, u32, u32)>,
    seen_ref: FxHashSet<(String, u32, u32)>,
}

impl Linker {
    pub fn new(root: &Path) -> Self {
        Linker {
            root: root.to_path_buf(),
            file_styles: FxHashMap::default(),
            seen_def: FxHashSet::default(),
            seen_ref: FxHashSet::default(),
        }
    }

    /// Collect anchors for every definition and links for every reference.
    pub fn find_links(&mut self, az: &Analyzer) {
        debug!(
            bindings = az.get_all_bindings().len(),
            references = az.get_references().len(),
            "linking"
        );
        for binding in az.get_all_bindings() {
            self.add_semantic_styles(binding);
            self.process_def(az, binding);
        }
        for (r, bindings) in az.get_references() {
            self.process_ref(az, *r, bindings);
        }
    }

    /// Styles and links collected for one file.
    pub fn styles_for(&self, path: &str) -> &[StyleRun] {
        self.file_styles.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn add_style(&mut self, path: &str, style: StyleRun) {
        self.file_styles
            .entry(path.to_string())
            .or_default()
            .push(style);
    }

    /// Highlighting that needs the symbol table: constants, parameters,
    /// type names.
    fn add_semantic_styles(&mut self, binding: &Binding) {
        if binding.builtin || binding.span.is_empty() {
            return;
        }
        let is_const = is_constant_name(&binding.name);
        let kind = match binding.kind {
            BindingKind::Scope if is_const => Some(StyleKind::Constant),
            BindingKind::Variable => Some(if is_const {
                StyleKind::Constant
            } else {
                StyleKind::Identifier
            }),
            BindingKind::Parameter => Some(StyleKind::Parameter),
            BindingKind::Class => Some(StyleKind::TypeName),
            _ => None,
        };
        if let Some(kind) = kind {
            let file = binding.file.clone();
            self.add_style(
                &file,
                StyleRun::new(kind, binding.span.start, binding.span.len()),
            );
        }
    }

    fn process_def(&mut self, az: &Analyzer, binding: &Binding) {
        // Module bindings span the whole file; they are link targets, not
        // anchors of their own.
        if binding.builtin || binding.span.is_empty() || binding.kind == BindingKind::Module {
            return;
        }
        let key = (
            binding.file.clone(),
            binding.span.start,
            binding.span.len(),
        );
        if !self.seen_def.insert(key) {
            return;
        }
        let mut style = StyleRun::new(
            StyleKind::Anchor,
            binding.span.start,
            binding.span.len(),
        );
        style.message = Some(az.types.render(binding.ty, false));
        style.id = Some(binding.qname.clone());
        style.url = Some(binding.qname.clone());
        style.highlight = binding.refs.iter().map(ref_id).collect();
        let file = binding.file.clone();
        self.add_style(&file, style);
    }

    fn process_ref(&mut self, az: &Analyzer, r: Ref, bindings: &[BindingId]) {
        let path = az.file_path(r.file()).to_string();
        if !Path::new(&path).exists() {
            return;
        }
        let key = (path.clone(), r.span.start, r.span.len());
        if !self.seen_ref.insert(key) {
            return;
        }

        let mut link = StyleRun::new(StyleKind::Link, r.span.start, r.span.len());
        link.id = Some(ref_id(&r));
        let typings: Vec<String> = bindings
            .iter()
            .map(|b| az.types.render(az.binding(*b).ty, false))
            .collect();
        link.message = Some(format!("{{{}}}", typings.join(" | ")));
        link.highlight = bindings
            .iter()
            .map(|b| az.binding(*b).qname.clone())
            .collect();

        // Jump to the first binding that yields a target.
        for b in bindings {
            if let Some(url) = self.to_url(az, az.binding(*b), &path) {
                link.url = Some(url);
                self.add_style(&path, link);
                return;
            }
        }
    }

    /// Where a reference to `binding` should jump from `from` -- a plain
    /// anchor on the same page, a relative page for a sibling source, an
    /// external docs URL for builtins.
    fn to_url(&self, az: &Analyzer, binding: &Binding, from: &str) -> Option<String> {
        if binding.builtin {
            return binding.url.clone();
        }
        let dest = match az.types.kind(binding.ty) {
            sift_analysis::ty::TypeKind::Module(m) if !m.file.is_empty() => m.file.clone(),
            _ => binding.file.clone(),
        };
        if dest.is_empty() {
            return None;
        }
        let anchor = format!("#{}", binding.qname);
        if dest == from {
            return Some(anchor);
        }
        if Path::new(&dest).starts_with(&self.root) {
            let rel = rel_path(Path::new(from), Path::new(&dest))?;
            return Some(format!("{}.html{anchor}", rel.to_string_lossy()));
        }
        Some(format!("file://{dest}{anchor}"))
    }
}

/// Stable per-page id for a reference location.
fn ref_id(r: &Ref) -> String {
    format!("ref-{}-{}", r.span.start, r.span.len())
}

/// `[A-Z_][A-Z0-9_]*` without pulling in a regex engine.
fn is_constant_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Relative path from the directory of `from` to `to`.
fn rel_path(from: &Path, to: &Path) -> Option<PathBuf> {
    let from_dir = from.parent()?;
    let from_parts: Vec<Component> = from_dir.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part);
    }
    Some(rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_names() {
        assert!(is_constant_name("MAX_SIZE"));
        assert!(is_constant_name("_PRIVATE"));
        assert!(!is_constant_name("maxSize"));
        assert!(!is_constant_name("Max"));
        assert!(!is_constant_name(""));
    }

    #[test]
    fn relative_paths() {
        let rel = rel_path(Path::new("/r/a/main.py"), Path::new("/r/b/util.py")).unwrap();
        assert_eq!(rel, PathBuf::from("../b/util.py"));
        let same = rel_path(Path::new("/r/main.py"), Path::new("/r/util.py")).unwrap();
        assert_eq!(same, PathBuf::from("util.py"));
    }
}
