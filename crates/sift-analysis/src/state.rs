//! Lexical scopes.
//!
//! Scopes form a parent chain and live in a [`StatePool`] arena so that
//! functions can capture environments, branches can snapshot and merge
//! tables, and nothing owns anything cyclically. A scope's `path` is the
//! dotted qualified-name prefix for every binding created in it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::binding::BindingId;

/// Handle to a scope in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Module,
    Class,
    Function,
    Instance,
    Scope,
    Global,
}

#[derive(Debug, Clone)]
pub struct StateData {
    pub parent: Option<StateId>,
    pub kind: StateKind,
    /// Name to binding list. Multiple bindings per name appear after a
    /// branch merge.
    pub table: FxHashMap<String, Vec<BindingId>>,
    /// Dotted qualified-name prefix, e.g. `"util.Parser"`.
    pub path: String,
    /// Names declared `global` in this scope; inserts are redirected to the
    /// enclosing module table.
    pub global_names: FxHashSet<String>,
    /// Scope that attribute-free name lookups should continue from instead
    /// of this one. Set on class scopes: names in a class body are not in
    /// scope inside its methods.
    pub forwarding: Option<StateId>,
}

pub struct StatePool {
    states: Vec<StateData>,
}

impl Default for StatePool {
    fn default() -> Self {
        Self::new()
    }
}

impl StatePool {
    pub fn new() -> Self {
        StatePool { states: Vec::new() }
    }

    pub fn add(&mut self, parent: Option<StateId>, kind: StateKind) -> StateId {
        let path = parent.map(|p| self.get(p).path.clone()).unwrap_or_default();
        let id = StateId(self.states.len() as u32);
        self.states.push(StateData {
            parent,
            kind,
            table: FxHashMap::default(),
            path,
            global_names: FxHashSet::default(),
            forwarding: None,
        });
        id
    }

    pub fn get(&self, id: StateId) -> &StateData {
        &self.states[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: StateId) -> &mut StateData {
        &mut self.states[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Shallow snapshot for branch-flow analysis: same parent, same path,
    /// cloned table. Binding ids are shared, the list structure is not.
    pub fn copy(&mut self, id: StateId) -> StateId {
        let data = self.get(id).clone();
        let new_id = StateId(self.states.len() as u32);
        self.states.push(data);
        new_id
    }

    /// A new scope whose table is the per-key union of both branch tables.
    pub fn merge(&mut self, a: StateId, b: StateId) -> StateId {
        let merged_id = self.copy(a);
        let b_table = self.get(b).table.clone();
        let merged = self.get_mut(merged_id);
        for (name, bids) in b_table {
            let list = merged.table.entry(name).or_default();
            for bid in bids {
                if !list.contains(&bid) {
                    list.push(bid);
                }
            }
        }
        merged_id
    }

    /// Replace `dst`'s table with `src`'s. The downstream-state decision in
    /// `if` lands here.
    pub fn overwrite(&mut self, dst: StateId, src: StateId) {
        let table = self.get(src).table.clone();
        self.get_mut(dst).table = table;
    }

    /// Walk the parent chain; the innermost scope that declares `name`
    /// wins. A `global` declaration redirects straight to the module table.
    pub fn lookup(&self, id: StateId, name: &str) -> Option<Vec<BindingId>> {
        let data = self.get(id);
        if data.global_names.contains(name) {
            if let Some(module) = self.enclosing_module(id) {
                if let Some(bids) = self.get(module).table.get(name) {
                    return Some(bids.clone());
                }
            }
        }
        if let Some(bids) = data.table.get(name) {
            return Some(bids.clone());
        }
        data.parent.and_then(|p| self.lookup(p, name))
    }

    /// Single-level lookup; attribute resolution never walks parents.
    pub fn lookup_attr(&self, id: StateId, name: &str) -> Option<Vec<BindingId>> {
        self.get(id).table.get(name).cloned()
    }

    /// Whether this scope itself declares `name`.
    pub fn declares(&self, id: StateId, name: &str) -> bool {
        self.get(id).table.contains_key(name)
    }

    /// Nearest enclosing scope of module kind, including `id` itself.
    pub fn enclosing_module(&self, id: StateId) -> Option<StateId> {
        let mut cur = Some(id);
        while let Some(s) = cur {
            if self.get(s).kind == StateKind::Module {
                return Some(s);
            }
            cur = self.get(s).parent;
        }
        None
    }

    /// `path + "." + segment`, or the bare segment at an empty path.
    pub fn extend_path(&self, id: StateId, segment: &str) -> String {
        let path = &self.get(id).path;
        if path.is_empty() {
            segment.to_string()
        } else {
            format!("{path}.{segment}")
        }
    }

    pub fn set_path(&mut self, id: StateId, path: impl Into<String>) {
        self.get_mut(id).path = path.into();
    }

    /// The scope name lookups should continue from; class scopes forward
    /// past themselves.
    pub fn forwarding_or_self(&self, id: StateId) -> StateId {
        self.get(id).forwarding.unwrap_or(id)
    }

    pub fn add_global_name(&mut self, id: StateId, name: impl Into<String>) {
        self.get_mut(id).global_names.insert(name.into());
    }

    /// Replace the binding list for `name` in exactly this scope. Used by
    /// comparison refinement, which shadows with a narrowed binding rather
    /// than refining the original.
    pub fn update(&mut self, id: StateId, name: impl Into<String>, bindings: Vec<BindingId>) {
        self.get_mut(id).table.insert(name.into(), bindings);
    }
}
