//! The type lattice.
//!
//! Types live in a [`TypePool`] arena and are passed around as [`TypeId`]
//! handles, which is what lets functions, classes, and instances reference
//! scopes (and through them other types) without ownership cycles. A handful
//! of singletons are seeded at fixed ids when the pool is built.
//!
//! Two joins exist, matching how results flow:
//!
//! - [`TypePool::union`] is the lattice join of values: Unknown is the
//!   identity, equal types collapse, everything else becomes a flat,
//!   deduplicated union.
//! - [`TypePool::join_all`] is the raw control-flow join used by `try` and
//!   conditional expressions: it flattens and deduplicates but keeps
//!   Unknown as a visible member, so a recursion broken by the cycle guard
//!   shows up in the result as `{int | ?}` rather than silently vanishing.

use crate::state::StateId;
use crate::NodeRef;

/// Handle to a type in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// The unknown/bottom-ish type. Every failure substitutes this.
pub const UNKNOWN: TypeId = TypeId(0);
/// "Control continues, no value": the type of ordinary statements.
pub const CONT: TypeId = TypeId(1);
/// The None-ish value.
pub const NIL: TypeId = TypeId(2);
pub const TRUE: TypeId = TypeId(3);
pub const FALSE: TypeId = TypeId(4);
/// A boolean of unknown truth with no refinement states attached.
pub const BOOL: TypeId = TypeId(5);
/// The general string.
pub const STR: TypeId = TypeId(6);
/// The unbounded integer.
pub const INT: TypeId = TypeId(7);
pub const FLOAT: TypeId = TypeId(8);

const RENDER_DEPTH_LIMIT: usize = 6;

/// A bounded-interval integer. Sides without their flag set are unbounded
/// and their stored endpoint is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub lower: i64,
    pub upper: i64,
    pub lower_bounded: bool,
    pub upper_bounded: bool,
}

impl IntRange {
    pub fn value(v: i64) -> Self {
        IntRange {
            lower: v,
            upper: v,
            lower_bounded: true,
            upper_bounded: true,
        }
    }

    pub fn unbounded() -> Self {
        IntRange {
            lower: 0,
            upper: 0,
            lower_bounded: false,
            upper_bounded: false,
        }
    }

    pub fn bounded(lower: i64, upper: i64) -> Self {
        IntRange {
            lower,
            upper,
            lower_bounded: true,
            upper_bounded: true,
        }
    }

    pub fn at_least(lower: i64) -> Self {
        IntRange {
            lower,
            upper: 0,
            lower_bounded: true,
            upper_bounded: false,
        }
    }

    pub fn at_most(upper: i64) -> Self {
        IntRange {
            lower: 0,
            upper,
            lower_bounded: false,
            upper_bounded: true,
        }
    }

    /// A single known value.
    pub fn is_actual_value(&self) -> bool {
        self.lower_bounded && self.upper_bounded && self.lower == self.upper
    }

    /// Bounded both sides with a crossed interval means no value satisfies
    /// the range.
    pub fn is_feasible(&self) -> bool {
        !(self.lower_bounded && self.upper_bounded && self.lower > self.upper)
    }

    pub fn add(a: IntRange, b: IntRange) -> IntRange {
        IntRange {
            lower: a.lower.saturating_add(b.lower),
            upper: a.upper.saturating_add(b.upper),
            lower_bounded: a.lower_bounded && b.lower_bounded,
            upper_bounded: a.upper_bounded && b.upper_bounded,
        }
    }

    pub fn sub(a: IntRange, b: IntRange) -> IntRange {
        IntRange {
            lower: a.lower.saturating_sub(b.upper),
            upper: a.upper.saturating_sub(b.lower),
            lower_bounded: a.lower_bounded && b.upper_bounded,
            upper_bounded: a.upper_bounded && b.lower_bounded,
        }
    }

    pub fn mul(a: IntRange, b: IntRange) -> IntRange {
        IntRange {
            lower: a.lower.saturating_mul(b.lower),
            upper: a.upper.saturating_mul(b.upper),
            lower_bounded: a.lower_bounded && b.lower_bounded,
            upper_bounded: a.upper_bounded && b.upper_bounded,
        }
    }

    /// Interval division per the original rule: `a.lower/b.upper` and
    /// `a.upper/b.lower`. A divisor endpoint of zero escapes to the
    /// unbounded range; a crossed result is reported infeasible and callers
    /// fall back to the plain integer.
    pub fn div(a: IntRange, b: IntRange) -> IntRange {
        if b.upper == 0 || b.lower == 0 {
            return IntRange::unbounded();
        }
        IntRange {
            lower: a.lower.wrapping_div(b.upper),
            upper: a.upper.wrapping_div(b.lower),
            lower_bounded: a.lower_bounded && b.lower_bounded,
            upper_bounded: a.upper_bounded && b.upper_bounded,
        }
    }

    pub fn negate(&self) -> IntRange {
        IntRange {
            lower: self.upper.checked_neg().unwrap_or(i64::MAX),
            upper: self.lower.checked_neg().unwrap_or(i64::MAX),
            lower_bounded: self.upper_bounded,
            upper_bounded: self.lower_bounded,
        }
    }
}

/// Truth content of a boolean type.
///
/// `Undecided` may carry the two refinement environments produced by a
/// comparison: `s1` describes the world where the test held, `s2` where it
/// did not. `if` consumes them for branch-sensitive analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolValue {
    Concrete(bool),
    Undecided {
        s1: Option<StateId>,
        s2: Option<StateId>,
    },
}

/// A user function or builtin.
#[derive(Debug, Clone)]
pub struct FunData {
    /// The defining `Function` node. `None` marks a builtin, which answers
    /// calls with its declared return type and no body analysis.
    pub def: Option<NodeRef>,
    /// Captured lexical environment (class scopes already skipped).
    pub env: StateId,
    /// Scope the definition appeared in; its path prefixes the function's
    /// qualified name.
    pub def_state: StateId,
    /// Types of the default expressions, covering the last formals.
    pub defaults: Vec<TypeId>,
    /// Declared return type; only meaningful for builtins.
    pub ret: TypeId,
    /// Memoized applications: actual parameter tuple to result. Searched
    /// structurally, so the handles need not match.
    pub cache: Vec<(Vec<TypeId>, TypeId)>,
}

#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: String,
    pub def: Option<NodeRef>,
    /// The class scope holding methods and class attributes.
    pub table: StateId,
    pub bases: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub struct InstanceData {
    pub class: TypeId,
    /// The instance scope; `self.x = ...` inserts here.
    pub table: StateId,
    /// Creating call site; instance identity.
    pub call: Option<NodeRef>,
    /// Constructor argument types at the creating call.
    pub args: Vec<TypeId>,
}

#[derive(Debug, Clone)]
pub struct ModuleData {
    pub name: String,
    pub file: String,
    pub table: StateId,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Unknown,
    Cont,
    Nil,
    Bool(BoolValue),
    Int(IntRange),
    /// A string; a known literal value is kept when available.
    Str(Option<String>),
    Float,
    List {
        elt: TypeId,
    },
    Tuple {
        elts: Vec<TypeId>,
    },
    Dict {
        key: TypeId,
        value: TypeId,
    },
    Set {
        elt: TypeId,
    },
    /// Flat, deduplicated member list. Never nests another union.
    Union {
        members: Vec<TypeId>,
    },
    Function(FunData),
    Class(ClassData),
    Instance(InstanceData),
    Module(ModuleData),
    Symbol {
        name: String,
    },
    Url {
        url: String,
    },
}

/// Arena of all types created during one analysis.
pub struct TypePool {
    types: Vec<TypeKind>,
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TypePool {
    /// Build a pool with the singletons seeded at their fixed ids.
    pub fn new() -> Self {
        let types = vec![
            TypeKind::Unknown,
            TypeKind::Cont,
            TypeKind::Nil,
            TypeKind::Bool(BoolValue::Concrete(true)),
            TypeKind::Bool(BoolValue::Concrete(false)),
            TypeKind::Bool(BoolValue::Undecided { s1: None, s2: None }),
            TypeKind::Str(None),
            TypeKind::Int(IntRange::unbounded()),
            TypeKind::Float,
        ];
        TypePool { types }
    }

    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind);
        id
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize]
    }

    pub fn kind_mut(&mut self, id: TypeId) -> &mut TypeKind {
        &mut self.types[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ── Constructors ───────────────────────────────────────────────────

    pub fn int_value(&mut self, v: i64) -> TypeId {
        self.add(TypeKind::Int(IntRange::value(v)))
    }

    pub fn int_range(&mut self, range: IntRange) -> TypeId {
        self.add(TypeKind::Int(range))
    }

    pub fn str_literal(&mut self, value: impl Into<String>) -> TypeId {
        self.add(TypeKind::Str(Some(value.into())))
    }

    pub fn list_of(&mut self, elt: TypeId) -> TypeId {
        self.add(TypeKind::List { elt })
    }

    pub fn tuple_of(&mut self, elts: Vec<TypeId>) -> TypeId {
        self.add(TypeKind::Tuple { elts })
    }

    pub fn dict_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.add(TypeKind::Dict { key, value })
    }

    pub fn set_of(&mut self, elt: TypeId) -> TypeId {
        self.add(TypeKind::Set { elt })
    }

    pub fn undecided_bool(&mut self, s1: StateId, s2: StateId) -> TypeId {
        self.add(TypeKind::Bool(BoolValue::Undecided {
            s1: Some(s1),
            s2: Some(s2),
        }))
    }

    /// The branch states of an undecided bool, when it carries them.
    pub fn bool_states(&self, id: TypeId) -> Option<(StateId, StateId)> {
        match self.kind(id) {
            TypeKind::Bool(BoolValue::Undecided {
                s1: Some(a),
                s2: Some(b),
            }) => Some((*a, *b)),
            _ => None,
        }
    }

    // ── Structural equality ────────────────────────────────────────────

    /// Structural equality with identity semantics for functions, classes,
    /// and modules: a function equals only itself. That identity is what
    /// lets the call cache terminate mutually recursive inference.
    pub fn eq(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Unknown, TypeKind::Unknown)
            | (TypeKind::Cont, TypeKind::Cont)
            | (TypeKind::Nil, TypeKind::Nil)
            | (TypeKind::Float, TypeKind::Float) => true,
            (TypeKind::Bool(x), TypeKind::Bool(y)) => match (x, y) {
                (BoolValue::Concrete(p), BoolValue::Concrete(q)) => p == q,
                (BoolValue::Undecided { .. }, BoolValue::Undecided { .. }) => true,
                _ => false,
            },
            (TypeKind::Int(x), TypeKind::Int(y)) => x == y,
            (TypeKind::Str(x), TypeKind::Str(y)) => x == y,
            (TypeKind::List { elt: x }, TypeKind::List { elt: y }) => self.eq(*x, *y),
            (TypeKind::Set { elt: x }, TypeKind::Set { elt: y }) => self.eq(*x, *y),
            (TypeKind::Tuple { elts: x }, TypeKind::Tuple { elts: y }) => {
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| self.eq(*p, *q))
            }
            (
                TypeKind::Dict { key: k1, value: v1 },
                TypeKind::Dict { key: k2, value: v2 },
            ) => self.eq(*k1, *k2) && self.eq(*v1, *v2),
            (TypeKind::Union { members: x }, TypeKind::Union { members: y }) => {
                x.len() == y.len()
                    && x.iter().all(|m| y.iter().any(|n| self.eq(*m, *n)))
            }
            (TypeKind::Instance(x), TypeKind::Instance(y)) => {
                x.class == y.class && x.call == y.call
            }
            (TypeKind::Symbol { name: x }, TypeKind::Symbol { name: y }) => x == y,
            (TypeKind::Url { url: x }, TypeKind::Url { url: y }) => x == y,
            // Function/Class/Module compare by handle identity only, which
            // the fast path above already decided.
            _ => false,
        }
    }

    /// Tuple-wise structural equality; the call-cache key comparison.
    pub fn eq_all(&self, a: &[TypeId], b: &[TypeId]) -> bool {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| self.eq(*x, *y))
    }

    // ── Union construction ─────────────────────────────────────────────

    /// Lattice join: Unknown is the identity, equal operands collapse,
    /// anything else becomes a flat deduplicated union.
    pub fn union(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == UNKNOWN {
            return b;
        }
        if b == UNKNOWN {
            return a;
        }
        if self.eq(a, b) {
            return a;
        }
        let mut members = Vec::new();
        self.collect_members(a, &mut members);
        self.collect_members(b, &mut members);
        self.union_from(members)
    }

    /// Raw control-flow join: like [`TypePool::union`] but Unknown stays a
    /// member, so a branch the analysis could not decide remains visible.
    pub fn join_all(&mut self, parts: &[TypeId]) -> TypeId {
        let mut members = Vec::new();
        for part in parts {
            self.collect_members(*part, &mut members);
        }
        self.union_from(members)
    }

    fn union_from(&mut self, members: Vec<TypeId>) -> TypeId {
        match members.len() {
            0 => UNKNOWN,
            1 => members[0],
            _ => self.add(TypeKind::Union { members }),
        }
    }

    /// Flatten nested unions and skip members already present.
    fn collect_members(&self, t: TypeId, out: &mut Vec<TypeId>) {
        if let TypeKind::Union { members } = self.kind(t) {
            for m in members.clone() {
                self.collect_members(m, out);
            }
        } else if !out.iter().any(|m| self.eq(*m, t)) {
            out.push(t);
        }
    }

    /// Structural membership, unwrapping unions.
    pub fn contains(&self, t: TypeId, member: TypeId) -> bool {
        match self.kind(t) {
            TypeKind::Union { members } => members.iter().any(|m| self.eq(*m, member)),
            _ => self.eq(t, member),
        }
    }

    /// Remove a member from a union; a one-member remainder collapses and
    /// removing the type itself yields Unknown.
    pub fn remove(&mut self, t: TypeId, member: TypeId) -> TypeId {
        if let TypeKind::Union { members } = self.kind(t) {
            let kept: Vec<TypeId> = members
                .clone()
                .into_iter()
                .filter(|m| !self.eq(*m, member))
                .collect();
            return self.union_from(kept);
        }
        if self.eq(t, member) {
            UNKNOWN
        } else {
            t
        }
    }

    // ── Call cache ─────────────────────────────────────────────────────

    /// Memoized result of applying `fun` to `from`, if recorded.
    pub fn cached_apply(&self, fun: TypeId, from: &[TypeId]) -> Option<TypeId> {
        let TypeKind::Function(data) = self.kind(fun) else {
            return None;
        };
        data.cache
            .iter()
            .find(|(key, _)| self.eq_all(key, from))
            .map(|(_, to)| *to)
    }

    /// Record an application. The accumulated return type is kept on the
    /// function as well, which is what builtins and reporting read.
    pub fn record_apply(&mut self, fun: TypeId, from: Vec<TypeId>, to: TypeId) {
        let ret = match self.kind(fun) {
            TypeKind::Function(data) => data.ret,
            _ => return,
        };
        let new_ret = self.union(ret, to);
        if let TypeKind::Function(data) = self.kind_mut(fun) {
            data.cache.push((from, to));
            data.ret = new_ret;
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn is_function(&self, t: TypeId) -> bool {
        matches!(self.kind(t), TypeKind::Function(_))
    }

    pub fn is_class(&self, t: TypeId) -> bool {
        matches!(self.kind(t), TypeKind::Class(_))
    }

    pub fn is_int(&self, t: TypeId) -> bool {
        matches!(self.kind(t), TypeKind::Int(_))
    }

    pub fn as_int(&self, t: TypeId) -> Option<IntRange> {
        match self.kind(t) {
            TypeKind::Int(range) => Some(*range),
            _ => None,
        }
    }

    /// The scope a type exposes for attribute resolution.
    pub fn table_of(&self, t: TypeId) -> Option<StateId> {
        match self.kind(t) {
            TypeKind::Class(c) => Some(c.table),
            TypeKind::Instance(i) => Some(i.table),
            TypeKind::Module(m) => Some(m.table),
            _ => None,
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────

    /// Human-readable form. With `debug` set, integer bounds are shown:
    /// `int(3)` for a known value, `int[1..+∞]` for a half-open range.
    pub fn render(&self, t: TypeId, debug: bool) -> String {
        self.render_depth(t, debug, 0)
    }

    fn render_depth(&self, t: TypeId, debug: bool, depth: usize) -> String {
        if depth > RENDER_DEPTH_LIMIT {
            return "...".to_string();
        }
        match self.kind(t) {
            TypeKind::Unknown => "?".to_string(),
            TypeKind::Cont => "None".to_string(),
            TypeKind::Nil => "None".to_string(),
            TypeKind::Bool(BoolValue::Concrete(true)) => "True".to_string(),
            TypeKind::Bool(BoolValue::Concrete(false)) => "False".to_string(),
            TypeKind::Bool(BoolValue::Undecided { .. }) => "bool".to_string(),
            TypeKind::Int(range) => {
                if !debug {
                    return "int".to_string();
                }
                if range.is_actual_value() {
                    format!("int({})", range.lower)
                } else if range.lower_bounded || range.upper_bounded {
                    let lo = if range.lower_bounded {
                        range.lower.to_string()
                    } else {
                        "-∞".to_string()
                    };
                    let hi = if range.upper_bounded {
                        range.upper.to_string()
                    } else {
                        "+∞".to_string()
                    };
                    format!("int[{lo}..{hi}]")
                } else {
                    "int".to_string()
                }
            }
            TypeKind::Str(_) => "str".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::List { elt } => {
                format!("[{}]", self.render_depth(*elt, debug, depth + 1))
            }
            TypeKind::Tuple { elts } => {
                let inner: Vec<String> = elts
                    .iter()
                    .map(|e| self.render_depth(*e, debug, depth + 1))
                    .collect();
                format!("({})", inner.join(", "))
            }
            TypeKind::Dict { key, value } => format!(
                "{{{}: {}}}",
                self.render_depth(*key, debug, depth + 1),
                self.render_depth(*value, debug, depth + 1)
            ),
            TypeKind::Set { elt } => {
                format!("{{{}}}", self.render_depth(*elt, debug, depth + 1))
            }
            TypeKind::Union { members } => {
                let mut parts: Vec<String> = Vec::new();
                for m in members {
                    let s = self.render_depth(*m, debug, depth + 1);
                    if !parts.contains(&s) {
                        parts.push(s);
                    }
                }
                if parts.len() == 1 {
                    parts.pop().unwrap()
                } else {
                    format!("{{{}}}", parts.join(" | "))
                }
            }
            TypeKind::Function(data) => {
                let ret = self.render_depth(data.ret, debug, depth + 1);
                format!("fun(...) -> {ret}")
            }
            TypeKind::Class(data) => format!("<{}>", data.name),
            TypeKind::Instance(data) => match self.kind(data.class) {
                TypeKind::Class(c) => c.name.clone(),
                _ => "<instance>".to_string(),
            },
            TypeKind::Module(data) => format!("<module {}>", data.name),
            TypeKind::Symbol { name } => format!(":{name}"),
            TypeKind::Url { url } => format!("<{url}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_seeded() {
        let pool = TypePool::new();
        assert!(matches!(pool.kind(UNKNOWN), TypeKind::Unknown));
        assert!(matches!(pool.kind(CONT), TypeKind::Cont));
        assert!(matches!(
            pool.kind(TRUE),
            TypeKind::Bool(BoolValue::Concrete(true))
        ));
        assert!(matches!(pool.kind(INT), TypeKind::Int(_)));
    }

    #[test]
    fn union_unknown_is_identity() {
        let mut pool = TypePool::new();
        let i = pool.int_value(1);
        assert_eq!(pool.union(UNKNOWN, i), i);
        assert_eq!(pool.union(i, UNKNOWN), i);
    }

    #[test]
    fn union_equal_collapses() {
        let mut pool = TypePool::new();
        let a = pool.int_value(3);
        let b = pool.int_value(3);
        // Distinct handles, structurally equal.
        assert_ne!(a, b);
        assert_eq!(pool.union(a, b), a);
    }

    #[test]
    fn union_is_flat_and_deduplicated() {
        let mut pool = TypePool::new();
        let i = pool.int_value(1);
        let u1 = pool.union(i, STR);
        let u2 = pool.union(u1, NIL);
        let TypeKind::Union { members } = pool.kind(u2) else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 3);
        // No member is itself a union.
        for m in members.clone() {
            assert!(!matches!(pool.kind(m), TypeKind::Union { .. }));
        }
        // Unioning in an existing member changes nothing.
        let u3 = pool.union(u2, STR);
        let TypeKind::Union { members } = pool.kind(u3) else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 3);
    }

    #[test]
    fn join_all_keeps_unknown_visible() {
        let mut pool = TypePool::new();
        let i = pool.int_value(1);
        let joined = pool.join_all(&[i, UNKNOWN]);
        let TypeKind::Union { members } = pool.kind(joined) else {
            panic!("expected a union");
        };
        assert_eq!(members.len(), 2);
        assert!(pool.contains(joined, UNKNOWN));
    }

    #[test]
    fn remove_collapses_singleton_unions() {
        let mut pool = TypePool::new();
        let i = pool.int_value(1);
        let u = pool.union(i, CONT);
        let removed = pool.remove(u, CONT);
        assert!(pool.eq(removed, i));
        assert_eq!(pool.remove(CONT, CONT), UNKNOWN);
    }

    #[test]
    fn interval_arithmetic() {
        let a = IntRange::value(1);
        let b = IntRange::value(2);
        assert_eq!(IntRange::add(a, b), IntRange::value(3));
        assert_eq!(IntRange::sub(b, a), IntRange::value(1));
        assert_eq!(IntRange::mul(b, b), IntRange::value(4));
        assert_eq!(IntRange::div(IntRange::value(6), b), IntRange::value(3));
    }

    #[test]
    fn boundedness_is_conjunctive() {
        let v = IntRange::value(2);
        let half = IntRange::at_least(1);
        let sum = IntRange::add(v, half);
        assert!(sum.lower_bounded);
        assert!(!sum.upper_bounded);
        assert_eq!(sum.lower, 3);
    }

    #[test]
    fn subtraction_flips_the_unbounded_side() {
        // [2, +∞) - [1,1] = [1, +∞)
        let a = IntRange::at_least(2);
        let b = IntRange::value(1);
        let diff = IntRange::sub(a, b);
        assert!(diff.lower_bounded);
        assert!(!diff.upper_bounded);
        assert_eq!(diff.lower, 1);
    }

    #[test]
    fn feasibility() {
        assert!(IntRange::value(5).is_feasible());
        assert!(IntRange::at_least(5).is_feasible());
        assert!(!IntRange::bounded(5, 1).is_feasible());
    }

    #[test]
    fn negate_swaps_bounds() {
        let r = IntRange::at_least(3).negate();
        assert!(!r.lower_bounded);
        assert!(r.upper_bounded);
        assert_eq!(r.upper, -3);
    }

    #[test]
    fn saturating_endpoints_stay_ordered() {
        let big = IntRange::value(i64::MAX);
        let sum = IntRange::add(big, IntRange::value(1));
        assert!(sum.is_feasible());
        assert_eq!(sum.lower, i64::MAX);
    }

    #[test]
    fn eq_distinguishes_int_values() {
        let mut pool = TypePool::new();
        let three = pool.int_value(3);
        let four = pool.int_value(4);
        assert!(!pool.eq(three, four));
        assert!(!pool.eq_all(&[three, four], &[three, three]));
        let three_again = pool.int_value(3);
        assert!(pool.eq_all(&[three, four], &[three_again, four]));
    }

    #[test]
    fn render_debug_shows_bounds() {
        let mut pool = TypePool::new();
        let v = pool.int_value(3);
        assert_eq!(pool.render(v, true), "int(3)");
        assert_eq!(pool.render(v, false), "int");
        let half = pool.int_range(IntRange::at_least(1));
        assert_eq!(pool.render(half, true), "int[1..+∞]");
    }

    #[test]
    fn render_union() {
        let mut pool = TypePool::new();
        let i = pool.int_value(1);
        let u = pool.union(STR, i);
        assert_eq!(pool.render(u, false), "{str | int}");
    }

    #[test]
    fn symbols_and_urls_compare_by_content() {
        let mut pool = TypePool::new();
        let a = pool.add(TypeKind::Symbol {
            name: "size".into(),
        });
        let b = pool.add(TypeKind::Symbol {
            name: "size".into(),
        });
        let c = pool.add(TypeKind::Symbol {
            name: "other".into(),
        });
        assert!(pool.eq(a, b));
        assert!(!pool.eq(a, c));
        assert_eq!(pool.render(a, false), ":size");

        let u = pool.add(TypeKind::Url {
            url: "https://example.com/doc".into(),
        });
        assert_eq!(pool.render(u, false), "<https://example.com/doc>");
    }
}
