//! The abstract-interpretation pass.
//!
//! `transform` maps one AST node to a type, threading a scope through every
//! child. Calls are evaluated by `apply`, which binds actual parameter
//! types into a fresh function scope, memoizes argument-tuple to result
//! mappings per function, and breaks cycles with a per-call-node stack
//! guard. Every failure substitutes Unknown and records a problem; the pass
//! never aborts a module.

use rustc_hash::FxHashMap;

use sift_parser::ast::{BinOpKind, BoolOpKind, CmpOpKind, UnaryOpKind};
use sift_parser::{NodeId, NodeKind};

use crate::analyzer::Analyzer;
use crate::binder;
use crate::binding::{BindingId, BindingKind};
use crate::state::{StateId, StateKind};
use crate::ty::{
    BoolValue, InstanceData, IntRange, TypeId, TypeKind, BOOL, CONT, FALSE, FLOAT, INT, NIL,
    STR, TRUE, UNKNOWN,
};
use crate::{FileId, NodeRef};

/// Evaluate `node` in `state`, producing its type.
pub fn transform(az: &mut Analyzer, file: FileId, node: NodeId, state: StateId) -> TypeId {
    let ast = az.ast(file).clone();
    let here = NodeRef { file, node };

    match ast.kind(node).clone() {
        NodeKind::Module { body } => transform(az, file, body, state),

        // A block accumulates the union of statement types until the first
        // statement that cannot fall through, then drops the continuation
        // sentinel. Later statements are still analyzed for their bindings.
        NodeKind::Block { stmts } => {
            let mut returned = false;
            let mut ret = UNKNOWN;
            for stmt in stmts {
                let t = transform(az, file, stmt, state);
                if !returned {
                    ret = az.types.union(ret, t);
                    if !az.types.contains(t, CONT) {
                        returned = true;
                        ret = az.types.remove(ret, CONT);
                    }
                }
            }
            if ret == UNKNOWN {
                CONT
            } else {
                ret
            }
        }

        NodeKind::ExprStmt { value } => {
            let t = transform(az, file, value, state);
            if matches!(ast.kind(value), NodeKind::Yield { .. }) {
                // A yield produces a value but control continues.
                az.types.union(t, CONT)
            } else {
                CONT
            }
        }

        NodeKind::Assign { target, value } => {
            let vt = transform(az, file, value, state);
            binder::bind_with_default_kind(az, state, file, target, vt);
            CONT
        }

        NodeKind::Name { id } => match az.states.lookup(state, &id) {
            Some(bids) => {
                az.put_ref(here, &bids);
                az.union_of_bindings(&bids)
            }
            None => {
                az.put_problem(here, format!("undefined name: {id}"));
                UNKNOWN
            }
        },

        NodeKind::Attribute { target, attr } => {
            let tt = transform(az, file, target, state);
            attribute_of(az, file, tt, attr).0
        }

        NodeKind::Subscript { value, index } => {
            let vt = transform(az, file, value, state);
            let it = index.map(|i| transform(az, file, i, state));
            subscript_type(az, vt, it)
        }

        NodeKind::Call {
            func,
            args,
            keywords,
            kwargs,
            starargs,
            blockarg,
        } => {
            let (fun, self_ty) = match ast.kind(func).clone() {
                NodeKind::Attribute { target, attr } => {
                    let tt = transform(az, file, target, state);
                    // `Klass.new(...)` constructs like a direct class call.
                    if ast.name_text(attr) == Some("new") && az.types.is_class(tt) {
                        (tt, None)
                    } else {
                        attribute_of(az, file, tt, attr)
                    }
                }
                _ => (transform(az, file, func, state), None),
            };

            let pos: Vec<TypeId> = args
                .iter()
                .map(|a| transform(az, file, *a, state))
                .collect();
            let mut hash: FxHashMap<String, TypeId> = FxHashMap::default();
            for kw_node in keywords {
                if let NodeKind::Keyword { arg, value } = ast.kind(kw_node).clone() {
                    let t = transform(az, file, value, state);
                    hash.insert(arg, t);
                }
            }
            let kw = kwargs.map(|n| transform(az, file, n, state));
            let star = starargs.map(|n| transform(az, file, n, state));
            let block = blockarg.map(|n| transform(az, file, n, state));

            resolve_call(az, fun, self_ty, &pos, hash, kw, star, block, Some(here))
        }

        NodeKind::Function { name, defaults, .. } => {
            let d_types: Vec<TypeId> = defaults
                .iter()
                .map(|d| transform(az, file, *d, state))
                .collect();
            let env = az.states.forwarding_or_self(state);
            let fun = az.types.add(TypeKind::Function(crate::ty::FunData {
                def: Some(here),
                env,
                def_state: state,
                defaults: d_types,
                ret: UNKNOWN,
                cache: Vec::new(),
            }));
            az.add_uncalled(fun);
            match name {
                Some(name_node) => {
                    let fname = ast.name_text(name_node).unwrap_or("lambda").to_string();
                    az.insert(
                        state,
                        &fname,
                        NodeRef {
                            file,
                            node: name_node,
                        },
                        fun,
                        BindingKind::Function,
                    );
                    CONT
                }
                // A lambda is an expression; its value is the function.
                None => fun,
            }
        }

        NodeKind::Class { name, bases, body } => {
            let cname = ast.name_text(name).unwrap_or("class").to_string();
            let class_state = az.states.add(Some(state), StateKind::Class);
            let fwd = az.states.forwarding_or_self(state);
            az.states.get_mut(class_state).forwarding = Some(fwd);
            let path = az.states.extend_path(state, &cname);
            az.states.set_path(class_state, path);

            let base_types: Vec<TypeId> = bases
                .iter()
                .map(|b| transform(az, file, *b, state))
                .collect();
            let cls = az.types.add(TypeKind::Class(crate::ty::ClassData {
                name: cname.clone(),
                def: Some(here),
                table: class_state,
                bases: base_types,
            }));
            az.insert(
                state,
                &cname,
                NodeRef { file, node: name },
                cls,
                BindingKind::Class,
            );
            transform(az, file, body, class_state);
            CONT
        }

        NodeKind::Return { value } => match value {
            Some(v) => transform(az, file, v, state),
            None => NIL,
        },

        NodeKind::Yield { value } => match value {
            Some(v) => transform(az, file, v, state),
            None => NIL,
        },

        NodeKind::If { test, body, orelse } => {
            let mut s1 = az.states.copy(state);
            let mut s2 = az.states.copy(state);
            let cond = transform(az, file, test, state);
            if let Some((a, b)) = az.types.bool_states(cond) {
                s1 = a;
                s2 = b;
            }

            let t1 = transform(az, file, body, s1);
            let t2 = match orelse {
                Some(o) => transform(az, file, o, s2),
                None => CONT,
            };

            let cont1 = az.types.contains(t1, CONT);
            let cont2 = az.types.contains(t2, CONT);
            let is_true = matches!(az.types.kind(cond), TypeKind::Bool(BoolValue::Concrete(true)));
            let is_false =
                matches!(az.types.kind(cond), TypeKind::Bool(BoolValue::Concrete(false)));

            // Decide which branch shapes the downstream state.
            if is_true && cont1 {
                az.states.overwrite(state, s1);
            } else if is_false && cont2 {
                az.states.overwrite(state, s2);
            } else if cont1 && cont2 {
                let merged = az.states.merge(s1, s2);
                az.states.overwrite(state, merged);
            } else if cont1 {
                az.states.overwrite(state, s1);
            } else if cont2 {
                az.states.overwrite(state, s2);
            }

            if is_true {
                t1
            } else if is_false {
                t2
            } else {
                az.types.union(t1, t2)
            }
        }

        NodeKind::IfExp { test, body, orelse } => {
            let mut s1 = az.states.copy(state);
            let mut s2 = az.states.copy(state);
            let cond = transform(az, file, test, state);
            if let Some((a, b)) = az.types.bool_states(cond) {
                s1 = a;
                s2 = b;
            }
            let t1 = transform(az, file, body, s1);
            let t2 = transform(az, file, orelse, s2);
            if matches!(az.types.kind(cond), TypeKind::Bool(BoolValue::Concrete(true))) {
                t1
            } else if matches!(az.types.kind(cond), TypeKind::Bool(BoolValue::Concrete(false))) {
                t2
            } else {
                // Control-flow join: an undecided branch stays visible,
                // including one the cycle guard answered with Unknown.
                az.types.join_all(&[t1, t2])
            }
        }

        NodeKind::While { test, body, orelse } => {
            transform(az, file, test, state);
            let mut t = transform(az, file, body, state);
            if let Some(o) = orelse {
                let ot = transform(az, file, o, state);
                t = az.types.union(t, ot);
            }
            t
        }

        NodeKind::For {
            target,
            iter,
            body,
            orelse,
        } => {
            let iter_ty = transform(az, file, iter, state);
            let elt = element_type(az, iter_ty);
            binder::bind(az, state, file, target, elt, BindingKind::Scope);
            let mut t = transform(az, file, body, state);
            if let Some(o) = orelse {
                let ot = transform(az, file, o, state);
                t = az.types.union(t, ot);
            }
            t
        }

        NodeKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            let mut parts = Vec::new();
            for h in handlers {
                parts.push(transform(az, file, h, state));
            }
            parts.push(transform(az, file, body, state));
            if let Some(o) = orelse {
                parts.push(transform(az, file, o, state));
            }
            if let Some(f) = finalbody {
                parts.push(transform(az, file, f, state));
            }
            az.types.join_all(&parts)
        }

        NodeKind::Handler {
            exceptions,
            binder: bound,
            body,
        } => {
            let mut exc = UNKNOWN;
            for e in exceptions {
                let t = transform(az, file, e, state);
                exc = az.types.union(exc, t);
            }
            if let Some(b) = bound {
                binder::bind(az, state, file, b, exc, BindingKind::Parameter);
            }
            transform(az, file, body, state)
        }

        NodeKind::Import { names } => {
            for name_node in names {
                let Some(mod_name) = ast.name_text(name_node).map(str::to_string) else {
                    continue;
                };
                match az.resolve_import(file, &mod_name) {
                    Some(mt) => {
                        az.insert(
                            state,
                            &mod_name,
                            NodeRef {
                                file,
                                node: name_node,
                            },
                            mt,
                            BindingKind::Module,
                        );
                    }
                    None => {
                        az.put_problem(
                            NodeRef {
                                file,
                                node: name_node,
                            },
                            format!("module not found: {mod_name}"),
                        );
                    }
                }
            }
            CONT
        }

        NodeKind::BinOp { op, left, right } => {
            let lt = transform(az, file, left, state);
            let rt = transform(az, file, right, state);
            binop_type(az, op, lt, rt)
        }

        NodeKind::UnaryOp { op, operand } => {
            let t = transform(az, file, operand, state);
            unary_type(az, op, t)
        }

        NodeKind::BoolOp { op, values } => bool_op(az, file, state, op, &values),

        NodeKind::Compare { op, left, right } => {
            let lt = transform(az, file, left, state);
            let rt = transform(az, file, right, state);
            compare_type(az, file, state, op, left, lt, rt)
        }

        NodeKind::Int { value } => az.types.int_value(value),
        NodeKind::Float { .. } => FLOAT,
        NodeKind::Str { value } => az.types.str_literal(value),

        NodeKind::Tuple { elts } => {
            let ts: Vec<TypeId> = elts
                .iter()
                .map(|e| transform(az, file, *e, state))
                .collect();
            az.types.tuple_of(ts)
        }

        NodeKind::ListLit { elts } => {
            let mut elt = UNKNOWN;
            for e in elts {
                let t = transform(az, file, e, state);
                elt = az.types.union(elt, t);
            }
            az.types.list_of(elt)
        }

        NodeKind::DictLit { keys, values } => {
            let mut key = UNKNOWN;
            let mut value = UNKNOWN;
            for k in keys {
                let t = transform(az, file, k, state);
                key = az.types.union(key, t);
            }
            for v in values {
                let t = transform(az, file, v, state);
                value = az.types.union(value, t);
            }
            az.types.dict_of(key, value)
        }

        NodeKind::SetLit { elts } => {
            let mut elt = UNKNOWN;
            for e in elts {
                let t = transform(az, file, e, state);
                elt = az.types.union(elt, t);
            }
            az.types.set_of(elt)
        }

        NodeKind::Starred { value } => transform(az, file, value, state),

        NodeKind::Keyword { value, .. } => transform(az, file, value, state),

        NodeKind::Global { names } => {
            for name in names {
                az.states.add_global_name(state, name);
            }
            CONT
        }

        NodeKind::Pass | NodeKind::Break | NodeKind::Continue => CONT,

        NodeKind::Url { url } => az.types.add(TypeKind::Url { url }),
    }
}

// ── Call evaluation ────────────────────────────────────────────────────

/// Dispatch a call on the callee's type: unions fan out, classes
/// instantiate, functions apply, anything else warns and yields Unknown.
#[allow(clippy::too_many_arguments)]
fn resolve_call(
    az: &mut Analyzer,
    fun: TypeId,
    self_ty: Option<TypeId>,
    pos: &[TypeId],
    hash: FxHashMap<String, TypeId>,
    kw: Option<TypeId>,
    star: Option<TypeId>,
    block: Option<TypeId>,
    call: Option<NodeRef>,
) -> TypeId {
    match az.types.kind(fun) {
        TypeKind::Union { members } => {
            let members = members.clone();
            let mut ret = UNKNOWN;
            for m in members {
                let t = resolve_call(az, m, self_ty, pos, hash.clone(), kw, star, block, call);
                ret = az.types.union(ret, t);
            }
            ret
        }
        TypeKind::Function(_) => apply(az, fun, self_ty, pos, hash, kw, star, block, call),
        TypeKind::Class(_) => instantiate(az, fun, pos, hash, kw, star, block, call),
        TypeKind::Unknown => UNKNOWN,
        _ => {
            if let Some(call) = call {
                let rendered = az.types.render(fun, az.options().debug);
                az.put_problem(call, format!("calling non-function and non-class: {rendered}"));
            }
            UNKNOWN
        }
    }
}

/// Synthesize an instance for a class call and run its constructor with
/// the instance bound as self.
#[allow(clippy::too_many_arguments)]
fn instantiate(
    az: &mut Analyzer,
    cls: TypeId,
    pos: &[TypeId],
    hash: FxHashMap<String, TypeId>,
    kw: Option<TypeId>,
    star: Option<TypeId>,
    block: Option<TypeId>,
    call: Option<NodeRef>,
) -> TypeId {
    let TypeKind::Class(data) = az.types.kind(cls) else {
        return UNKNOWN;
    };
    let class_table = data.table;
    let instance_state = az.states.add(Some(class_table), StateKind::Instance);
    let instance = az.types.add(TypeKind::Instance(InstanceData {
        class: cls,
        table: instance_state,
        call,
        args: pos.to_vec(),
    }));
    let mut ctor = None;
    for ctor_name in ["__init__", "initialize"] {
        if let Some(bids) = class_attr_lookup(az, cls, ctor_name) {
            let t = az.union_of_bindings(&bids);
            if az.types.is_function(t) {
                ctor = Some(t);
                break;
            }
        }
    }
    if let Some(ctor) = ctor {
        apply(az, ctor, Some(instance), pos, hash, kw, star, block, call);
    }
    instance
}

/// Apply a function per the call algorithm: cycle guard, fresh scope with a
/// dotted path, parameter binding, memoization, body transform.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    az: &mut Analyzer,
    fun: TypeId,
    self_ty: Option<TypeId>,
    pos: &[TypeId],
    hash: FxHashMap<String, TypeId>,
    kw: Option<TypeId>,
    star: Option<TypeId>,
    block: Option<TypeId>,
    call: Option<NodeRef>,
) -> TypeId {
    az.remove_uncalled(fun);
    let TypeKind::Function(data) = az.types.kind(fun) else {
        return UNKNOWN;
    };
    let (def, env, def_state, defaults, declared_ret) = (
        data.def,
        data.env,
        data.def_state,
        data.defaults.clone(),
        data.ret,
    );

    // A function without a definition is a builtin: answer with its
    // declared return type.
    let Some(def) = def else {
        return declared_ret;
    };

    if let Some(call) = call {
        if az.in_stack(call) {
            return UNKNOWN;
        }
        az.push_call(call);
    }
    az.n_called += 1;

    let ast = az.ast(def.file).clone();
    let NodeKind::Function {
        name,
        args,
        vararg,
        kwarg,
        after_rest,
        blockarg: block_formal,
        body,
        ..
    } = ast.kind(def.node).clone()
    else {
        if let Some(call) = call {
            az.pop_call(call);
        }
        return UNKNOWN;
    };

    let fname = name
        .and_then(|n| ast.name_text(n))
        .unwrap_or("lambda")
        .to_string();
    let func_state = az.states.add(Some(env), StateKind::Function);
    let path = az.states.extend_path(def_state, &fname);
    az.states.set_path(func_state, path);

    // The receiver is threaded in explicitly; it is never stored on the
    // function value. A declared `self` formal receives it positionally,
    // otherwise it is bound directly under the conventional name.
    let mut actuals = pos.to_vec();
    if let Some(receiver) = self_ty {
        if args.first().and_then(|a| ast.name_text(*a)) == Some("self") {
            actuals.insert(0, receiver);
        } else {
            az.insert(func_state, "self", def, receiver, BindingKind::Parameter);
        }
    }

    let from_type = bind_params(
        az,
        def.file,
        func_state,
        &args,
        vararg,
        kwarg,
        &after_rest,
        block_formal,
        &actuals,
        &defaults,
        hash,
        kw,
        star,
        block,
        call,
    );

    if let Some(cached) = az.types.cached_apply(fun, &from_type) {
        if let Some(call) = call {
            az.pop_call(call);
        }
        return cached;
    }

    let to_type = transform(az, def.file, body, func_state);
    if missing_return(az, to_type) {
        if let Some(name_node) = name {
            az.put_problem(
                NodeRef {
                    file: def.file,
                    node: name_node,
                },
                "function not always returns a value",
            );
        }
        if let Some(call) = call {
            az.put_problem(call, "call not always returns a value");
        }
    }
    az.types.record_apply(fun, from_type, to_type);
    if let Some(call) = call {
        az.pop_call(call);
    }
    to_type
}

/// What starargs can still supply positionally.
enum StarSupply {
    Tuple(Vec<TypeId>),
    List(TypeId),
    None,
}

/// Bind formals to actuals in the function scope, producing the
/// memoization key: the tuple of actual parameter types in positional
/// order.
///
/// Ties: positionals, then defaults, then keywords (consumed from the
/// map), then starargs elements; leftover keywords feed `**kw`, leftover
/// positionals feed `*rest` (honoring trailing formals after the rest).
#[allow(clippy::too_many_arguments)]
fn bind_params(
    az: &mut Analyzer,
    file: FileId,
    func_state: StateId,
    formals: &[NodeId],
    vararg: Option<NodeId>,
    kwarg: Option<NodeId>,
    after_rest: &[NodeId],
    block_formal: Option<NodeId>,
    pos: &[TypeId],
    defaults: &[TypeId],
    mut hash: FxHashMap<String, TypeId>,
    kw: Option<TypeId>,
    star: Option<TypeId>,
    block: Option<TypeId>,
    call: Option<NodeRef>,
) -> Vec<TypeId> {
    let ast = az.ast(file).clone();
    let p_size = formals.len();
    let a_size = pos.len();
    let d_size = defaults.len();
    let n_pos = p_size.saturating_sub(d_size);

    let star_supply = match star.map(|s| az.types.kind(s).clone()) {
        Some(TypeKind::Tuple { elts }) => StarSupply::Tuple(elts),
        Some(TypeKind::List { elt }) => StarSupply::List(elt),
        _ => StarSupply::None,
    };
    let mut j = 0usize;

    let mut from_type = Vec::with_capacity(p_size);
    for (i, formal) in formals.iter().enumerate() {
        let formal_name = ast.name_text(*formal).map(str::to_string);
        let a_type = if i < a_size {
            pos[i]
        } else if i >= n_pos && i - n_pos < d_size {
            defaults[i - n_pos]
        } else if let Some(t) = formal_name.as_deref().and_then(|n| hash.remove(n)) {
            t
        } else {
            match &star_supply {
                StarSupply::Tuple(elts) if j < elts.len() => {
                    let t = elts[j];
                    j += 1;
                    t
                }
                StarSupply::List(elt) => *elt,
                _ => {
                    if call.is_some() {
                        az.put_problem(
                            NodeRef {
                                file,
                                node: *formal,
                            },
                            format!(
                                "unable to bind argument: {}",
                                formal_name.as_deref().unwrap_or("?")
                            ),
                        );
                    }
                    UNKNOWN
                }
            }
        };
        binder::bind(az, func_state, file, *formal, a_type, BindingKind::Parameter);
        from_type.push(a_type);
    }

    if let Some(kw_formal) = kwarg {
        let t = if !hash.is_empty() {
            let mut values = UNKNOWN;
            let mut leftovers: Vec<_> = hash.drain().collect();
            leftovers.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, v) in leftovers {
                values = az.types.union(values, v);
            }
            az.types.dict_of(STR, values)
        } else {
            kw.unwrap_or(UNKNOWN)
        };
        binder::bind(az, func_state, file, kw_formal, t, BindingKind::Parameter);
    }

    if let Some(rest) = vararg {
        if a_size > p_size {
            if !after_rest.is_empty() {
                let n_after = after_rest.len();
                for (i, trailing) in after_rest.iter().enumerate() {
                    let t = (a_size + i)
                        .checked_sub(n_after)
                        .and_then(|idx| pos.get(idx))
                        .copied()
                        .unwrap_or(UNKNOWN);
                    binder::bind(az, func_state, file, *trailing, t, BindingKind::Parameter);
                }
                let mid_end = a_size.saturating_sub(n_after);
                let rest_ty = if mid_end > p_size {
                    az.types.tuple_of(pos[p_size..mid_end].to_vec())
                } else {
                    UNKNOWN
                };
                binder::bind(az, func_state, file, rest, rest_ty, BindingKind::Parameter);
            } else {
                let rest_ty = az.types.tuple_of(pos[p_size..].to_vec());
                binder::bind(az, func_state, file, rest, rest_ty, BindingKind::Parameter);
            }
        } else {
            binder::bind(az, func_state, file, rest, UNKNOWN, BindingKind::Parameter);
            // Trailing formals with no surplus actuals stay unknown too.
            for trailing in after_rest {
                binder::bind(az, func_state, file, *trailing, UNKNOWN, BindingKind::Parameter);
            }
        }
    }

    if let (Some(bf), Some(bt)) = (block_formal, block) {
        binder::bind(az, func_state, file, bf, bt, BindingKind::Parameter);
    }

    from_type
}

/// A result that unions a no-value sentinel with real values means some
/// path falls off the end.
fn missing_return(az: &Analyzer, t: TypeId) -> bool {
    let TypeKind::Union { members } = az.types.kind(t) else {
        return false;
    };
    let mut has_none = false;
    let mut has_other = false;
    for m in members {
        if *m == NIL || *m == CONT {
            has_none = true;
        } else {
            has_other = true;
        }
    }
    has_none && has_other
}

// ── Attribute resolution ───────────────────────────────────────────────

/// Resolve `target.attr` against an already-evaluated target type.
///
/// Returns the attribute's type and, when the receiver is an instance, the
/// receiver itself for a following call to thread as self.
pub fn attribute_of(
    az: &mut Analyzer,
    file: FileId,
    target_ty: TypeId,
    attr: NodeId,
) -> (TypeId, Option<TypeId>) {
    let ast = az.ast(file).clone();
    let Some(name) = ast.name_text(attr).map(str::to_string) else {
        return (UNKNOWN, None);
    };
    let attr_ref = NodeRef { file, node: attr };

    let members = match az.types.kind(target_ty) {
        TypeKind::Union { members } => members.clone(),
        _ => vec![target_ty],
    };

    let mut found: Vec<BindingId> = Vec::new();
    let mut self_ty = None;
    for m in members {
        let bids = match az.types.kind(m) {
            TypeKind::Instance(data) => {
                let own = az.states.lookup_attr(data.table, &name);
                let class = data.class;
                let resolved = own.or_else(|| class_attr_lookup(az, class, &name));
                if resolved.is_some() {
                    self_ty = Some(m);
                }
                resolved
            }
            TypeKind::Class(_) => class_attr_lookup(az, m, &name),
            TypeKind::Module(data) => az.states.lookup_attr(data.table, &name),
            _ => None,
        };
        if let Some(bids) = bids {
            found.extend(bids);
        }
    }

    if found.is_empty() {
        if target_ty != UNKNOWN {
            az.put_problem(attr_ref, format!("attribute not found: {name}"));
        }
        (UNKNOWN, None)
    } else {
        az.put_ref(attr_ref, &found);
        (az.union_of_bindings(&found), self_ty)
    }
}

/// Attribute lookup through a class and its bases, depth-first.
fn class_attr_lookup(az: &Analyzer, cls: TypeId, name: &str) -> Option<Vec<BindingId>> {
    let TypeKind::Class(data) = az.types.kind(cls) else {
        return None;
    };
    if let Some(bids) = az.states.lookup_attr(data.table, name) {
        return Some(bids);
    }
    for base in &data.bases {
        if let Some(bids) = class_attr_lookup(az, *base, name) {
            return Some(bids);
        }
    }
    None
}

// ── Operators ──────────────────────────────────────────────────────────

fn binop_type(az: &mut Analyzer, op: BinOpKind, lt: TypeId, rt: TypeId) -> TypeId {
    if let (Some(a), Some(b)) = (az.types.as_int(lt), az.types.as_int(rt)) {
        return match op {
            BinOpKind::Add => az.types.int_range(IntRange::add(a, b)),
            BinOpKind::Sub => az.types.int_range(IntRange::sub(a, b)),
            BinOpKind::Mul => az.types.int_range(IntRange::mul(a, b)),
            BinOpKind::Div => {
                let r = IntRange::div(a, b);
                if r.is_feasible() {
                    az.types.int_range(r)
                } else {
                    INT
                }
            }
            BinOpKind::Mod | BinOpKind::Pow => INT,
        };
    }
    match (az.types.kind(lt), az.types.kind(rt), op) {
        (TypeKind::Str(_), TypeKind::Str(_), BinOpKind::Add) => STR,
        (TypeKind::List { elt: a }, TypeKind::List { elt: b }, BinOpKind::Add) => {
            let (a, b) = (*a, *b);
            let elt = az.types.union(a, b);
            az.types.list_of(elt)
        }
        (TypeKind::Tuple { elts: a }, TypeKind::Tuple { elts: b }, BinOpKind::Add) => {
            let mut elts = a.clone();
            elts.extend(b.iter().copied());
            az.types.tuple_of(elts)
        }
        (TypeKind::Float, TypeKind::Float | TypeKind::Int(_), _)
        | (TypeKind::Int(_), TypeKind::Float, _) => FLOAT,
        _ => UNKNOWN,
    }
}

fn unary_type(az: &mut Analyzer, op: UnaryOpKind, t: TypeId) -> TypeId {
    match op {
        UnaryOpKind::Neg => match az.types.as_int(t) {
            Some(range) => az.types.int_range(range.negate()),
            None if matches!(az.types.kind(t), TypeKind::Float) => FLOAT,
            None => UNKNOWN,
        },
        UnaryOpKind::Pos => match az.types.kind(t) {
            TypeKind::Int(_) | TypeKind::Float => t,
            _ => UNKNOWN,
        },
        UnaryOpKind::Not => match az.types.kind(t) {
            TypeKind::Bool(BoolValue::Concrete(b)) => {
                if *b {
                    FALSE
                } else {
                    TRUE
                }
            }
            TypeKind::Bool(BoolValue::Undecided {
                s1: Some(a),
                s2: Some(b),
            }) => {
                let (a, b) = (*a, *b);
                az.types.undecided_bool(b, a)
            }
            _ => BOOL,
        },
    }
}

/// Short-circuit operators thread refinement states left to right: `and`
/// evaluates its right side in the left side's true-state, `or` in its
/// false-state.
fn bool_op(
    az: &mut Analyzer,
    file: FileId,
    state: StateId,
    op: BoolOpKind,
    values: &[NodeId],
) -> TypeId {
    let Some((first, rest)) = values.split_first() else {
        return BOOL;
    };
    let t = transform(az, file, *first, state);
    let (mut s_true, mut s_false) = az
        .types
        .bool_states(t)
        .unwrap_or_else(|| {
            let a = az.states.copy(state);
            let b = az.states.copy(state);
            (a, b)
        });
    for value in rest {
        match op {
            BoolOpKind::And => {
                let t = transform(az, file, *value, s_true);
                if let Some((b1, b2)) = az.types.bool_states(t) {
                    s_true = b1;
                    s_false = az.states.merge(s_false, b2);
                }
            }
            BoolOpKind::Or => {
                let t = transform(az, file, *value, s_false);
                if let Some((b1, b2)) = az.types.bool_states(t) {
                    s_true = az.states.merge(s_true, b1);
                    s_false = b2;
                }
            }
        }
    }
    az.types.undecided_bool(s_true, s_false)
}

/// Integer comparisons yield an undecided bool carrying refinement states:
/// in the true-state a compared name takes the satisfying bound, in the
/// false-state its complement. The bounds replace the old interval rather
/// than intersecting it, and concrete True/False never arise from
/// intervals, so `if` always sees both branches of a comparison.
#[allow(clippy::too_many_arguments)]
fn compare_type(
    az: &mut Analyzer,
    file: FileId,
    state: StateId,
    op: CmpOpKind,
    left: NodeId,
    lt: TypeId,
    rt: TypeId,
) -> TypeId {
    let (Some(_), Some(r)) = (az.types.as_int(lt), az.types.as_int(rt)) else {
        return BOOL;
    };
    let s1 = az.states.copy(state);
    let s2 = az.states.copy(state);

    let ast = az.ast(file).clone();
    if let Some(name) = ast.name_text(left).map(str::to_string) {
        if r.is_actual_value() {
            let v = r.lower;
            let (true_range, false_range) = match op {
                CmpOpKind::Lt => (
                    Some(IntRange::at_most(v.saturating_sub(1))),
                    Some(IntRange::at_least(v)),
                ),
                CmpOpKind::LtE => (
                    Some(IntRange::at_most(v)),
                    Some(IntRange::at_least(v.saturating_add(1))),
                ),
                CmpOpKind::Gt => (
                    Some(IntRange::at_least(v.saturating_add(1))),
                    Some(IntRange::at_most(v)),
                ),
                CmpOpKind::GtE => (
                    Some(IntRange::at_least(v)),
                    Some(IntRange::at_most(v.saturating_sub(1))),
                ),
                CmpOpKind::Eq => (Some(IntRange::value(v)), None),
                CmpOpKind::NotEq => (None, Some(IntRange::value(v))),
                _ => (None, None),
            };
            if let Some(range) = true_range {
                let t = az.types.int_range(range);
                az.narrow(s1, &name, t);
            }
            if let Some(range) = false_range {
                let t = az.types.int_range(range);
                az.narrow(s2, &name, t);
            }
        }
    }
    az.types.undecided_bool(s1, s2)
}

// ── Element access ─────────────────────────────────────────────────────

/// Element type an iteration over `t` yields.
fn element_type(az: &mut Analyzer, t: TypeId) -> TypeId {
    match az.types.kind(t) {
        TypeKind::List { elt } | TypeKind::Set { elt } => *elt,
        TypeKind::Dict { key, .. } => *key,
        TypeKind::Str(_) => STR,
        TypeKind::Tuple { elts } => {
            let elts = elts.clone();
            let mut out = UNKNOWN;
            for e in elts {
                out = az.types.union(out, e);
            }
            out
        }
        _ => UNKNOWN,
    }
}

fn subscript_type(az: &mut Analyzer, value: TypeId, index: Option<TypeId>) -> TypeId {
    match az.types.kind(value) {
        TypeKind::List { elt } => *elt,
        TypeKind::Set { elt } => *elt,
        TypeKind::Str(_) => STR,
        TypeKind::Dict { value, .. } => *value,
        TypeKind::Tuple { elts } => {
            let elts = elts.clone();
            if let Some(range) = index.and_then(|i| az.types.as_int(i)) {
                if range.is_actual_value() {
                    let i = range.lower;
                    if i >= 0 && (i as usize) < elts.len() {
                        return elts[i as usize];
                    }
                }
            }
            let mut out = UNKNOWN;
            for e in elts {
                out = az.types.union(out, e);
            }
            out
        }
        _ => UNKNOWN,
    }
}
