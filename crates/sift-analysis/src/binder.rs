//! Destructuring binds.
//!
//! `bind` pattern-matches an assignment target against a value type and
//! creates bindings of the requested kind: plain names insert directly,
//! tuple and list targets fan out positionally or through the element type,
//! attribute targets land in the receiver's table, subscript targets only
//! evaluate their pieces for effects.

use sift_parser::{NodeId, NodeKind};

use crate::analyzer::Analyzer;
use crate::binding::BindingKind;
use crate::state::{StateId, StateKind};
use crate::transform::transform;
use crate::ty::{TypeId, TypeKind, STR, UNKNOWN};
use crate::{FileId, NodeRef};

/// Bind `target` to `ty` in `state` with an explicit kind.
pub fn bind(
    az: &mut Analyzer,
    state: StateId,
    file: FileId,
    target: NodeId,
    ty: TypeId,
    kind: BindingKind,
) {
    let ast = az.ast(file).clone();
    match ast.kind(target).clone() {
        NodeKind::Name { id } => {
            az.insert(state, &id, NodeRef { file, node: target }, ty, kind);
        }
        NodeKind::Tuple { elts } | NodeKind::ListLit { elts } => {
            bind_sequence(az, state, file, target, &elts, ty, kind);
        }
        NodeKind::Attribute { target: obj, attr } => {
            bind_attribute(az, state, file, obj, attr, ty);
        }
        NodeKind::Subscript { value, index } => {
            // No binding; evaluate the indexed pieces for their effects.
            transform(az, file, value, state);
            if let Some(index) = index {
                transform(az, file, index, state);
            }
        }
        NodeKind::Starred { value } => {
            let list = az.types.list_of(ty);
            bind(az, state, file, value, list, kind);
        }
        _ => {
            az.put_problem(
                NodeRef { file, node: target },
                "invalid assignment target",
            );
        }
    }
}

/// Bind with the kind implied by the enclosing scope: locals in functions,
/// attributes in class and instance bodies, module-level names otherwise.
pub fn bind_with_default_kind(
    az: &mut Analyzer,
    state: StateId,
    file: FileId,
    target: NodeId,
    ty: TypeId,
) {
    let kind = match az.states.get(state).kind {
        StateKind::Function => BindingKind::Variable,
        StateKind::Class | StateKind::Instance => BindingKind::Attribute,
        _ => BindingKind::Scope,
    };
    bind(az, state, file, target, ty, kind);
}

/// Tuple/list target: positional match against a tuple-ish value, element
/// fan-out against any other iterable, Unknown plus a problem otherwise.
fn bind_sequence(
    az: &mut Analyzer,
    state: StateId,
    file: FileId,
    target: NodeId,
    elts: &[NodeId],
    ty: TypeId,
    kind: BindingKind,
) {
    let ast = az.ast(file).clone();
    let starred_at = elts.iter().position(|e| {
        matches!(ast.kind(*e), NodeKind::Starred { .. })
    });

    let value_elts: Option<Vec<TypeId>> = match az.types.kind(ty) {
        TypeKind::Tuple { elts } => Some(elts.clone()),
        _ => None,
    };

    if let Some(values) = value_elts {
        match starred_at {
            None if values.len() == elts.len() => {
                for (t, v) in elts.iter().zip(values.iter()) {
                    bind(az, state, file, *t, *v, kind);
                }
            }
            Some(star) if values.len() + 1 >= elts.len() => {
                let n_after = elts.len() - star - 1;
                let mid_end = values.len() - n_after;
                for (t, v) in elts[..star].iter().zip(values.iter()) {
                    bind(az, state, file, *t, *v, kind);
                }
                // The middle slice is absorbed as a list.
                let mut mid = UNKNOWN;
                for v in &values[star..mid_end] {
                    mid = az.types.union(mid, *v);
                }
                let mid_list = az.types.list_of(mid);
                let NodeKind::Starred { value } = ast.kind(elts[star]).clone() else {
                    unreachable!("starred position was located above");
                };
                bind(az, state, file, value, mid_list, kind);
                for (t, v) in elts[star + 1..].iter().zip(values[mid_end..].iter()) {
                    bind(az, state, file, *t, *v, kind);
                }
            }
            _ => {
                az.put_problem(
                    NodeRef { file, node: target },
                    format!(
                        "cannot unpack {} values into {} targets",
                        values.len(),
                        elts.len()
                    ),
                );
                for t in elts {
                    bind(az, state, file, *t, UNKNOWN, kind);
                }
            }
        }
        return;
    }

    // Iterable-typed value: every target gets the element type.
    let elt_ty = match az.types.kind(ty) {
        TypeKind::List { elt } | TypeKind::Set { elt } => Some(*elt),
        TypeKind::Dict { key, .. } => Some(*key),
        TypeKind::Str(_) => Some(STR),
        TypeKind::Unknown => Some(UNKNOWN),
        _ => None,
    };
    match elt_ty {
        Some(elt) => {
            for t in elts {
                bind(az, state, file, *t, elt, kind);
            }
        }
        None => {
            az.put_problem(
                NodeRef { file, node: target },
                format!(
                    "cannot unpack non-iterable: {}",
                    az.types.render(ty, az.options().debug)
                ),
            );
            for t in elts {
                bind(az, state, file, *t, UNKNOWN, kind);
            }
        }
    }
}

/// `obj.attr = value`: evaluate the receiver and insert into its table.
fn bind_attribute(
    az: &mut Analyzer,
    state: StateId,
    file: FileId,
    obj: NodeId,
    attr: NodeId,
    ty: TypeId,
) {
    let ast = az.ast(file).clone();
    let Some(attr_name) = ast.name_text(attr).map(str::to_string) else {
        return;
    };
    let obj_ty = transform(az, file, obj, state);

    let targets: Vec<TypeId> = match az.types.kind(obj_ty) {
        TypeKind::Union { members } => members.clone(),
        _ => vec![obj_ty],
    };
    let mut bound = false;
    for t in targets {
        if let Some(table) = az.types.table_of(t) {
            az.insert(
                table,
                &attr_name,
                NodeRef { file, node: attr },
                ty,
                BindingKind::Attribute,
            );
            bound = true;
        }
    }
    if !bound && obj_ty != UNKNOWN {
        az.put_problem(
            NodeRef { file, node: attr },
            format!("cannot set attribute: {attr_name}"),
        );
    }
}
