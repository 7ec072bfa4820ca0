use super::context::Context;
use crate::{
    diagnostic::DiagnosticKind,
    types::{AssembledBone, NameMap, OwnerIndex, SkeletonTree},
};

/// Longest name the armature formats can store
pub const MAX_NAME_LEN: usize = 32;

/// Keeps printable ASCII and cuts the result to `MAX_NAME_LEN` bytes
fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(MAX_NAME_LEN)
        .collect()
}

fn fallback_name(owner: OwnerIndex) -> String {
    format!("Bone_{owner}")
}

/// Resolves the display name for one bone, warning when it had to be
/// generated or changed
fn bone_name(ctx: &mut Context, names: &NameMap, owner: OwnerIndex) -> String {
    let Some(original) = names.get(&owner) else {
        ctx.warn(DiagnosticKind::MissingName { owner });
        return fallback_name(owner);
    };
    let cleaned = clean_name(original);
    if cleaned.is_empty() {
        ctx.warn(DiagnosticKind::MissingName { owner });
        return fallback_name(owner);
    }
    if cleaned != *original {
        ctx.warn(DiagnosticKind::NameAdjusted {
            owner,
            original: original.clone(),
        });
    }
    cleaned
}

/// Pairs each bone with its display name. The bones keep the order of the
/// skeleton tree, which is already parent before child, so equal inputs
/// always give the same list.
#[must_use]
pub fn assemble(
    ctx: &mut Context,
    skeleton: &SkeletonTree,
    names: &NameMap,
) -> Vec<AssembledBone> {
    debug_assert!(skeleton.nodes.is_empty() || skeleton.is_valid());
    skeleton
        .nodes
        .iter()
        .map(|node| AssembledBone {
            id: node.id,
            name: bone_name(ctx, names, node.id),
            head: node.head,
            tail: node.tail,
            parent_id: node.parent_id,
            connected_to_parent: node.connected_to_parent,
        })
        .collect()
}
