use super::{context::Context, types::RigError};
use crate::{
    diagnostic::DiagnosticKind,
    types::{self, BoneGroup, OwnerIndex, VertexRecord},
    util,
};
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use log::debug;
use nalgebra_glm as glm;

/// Positions and weights of the vertices in each owner group. A group may be
/// present with an empty list, which is reported the same way as a group
/// with no weight.
pub type GroupedVertices = HashMap<OwnerIndex, Vec<(glm::Vec3, f32)>>;

/// Sorts vertex records into their owner groups, keeping input order within
/// each group
#[must_use]
pub fn group_by_owner(vertices: &[VertexRecord]) -> GroupedVertices {
    let mut groups = GroupedVertices::new();
    for v in vertices {
        groups
            .entry(v.owner)
            .or_default()
            .push((v.position, v.weight));
    }
    groups
}

/// Weighted centroid of one group, or `None` if nothing in it has weight.
/// Sums are done in f64 so the result does not drift with group size.
fn weighted_centroid(vertices: &[(glm::Vec3, f32)]) -> Option<glm::Vec3> {
    let mut sum = glm::DVec3::zeros();
    let mut total = 0.0f64;
    for (position, weight) in vertices {
        if types::contributes(position, *weight) {
            let w = f64::from(*weight);
            sum += position.cast::<f64>() * w;
            total += w;
        }
    }
    (total > 0.0).then(|| util::narrow(&(sum / total)))
}

/// Reduces each owner group to its weighted centroid.
///
/// Groups are visited in ascending owner order and the output is sorted the
/// same way. Groups without weight are left out with a warning.
///
/// # Errors
/// `RigError::EmptyInput` if there are no vertices at all or every group was
/// left out. The left out groups travel with the error.
pub fn calculate(
    ctx: &mut Context,
    groups: &GroupedVertices,
) -> Result<Vec<BoneGroup>, RigError> {
    let vertex_count: usize = groups.values().map(Vec::len).sum();
    if vertex_count == 0 {
        return Err(RigError::EmptyInput {
            skipped: Vec::new(),
        });
    }

    let mut ret = Vec::with_capacity(groups.len());
    let mut skipped = Vec::new();
    for (&owner, vertices) in groups.iter().sorted_by_key(|(owner, _)| **owner)
    {
        if let Some(centroid) = weighted_centroid(vertices) {
            ret.push(BoneGroup {
                owner,
                centroid,
                vertex_count: vertices.len(),
            });
        } else {
            skipped.push((owner, vertices.len()));
            ctx.warn(DiagnosticKind::PartialGroup {
                owner,
                vertex_count: vertices.len(),
            });
        }
    }
    debug!(
        "{} groups from {} vertices, {} skipped",
        ret.len(),
        vertex_count,
        skipped.len()
    );

    if ret.is_empty() {
        return Err(RigError::EmptyInput { skipped });
    }
    Ok(ret)
}
