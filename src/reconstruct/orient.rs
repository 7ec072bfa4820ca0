use super::{context::Context, types::SpanningTree};
use crate::{
    diagnostic::DiagnosticKind,
    types::{BoneNode, OwnerIndex, SkeletonTree},
    util::{self, DEGENERATE_EPSILON},
};
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use log::debug;
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// Node indices of the children of each node, in attach order. Most bones
/// have few children so they are kept inline.
type Children = HashMap<OwnerIndex, SmallVec<[usize; 4]>>;

fn children_by_parent(tree: &SpanningTree) -> Children {
    let mut children = Children::with_capacity(tree.nodes.len());
    for (index, node) in tree
        .nodes
        .iter()
        .enumerate()
        .sorted_by_key(|(_, n)| n.order)
    {
        if let Some(parent) = node.parent {
            children.entry(parent).or_default().push(index);
        }
    }
    children
}

/// Tail for a bone with no children, pointing away from its parent head.
/// `None` if the head sits on top of the parent head.
fn leaf_tail(
    ctx: &Context,
    head: &glm::Vec3,
    parent_head: &glm::Vec3,
) -> Option<glm::Vec3> {
    let away = head - parent_head;
    let dir = util::direction(&away)?;
    let len = (glm::length(&away) * ctx.options.leaf_tail_fraction)
        .max(ctx.options.min_bone_length);
    Some(head + dir * len)
}

/// Converts the spanning tree into bones with head, tail and chain flag.
///
/// - head is the group centroid
/// - a bone with children points at the head of the child attached first
/// - a leaf points away from its parent, a fraction of the distance to it
/// - a lone root points along the default axis
///
/// "First" is by the recorded `order`, not by position in `tree.nodes`, and
/// the bones come out in ascending `order`. A bone whose tail would land on
/// its head gets a short offset along the default axis instead, with a
/// warning. A bone is connected to its parent only when it is that parent's
/// only child.
#[must_use]
pub fn orient(ctx: &mut Context, tree: &SpanningTree) -> SkeletonTree {
    let children = children_by_parent(tree);
    let heads: HashMap<OwnerIndex, glm::Vec3> =
        tree.nodes.iter().map(|n| (n.owner, n.centroid)).collect();
    let child_count =
        |owner: OwnerIndex| children.get(&owner).map_or(0, SmallVec::len);

    let mut nodes = Vec::with_capacity(tree.nodes.len());
    for node in tree.nodes.iter().sorted_by_key(|n| n.order) {
        let head = node.centroid;
        let parent_head = node.parent.and_then(|p| heads.get(&p));
        let first_child = children
            .get(&node.owner)
            .and_then(|c| c.first())
            .map(|&index| &tree.nodes[index]);

        let tail = match (first_child, parent_head) {
            (Some(child), _) => Some(child.centroid),
            (None, Some(parent_head)) => leaf_tail(ctx, &head, parent_head),
            (None, None) => Some(
                head + ctx.axis
                    * ctx
                        .options
                        .root_tail_length
                        .max(ctx.options.min_bone_length),
            ),
        };
        let tail = match tail {
            Some(tail) if glm::distance(&head, &tail) >= DEGENERATE_EPSILON => {
                tail
            }
            _ => {
                ctx.warn(DiagnosticKind::DegenerateGeometry {
                    owner: node.owner,
                    axis: ctx.axis,
                });
                head + ctx.axis * ctx.options.min_bone_length
            }
        };

        nodes.push(BoneNode {
            id: node.owner,
            head,
            tail,
            parent_id: node.parent,
            connected_to_parent: node
                .parent
                .is_some_and(|p| child_count(p) == 1),
        });
    }
    debug!("oriented {} bones", nodes.len());

    SkeletonTree { nodes }
}
