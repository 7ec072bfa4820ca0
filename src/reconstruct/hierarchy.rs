use super::{
    context::Context,
    types::{RootSelection, SpanningTree, SymmetryOptions, TreeNode},
};
use crate::types::{BoneGroup, NameMap};
use itertools::Itertools;
use log::{debug, trace};
use nalgebra_glm as glm;
use std::cmp::Ordering;

/// Edge weight between two centroids. Plain distance unless a symmetry
/// penalty is set and the edge crosses the X=0 plane.
fn edge_weight(
    a: &glm::Vec3,
    b: &glm::Vec3,
    symmetry: Option<&SymmetryOptions>,
) -> f32 {
    let dist = glm::distance(a, b);
    match symmetry {
        Some(s)
            if (a.x > s.margin && b.x < -s.margin)
                || (a.x < -s.margin && b.x > s.margin) =>
        {
            dist * s.penalty
        }
        _ => dist,
    }
}

/// Orders candidates by distance, then by index. Groups are sorted by owner
/// so the index order is the owner order.
fn closer(a: (usize, f32), b: (usize, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

/// Index of the group whose centroid has the smallest summed distance to all
/// the others
fn center_most(groups: &[BoneGroup]) -> usize {
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let sum: f64 = groups
                .iter()
                .map(|other| {
                    f64::from(glm::distance(&g.centroid, &other.centroid))
                })
                .sum();
            (i, sum)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map_or(0, |(i, _)| i)
}

/// Picks the root group index according to the options
fn select_root(
    groups: &[BoneGroup],
    names: &NameMap,
    selection: &RootSelection,
) -> usize {
    match selection {
        RootSelection::CenterMost => center_most(groups),
        RootSelection::LowestOwner => 0,
        RootSelection::NameContains(hint) => {
            let hint = hint.to_lowercase();
            groups
                .iter()
                .position(|g| {
                    names
                        .get(&g.owner)
                        .is_some_and(|n| n.to_lowercase().contains(&hint))
                })
                .unwrap_or_else(|| {
                    debug!("no bone name contains '{}'", hint);
                    center_most(groups)
                })
        }
    }
}

/// Builds a minimum spanning tree over the group centroids with Prim's
/// algorithm.
///
/// For every group not yet in the tree the best known edge into the tree is
/// kept. Each step attaches the group with the cheapest edge, lower owner
/// first on a tie, then lets the new node offer cheaper edges to the rest.
/// A new node only replaces a best edge when it is strictly closer, so ties
/// stay with the node attached earlier. This is O(N²) in the group count.
///
/// `groups` must be sorted by owner, as produced by `centroid::calculate`.
/// An empty slice gives an empty tree.
#[must_use]
pub fn infer(
    ctx: &Context,
    groups: &[BoneGroup],
    names: &NameMap,
) -> SpanningTree {
    debug_assert!(groups
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.owner < b.owner));
    let count = groups.len();
    if count == 0 {
        return SpanningTree::default();
    }
    let symmetry = ctx.options.symmetry.as_ref();

    let root = select_root(groups, names, &ctx.options.root_selection);
    debug!("root is owner {}", groups[root].owner);

    let mut connected = vec![false; count];
    let mut best = vec![(root, f32::INFINITY); count];
    connected[root] = true;
    for (i, g) in groups.iter().enumerate() {
        if i != root {
            best[i].1 =
                edge_weight(&groups[root].centroid, &g.centroid, symmetry);
        }
    }

    let mut nodes = Vec::with_capacity(count);
    nodes.push(TreeNode {
        owner: groups[root].owner,
        centroid: groups[root].centroid,
        parent: None,
        order: 0,
        length: 0.0,
    });

    for order in 1..count {
        let Some(next) = (0..count)
            .filter(|&i| !connected[i])
            .min_by(|&a, &b| closer((a, best[a].1), (b, best[b].1)))
        else {
            break;
        };
        connected[next] = true;
        let parent = &groups[best[next].0];
        let child = &groups[next];
        trace!(
            "attach {} to {} at {} (order {})",
            child.owner,
            parent.owner,
            best[next].1,
            order
        );
        nodes.push(TreeNode {
            owner: child.owner,
            centroid: child.centroid,
            parent: Some(parent.owner),
            order: u32::try_from(order).unwrap_or(u32::MAX),
            length: glm::distance(&parent.centroid, &child.centroid),
        });

        for (i, g) in groups.iter().enumerate() {
            if connected[i] {
                continue;
            }
            let w = edge_weight(&child.centroid, &g.centroid, symmetry);
            if w < best[i].1 {
                best[i] = (next, w);
            }
        }
    }

    SpanningTree { nodes }
}
