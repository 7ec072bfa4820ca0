use ahash::{HashMap, HashSet, HashSetExt};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Owner tag carried by each vertex. It names the bone group the vertex
/// belongs to and is also used as the id of the reconstructed bone.
pub type OwnerIndex = u32;

/// Display names keyed by owner index, usually the mesh group labels that a
/// deformation binding matches against.
pub type NameMap = HashMap<OwnerIndex, String>;

/// One input vertex. `weight` is 1.0 for formats without skin weights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub position: glm::Vec3,
    pub owner: OwnerIndex,
    pub weight: f32,
}

impl VertexRecord {
    /// Creates an unweighted record
    #[must_use]
    pub const fn new(position: glm::Vec3, owner: OwnerIndex) -> Self {
        Self {
            position,
            owner,
            weight: 1.0,
        }
    }

    #[must_use]
    pub const fn weighted(
        position: glm::Vec3,
        owner: OwnerIndex,
        weight: f32,
    ) -> Self {
        Self {
            position,
            owner,
            weight,
        }
    }

    /// A vertex counts towards its group centroid only with a positive,
    /// finite weight and a finite position.
    #[must_use]
    pub fn contributes(&self) -> bool {
        contributes(&self.position, self.weight)
    }
}

/// See `VertexRecord::contributes`
#[must_use]
pub fn contributes(position: &glm::Vec3, weight: f32) -> bool {
    weight.is_finite() && weight > 0.0 && position.iter().all(|c| c.is_finite())
}

/// Owner group with at least one contributing vertex
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoneGroup {
    pub owner: OwnerIndex,
    pub centroid: glm::Vec3,
    pub vertex_count: usize,
}

/// A reconstructed bone. The `id` is the owner index of its group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoneNode {
    pub id: OwnerIndex,
    pub head: glm::Vec3,
    pub tail: glm::Vec3,
    pub parent_id: Option<OwnerIndex>,
    pub connected_to_parent: bool,
}

/// All bones for one reconstruction, stored in the order the spanning tree
/// attached them. A parent is always attached before its children so this
/// order is topological.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SkeletonTree {
    pub nodes: Vec<BoneNode>,
}

impl SkeletonTree {
    #[must_use]
    pub fn root(&self) -> Option<&BoneNode> {
        self.nodes.iter().find(|n| n.parent_id.is_none())
    }

    #[must_use]
    pub fn get(&self, id: OwnerIndex) -> Option<&BoneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Checks the tree invariants: exactly one root, unique ids, and every
    /// parent appearing before its child. The last condition also rules out
    /// cycles and unreachable nodes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let roots = self.nodes.iter().filter(|n| n.parent_id.is_none()).count();
        if roots != 1 {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if let Some(parent) = node.parent_id {
                if !seen.contains(&parent) {
                    return false;
                }
            }
            if !seen.insert(node.id) {
                return false;
            }
        }
        true
    }
}

/// Output bone handed to whatever builds the actual armature
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssembledBone {
    pub id: OwnerIndex,
    pub name: String,
    pub head: glm::Vec3,
    pub tail: glm::Vec3,
    pub parent_id: Option<OwnerIndex>,
    pub connected_to_parent: bool,
}

impl AssembledBone {
    #[must_use]
    pub fn length(&self) -> f32 {
        glm::distance(&self.head, &self.tail)
    }
}
