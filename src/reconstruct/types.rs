use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::sk_error::SkError;
use crate::types::{AssembledBone, OwnerIndex};
use itertools::Itertools;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Axis used where the geometry gives no direction: the bone of a single
/// group model, and the offset applied to zero length bones.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefaultAxis {
    /// A fixed axis. It is normalized before use.
    Fixed(glm::Vec3),
    /// The forward axis of the mesh bounding box, see `ModelBasis`
    ModelForward,
}

impl Default for DefaultAxis {
    fn default() -> Self {
        Self::Fixed(glm::vec3(0.0, 1.0, 0.0))
    }
}

/// How the root of the spanning tree is chosen
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootSelection {
    /// Group with the smallest summed distance to all other groups
    #[default]
    CenterMost,
    /// Group with the smallest owner index
    LowestOwner,
    /// First group, by owner index, whose name contains the text ignoring
    /// case. Falls back to `CenterMost` when nothing matches.
    NameContains(String),
}

/// Penalty for tree edges that cross the X=0 plane, which keeps left and
/// right limbs from linking to each other.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymmetryOptions {
    /// Points within this distance of the plane count as centred
    pub margin: f32,
    /// Multiplier applied to the distance of a crossing edge
    pub penalty: f32,
}

impl Default for SymmetryOptions {
    fn default() -> Self {
        Self {
            margin: 0.05,
            penalty: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// Leaf tail length as a fraction of the distance to the parent head
    pub leaf_tail_fraction: f32,
    /// Shortest allowed tail length, also the length of degenerate bones
    pub min_bone_length: f32,
    /// Tail length of a bone with neither parent nor children
    pub root_tail_length: f32,
    pub default_axis: DefaultAxis,
    pub root_selection: RootSelection,
    pub symmetry: Option<SymmetryOptions>,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            leaf_tail_fraction: 0.5f32,
            min_bone_length: 0.01f32,
            root_tail_length: 0.05f32,
            default_axis: DefaultAxis::default(),
            root_selection: RootSelection::default(),
            symmetry: None,
        }
    }
}

impl ReconstructOptions {
    /// Parses options from YAML. Missing fields take their default values.
    ///
    /// # Errors
    /// May return `SkError`
    pub fn from_yaml(text: &str) -> Result<Self, SkError> {
        let options: Self = serde_yaml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a YAML file
    ///
    /// # Errors
    /// May return `SkError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SkError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Serializes options to YAML
    ///
    /// # Errors
    /// May return `SkError`
    pub fn to_yaml(&self) -> Result<String, SkError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks that the options describe valid geometry
    ///
    /// # Errors
    /// Returns `RigError::InvalidOptions` naming the bad field
    pub fn validate(&self) -> Result<(), RigError> {
        if !(self.leaf_tail_fraction.is_finite()
            && self.leaf_tail_fraction > 0.0)
        {
            return Err(RigError::InvalidOptions("leaf_tail_fraction"));
        }
        if !(self.min_bone_length.is_finite() && self.min_bone_length > 0.0) {
            return Err(RigError::InvalidOptions("min_bone_length"));
        }
        if !(self.root_tail_length.is_finite()
            && self.root_tail_length >= 0.0)
        {
            return Err(RigError::InvalidOptions("root_tail_length"));
        }
        if let DefaultAxis::Fixed(axis) = self.default_axis {
            if crate::util::direction(&axis).is_none() {
                return Err(RigError::InvalidOptions("default_axis"));
            }
        }
        if let Some(symmetry) = self.symmetry {
            if !(symmetry.margin.is_finite() && symmetry.margin >= 0.0) {
                return Err(RigError::InvalidOptions("symmetry.margin"));
            }
            if !(symmetry.penalty.is_finite() && symmetry.penalty > 0.0) {
                return Err(RigError::InvalidOptions("symmetry.penalty"));
            }
        }
        Ok(())
    }
}

/// One node of the spanning tree. `order` is the position at which the node
/// was attached: 0 for the root, then 1, 2, ...
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TreeNode {
    pub owner: OwnerIndex,
    pub centroid: glm::Vec3,
    pub parent: Option<OwnerIndex>,
    pub order: u32,
    /// Euclidean distance to the parent centroid, 0 for the root
    pub length: f32,
}

/// Spanning tree over the group centroids, nodes stored in attach order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpanningTree {
    pub nodes: Vec<TreeNode>,
}

impl SpanningTree {
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.first()
    }

    /// Children of `owner`, sorted by `order`
    pub fn children(
        &self,
        owner: OwnerIndex,
    ) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes
            .iter()
            .filter(move |n| n.parent == Some(owner))
            .sorted_by_key(|n| n.order)
    }

    /// Sum of the Euclidean lengths of all edges
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.nodes.iter().map(|n| f64::from(n.length)).sum()
    }
}

/// Result of a successful reconstruction
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Reconstruction {
    /// Bones with every parent ahead of its children
    pub bones: Vec<AssembledBone>,
    /// Non-fatal problems found along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconstruction {
    /// True if anything had to be skipped or corrected
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    #[must_use]
    pub fn root(&self) -> Option<&AssembledBone> {
        self.bones.iter().find(|b| b.parent_id.is_none())
    }

    #[must_use]
    pub fn bone_by_owner(&self, owner: OwnerIndex) -> Option<&AssembledBone> {
        self.bones.iter().find(|b| b.id == owner)
    }

    pub fn children_of(
        &self,
        owner: OwnerIndex,
    ) -> impl Iterator<Item = &AssembledBone> + '_ {
        self.bones
            .iter()
            .filter(move |b| b.parent_id == Some(owner))
    }
}

/// Errors that stop a reconstruction. `SkError` has a `From` trait to
/// handle these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigError {
    /// Nothing to build from. Either no vertices were given, and `skipped`
    /// is empty, or every group was left out for having no usable weight,
    /// and `skipped` holds the owner and vertex count of each of them.
    EmptyInput { skipped: Vec<(OwnerIndex, usize)> },
    InvalidOptions(&'static str),
}

impl RigError {
    /// The fatal diagnostic equivalent of this error, for callers that keep
    /// one list of outcomes
    #[must_use]
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::EmptyInput { skipped } => {
                Some(Diagnostic::fatal(DiagnosticKind::EmptyInput {
                    skipped: skipped.len(),
                }))
            }
            Self::InvalidOptions(_) => None,
        }
    }

    /// Everything reported before the failure followed by the fatal
    /// diagnostic itself
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let warnings = match self {
            Self::EmptyInput { skipped } => skipped
                .iter()
                .map(|&(owner, vertex_count)| {
                    Diagnostic::warning(DiagnosticKind::PartialGroup {
                        owner,
                        vertex_count,
                    })
                })
                .collect(),
            Self::InvalidOptions(_) => Vec::new(),
        };
        warnings.into_iter().chain(self.diagnostic()).collect()
    }
}

impl std::fmt::Display for RigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::EmptyInput { skipped } if skipped.is_empty() => {
                write!(f, "no vertices to reconstruct from")
            }
            Self::EmptyInput { skipped } => write!(
                f,
                "no usable vertices, none of the {} owner groups has weight",
                skipped.len()
            ),
            Self::InvalidOptions(field) => {
                write!(f, "option {field} is out of range")
            }
        }
    }
}
