//! Skeleton reconstruction for meshes whose only rigging data is a
//! per-vertex owner tag.
//!
//! The pipeline runs in four stages, each producing a new value from the
//! previous one:
//!
//! 1. centroids, one per owner group with usable weight
//! 2. a minimum spanning tree over those centroids
//! 3. head, tail and chain flags per bone
//! 4. a named bone list in parent-before-child order
//!
//! [`reconstruct::reconstruct`] runs all of them. The stages are also public
//! for callers that want the intermediate values.

pub mod basis;
pub mod diagnostic;
pub mod reconstruct;
pub mod sk_error;
pub mod types;
pub mod util;
pub mod vertex;

// Re-exports
pub use {
    diagnostic::{Diagnostic, DiagnosticKind, Severity},
    reconstruct::{
        reconstruct, DefaultAxis, ReconstructOptions, Reconstruction,
        RigError, RootSelection, SymmetryOptions,
    },
    sk_error::SkError,
    types::{
        AssembledBone, BoneGroup, BoneNode, NameMap, OwnerIndex, SkeletonTree,
        VertexRecord,
    },
};
