pub mod assemble;
pub mod centroid;
mod context;
pub mod hierarchy;
pub mod orient;
mod types;

// Re-exports
pub use {
    context::Context,
    types::{
        DefaultAxis, ReconstructOptions, Reconstruction, RigError,
        RootSelection, SpanningTree, SymmetryOptions, TreeNode,
    },
};

use crate::{
    sk_error::SkError,
    types::{NameMap, VertexRecord},
    util::timed,
};
use log::{error, info};

/// Reconstructs a bone hierarchy from owner tagged vertices.
///
/// Owners that appear in `names` but have no vertices are reported as
/// skipped groups. Every call works on its own `Context`, so calls never
/// affect each other and equal inputs give identical output.
///
/// # Errors
/// May return `SkError`. Reconstruction failures are
/// `SkError::RigError`, and `RigError::diagnostics` gives the warnings
/// recorded before the failure followed by the fatal `Diagnostic`.
pub fn reconstruct(
    vertices: &[VertexRecord],
    names: &NameMap,
    options: &ReconstructOptions,
) -> Result<Reconstruction, SkError> {
    options.validate()?;
    let mut ctx = Context::new(options, vertices);

    let groups = timed("calculate_centroids", || {
        let mut grouped = centroid::group_by_owner(vertices);
        for owner in names.keys() {
            grouped.entry(*owner).or_default();
        }
        centroid::calculate(&mut ctx, &grouped)
    })
    .inspect_err(|e| error!("{}", e))?;
    let tree = timed("infer_hierarchy", || {
        hierarchy::infer(&ctx, &groups, names)
    });
    let skeleton = timed("orient_bones", || orient::orient(&mut ctx, &tree));
    let bones = timed("assemble_bones", || {
        assemble::assemble(&mut ctx, &skeleton, names)
    });

    info!(
        "Reconstructed {} bones from {} vertices",
        bones.len(),
        vertices.len()
    );
    Ok(Reconstruction {
        bones,
        diagnostics: ctx.into_diagnostics(),
    })
}
