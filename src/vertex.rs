//! Helpers for turning source vertex data into `VertexRecord`s.
//!
//! Formats store either a single owner per vertex or up to four joint
//! influences. Both end up as records with one owner each.
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::types::{NameMap, OwnerIndex, VertexRecord};
use itertools::Itertools;
use log::info;
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// Records produced from one skinned vertex. Four influences fit inline.
pub type SkinnedRecords = SmallVec<[VertexRecord; 4]>;

/// Expands a vertex with four joint influences into one record per
/// influence. Influences without a positive weight are dropped.
#[must_use]
pub fn expand_skinned(
    position: glm::Vec3,
    joint_ids: [u8; 4],
    weights: [f32; 4],
) -> SkinnedRecords {
    joint_ids
        .iter()
        .zip(weights)
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .map(|(id, w)| {
            VertexRecord::weighted(position, OwnerIndex::from(*id), w)
        })
        .collect()
}

/// Returns the joint with the highest weight. Equal weights go to the lower
/// joint id. `None` if no influence has a positive weight.
#[must_use]
pub fn dominant_owner(
    joint_ids: [u8; 4],
    weights: [f32; 4],
) -> Option<OwnerIndex> {
    joint_ids
        .iter()
        .zip(weights)
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .min_by(|(a_id, a_w), (b_id, b_w)| {
            b_w.total_cmp(a_w).then(a_id.cmp(b_id))
        })
        .map(|(id, _)| OwnerIndex::from(*id))
}

/// Shifts owner indices so that the lowest non-zero owner becomes 0. Owner 0
/// is left alone. Some formats number their groups from an arbitrary base
/// and reserve 0, and this brings them back to a zero based range.
///
/// Returns the shifted records and, when anything moved, a warning carrying
/// the offset. The offset is needed later to generate matching names.
#[must_use]
pub fn normalize_owner_offset(
    records: &[VertexRecord],
) -> (Vec<VertexRecord>, Option<Diagnostic>) {
    let Some(offset) =
        records.iter().map(|r| r.owner).filter(|&o| o > 0).min()
    else {
        return (records.to_vec(), None);
    };

    let shifted = records
        .iter()
        .map(|r| VertexRecord {
            owner: if r.owner > 0 { r.owner - offset } else { 0 },
            ..*r
        })
        .collect();
    info!("Owner indices started at {}, offset to start at 0", offset);
    (
        shifted,
        Some(Diagnostic::warning(DiagnosticKind::OwnerOffset { offset })),
    )
}

/// Generates names of the form `{prefix}_{owner + offset}` for every owner
/// present in `records`, so names refer to the owner numbering from before
/// `normalize_owner_offset`. Owners whose original number would not fit in
/// an `OwnerIndex` get no name.
#[must_use]
pub fn default_names(
    records: &[VertexRecord],
    offset: OwnerIndex,
    prefix: &str,
) -> NameMap {
    records
        .iter()
        .map(|r| r.owner)
        .unique()
        .filter_map(|owner| {
            let original = owner.checked_add(offset)?;
            Some((owner, format!("{prefix}_{original}")))
        })
        .collect()
}
