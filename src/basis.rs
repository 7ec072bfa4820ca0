use crate::{types::VertexRecord, util};
use nalgebra_glm as glm;

/// Forward axis guessed from the shape of a mesh.
///
/// The longer of the X and Y extents of the bounding box is taken as the
/// forward axis. Most of a creature's mass sits towards its head, so the
/// forward axis is flipped to point from the bounding box centre towards the
/// vertex mean. Z is assumed to be up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelBasis {
    pub forward: glm::Vec3,
}

impl Default for ModelBasis {
    fn default() -> Self {
        Self {
            forward: glm::vec3(0.0, 1.0, 0.0),
        }
    }
}

impl ModelBasis {
    /// Analyses vertex positions. An empty set gives the default basis.
    #[must_use]
    pub fn from_positions<'a>(
        positions: impl IntoIterator<Item = &'a glm::Vec3>,
    ) -> Self {
        let mut count = 0_usize;
        let mut sum = glm::DVec3::zeros();
        let mut min = glm::vec3(f32::MAX, f32::MAX, f32::MAX);
        let mut max = glm::vec3(f32::MIN, f32::MIN, f32::MIN);
        for p in positions {
            if !p.iter().all(|c| c.is_finite()) {
                continue;
            }
            count += 1;
            sum += p.cast::<f64>();
            min = glm::min2(&min, p);
            max = glm::max2(&max, p);
        }
        if count == 0 {
            return Self::default();
        }

        let size = max - min;
        let mut basis = if size.x > size.y {
            Self {
                forward: glm::vec3(1.0, 0.0, 0.0),
            }
        } else {
            Self::default()
        };

        #[allow(clippy::cast_precision_loss)]
        let mean = util::narrow(&(sum / count as f64));
        let centre = (min + max) * 0.5;
        if glm::dot(&(mean - centre), &basis.forward) < 0.0 {
            basis.forward = -basis.forward;
        }
        basis
    }

    /// Convenience for analysing vertex records directly
    #[must_use]
    pub fn from_records(records: &[VertexRecord]) -> Self {
        Self::from_positions(records.iter().map(|r| &r.position))
    }
}
