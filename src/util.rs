//! A module of utility functions
use log::debug;
use nalgebra_glm as glm;
use std::time::Instant;

/// Distance below which two points are treated as the same point
pub const DEGENERATE_EPSILON: f32 = 1.0e-6;

/// Runs `f` and logs how long it took at debug level
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let benchmark = Instant::now();
    let ret = f();
    debug!("{} took {:?}", label, benchmark.elapsed());
    ret
}

/// Converts an f64 accumulator back to the f32 vectors used everywhere else
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn narrow(v: &glm::DVec3) -> glm::Vec3 {
    glm::vec3(v.x as f32, v.y as f32, v.z as f32)
}

/// Normalizes `v`, or returns `None` if it is too short to have a direction
#[must_use]
pub fn direction(v: &glm::Vec3) -> Option<glm::Vec3> {
    let len = glm::length(v);
    if len.is_finite() && len >= DEGENERATE_EPSILON {
        Some(v / len)
    } else {
        None
    }
}
