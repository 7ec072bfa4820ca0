use super::types::{DefaultAxis, ReconstructOptions};
use crate::{
    basis::ModelBasis,
    diagnostic::{Diagnostic, DiagnosticKind},
    types::VertexRecord,
    util,
};
use log::warn;
use nalgebra_glm as glm;

/// Working state for a single reconstruction. Created at the start of a
/// call and consumed at the end, so nothing carries over between calls.
pub struct Context<'a> {
    pub options: &'a ReconstructOptions,
    /// Resolved unit length default axis
    pub axis: glm::Vec3,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Context<'a> {
    /// Creates a context. The vertices are only looked at when the default
    /// axis has to be derived from the mesh shape.
    #[must_use]
    pub fn new(
        options: &'a ReconstructOptions,
        vertices: &[VertexRecord],
    ) -> Self {
        let axis = match options.default_axis {
            DefaultAxis::Fixed(axis) => util::direction(&axis)
                .unwrap_or_else(|| ModelBasis::default().forward),
            DefaultAxis::ModelForward => {
                ModelBasis::from_records(vertices).forward
            }
        };
        Self {
            options,
            axis,
            diagnostics: Vec::new(),
        }
    }

    /// Records a non-fatal problem and logs it
    pub fn warn(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic::warning(kind);
        warn!("{}", diagnostic.kind);
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
