use crate::types::OwnerIndex;
use nalgebra_glm as glm;
use serde::Serialize;
use std::fmt;

/// Whether a diagnostic stopped the reconstruction or only degraded it
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Severity {
    Fatal,
    Warning,
}

/// What happened, with enough context for a caller to act on it without
/// parsing text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// Nothing usable to build from. `skipped` counts the groups left out
    /// for having no weight, 0 when no vertices were supplied at all.
    EmptyInput { skipped: usize },
    /// A group was left out because its total weight was zero
    PartialGroup {
        owner: OwnerIndex,
        vertex_count: usize,
    },
    /// A zero length bone was given a small offset along `axis`
    DegenerateGeometry { owner: OwnerIndex, axis: glm::Vec3 },
    /// Owner indices were shifted down by `offset`
    OwnerOffset { offset: OwnerIndex },
    /// No display name was supplied so one was generated
    MissingName { owner: OwnerIndex },
    /// A display name was cleaned or truncated
    NameAdjusted { owner: OwnerIndex, original: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyInput { skipped: 0 } => {
                write!(f, "no vertices to reconstruct from")
            }
            Self::EmptyInput { skipped } => {
                write!(f, "all {skipped} owner groups have zero weight")
            }
            Self::PartialGroup {
                owner,
                vertex_count,
            } => write!(
                f,
                "owner {owner} skipped, {vertex_count} vertices with no weight"
            ),
            Self::DegenerateGeometry { owner, axis } => write!(
                f,
                "bone {owner} had zero length, offset along ({}, {}, {})",
                axis.x, axis.y, axis.z
            ),
            Self::OwnerOffset { offset } => {
                write!(f, "owner indices offset by -{offset} to start at 0")
            }
            Self::MissingName { owner } => {
                write!(f, "no name for owner {owner}, using a generated one")
            }
            Self::NameAdjusted { owner, original } => {
                write!(f, "name '{original}' for owner {owner} was cleaned")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    #[must_use]
    pub const fn fatal(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Fatal,
            kind,
        }
    }

    #[must_use]
    pub const fn warning(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.severity {
            Severity::Fatal => write!(f, "fatal: {}", self.kind),
            Severity::Warning => write!(f, "warning: {}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, DiagnosticKind, Severity};

    #[test]
    fn severity_and_text() {
        let d = Diagnostic::warning(DiagnosticKind::PartialGroup {
            owner: 4,
            vertex_count: 2,
        });
        assert!(!d.is_fatal());
        assert_eq!(d.severity, Severity::Warning);
        assert!(d.to_string().starts_with("warning: owner 4"));

        let d = Diagnostic::fatal(DiagnosticKind::EmptyInput { skipped: 0 });
        assert!(d.is_fatal());
        assert!(d.to_string().starts_with("fatal:"));
    }
}
