use std::{error, fmt};

/// Unified error type
///
/// Reconstruction failures are carried as `RigError` so that a caller can
/// match on the exact reason. Loading options from a file adds I/O and YAML
/// errors. The YAML error type is large so it is boxed.
#[derive(Debug)]
pub enum SkError {
    StdIoError(std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
    RigError(crate::reconstruct::RigError),
}

impl error::Error for SkError {}

impl fmt::Display for SkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::RigError(e) => write!(f, "reconstruction error: {e}"),
        }
    }
}

impl From<serde_yaml::Error> for SkError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for SkError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<crate::reconstruct::RigError> for SkError {
    fn from(e: crate::reconstruct::RigError) -> Self {
        Self::RigError(e)
    }
}
