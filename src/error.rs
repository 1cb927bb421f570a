use std::path::PathBuf;

use thiserror::Error;

use crate::model::EntityId;

/// Top-level error type for the asmfacet pipeline.
#[derive(Debug, Error)]
pub enum FacetError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl FacetError {
    /// Process exit code for this error.
    ///
    /// Unsupported output variants are usage errors (1); everything else is
    /// an I/O, data-resolution or invariant failure (2).
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Export(ExportError::Unsupported(_)) => 1,
            _ => 2,
        }
    }
}

/// Errors raised while querying the assembly model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("duplicate entity #{0}")]
    DuplicateEntity(EntityId),

    #[error("could not find product definition #{0}")]
    UnresolvedRoot(EntityId),

    #[error("entity #{0} is not a product definition")]
    NotAProduct(EntityId),
}

/// Errors raised while reading an assembly document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not open design {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed assembly document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("entity #{from} refers to #{to}, which is not a {expected}")]
    UnresolvedReference {
        from: u64,
        to: u64,
        expected: &'static str,
    },

    #[error("entity id 0 is reserved")]
    ZeroEntityId,

    #[error("invalid color {0:?}, expected rrggbb hex")]
    InvalidColor(String),

    #[error("unknown length unit {0:?}")]
    UnknownUnit(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("tessellation failed: {0}")]
    Failed(String),

    #[error("could not start mesher pool: {0}")]
    Pool(String),
}

/// Mesh cache invariant violations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("solid #{0} already has a cached mesh")]
    AlreadyCached(EntityId),
}

/// Errors raised while writing output.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not open output file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml write failed: {0}")]
    Xml(String),

    #[error("{0}")]
    Unsupported(&'static str),
}

/// Convenience type alias for results using [`FacetError`].
pub type Result<T> = std::result::Result<T, FacetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_output_is_a_usage_error() {
        let err: FacetError = ExportError::Unsupported("binary STL").into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn resolution_and_invariant_failures_exit_with_two() {
        let root: FacetError = ModelError::UnresolvedRoot(EntityId::from_raw(7)).into();
        assert_eq!(root.exit_code(), 2);
        assert_eq!(root.to_string(), "could not find product definition #7");

        let dup: FacetError = CacheError::AlreadyCached(EntityId::from_raw(3)).into();
        assert_eq!(dup.exit_code(), 2);
    }
}
