use thiserror::Error;
use uuid::Uuid;

/// Failure reported by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("backend rejected request: {0}")]
    Rejected(String),

    #[error("shape {0} not found in backend")]
    NotFound(Uuid),

    #[error("storage i/o failed: {0}")]
    Io(String),

    #[error("could not encode or decode shapes: {0}")]
    Codec(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// Geometry rejected locally; never reaches a backend
    #[error("invalid geometry: {0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("shape {0} not found")]
    NotFound(Uuid),

    /// Another mutation of this shape has not resolved yet
    #[error("shape {0} is still being saved")]
    Busy(Uuid),

    #[error("shape {0} is not open for editing")]
    NotEditing(Uuid),

    #[error("map is read-only")]
    ReadOnly,

    #[error("no shape selected")]
    NothingSelected,
}

impl ShapeError {
    /// Errors the user should see. Validation failures are dropped silently.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ShapeError::Validation(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
