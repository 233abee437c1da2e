use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors produced while assembling or loading a [`crate::MemoryIndex`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read type index {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid type index json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("class {0} is declared more than once")]
    DuplicateClass(String),
}
