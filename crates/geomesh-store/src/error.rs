use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Key contains characters that cannot map to a file name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Generic I/O error (e.g. creating the data directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record failed to decode.
    #[error("Record decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rebuilding a persisted identity failed.
    #[error("Identity error: {0}")]
    Identity(#[from] geomesh_shared::IdentityError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
