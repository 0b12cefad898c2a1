//! Error types for the catseye-nn library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, training or persisting a network.
#[derive(Error, Debug)]
pub enum Error {
    /// A persisted weight source was named but could not be opened or read.
    /// No network is produced.
    #[error("cannot construct network from {}: {source}", path.display())]
    Construction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The save destination could not be written. The previous file (if any)
    /// is left untouched.
    #[error("cannot write weights to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A weight file or dataset was readable but its contents were malformed.
    #[error("{origin}: {message}")]
    Parse { origin: String, message: String },

    /// Wrong input length, out-of-range label, zero layer size and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}
