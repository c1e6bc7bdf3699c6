// src/store/error.rs
// =============================================================================
// Errors the link store can return.
//
// Io and Decode at load time mean the store could not be opened and the
// process should not start. During a mutation they are reported to the
// caller and the in-memory set is left as it was before the call.
// =============================================================================

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode links: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Link not found: {0}")]
    NotFound(String),

    #[error("A link with id {0} already exists")]
    AlreadyExists(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
