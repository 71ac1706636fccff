use std::io;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is empty or cannot be mapped to a file name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Persisting an entry failed. The previous entry, if any, is untouched.
    #[error("failed to write entry {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Reading an entry failed for a reason other than the entry being absent.
    #[error("failed to read entry {key:?}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    /// The stored payload is corrupt or cannot become the requested shape.
    #[error("cannot decode entry {key:?}: {reason}")]
    Deserialization { key: String, reason: String },

    /// The value could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller tried to store a value that encodes to `null`.
    #[error("cannot write a null root value")]
    NullRootValue,

    /// Encrypting or decrypting a payload failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Store-wide I/O error (listing or destroying the store).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        Self::Deserialization {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
