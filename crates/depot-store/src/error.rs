use depot_types::Oid;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Oid),

    /// Uploaded content does not match the declared pointer size.
    #[error("size mismatch for {oid}: declared {expected} bytes, received {actual}")]
    SizeMismatch { oid: Oid, expected: u64, actual: u64 },

    /// Uploaded content does not hash to the declared oid.
    #[error("hash mismatch: declared {expected}, computed {computed}")]
    HashMismatch { expected: Oid, computed: Oid },

    /// Read requested past the end of the object.
    #[error("offset {offset} is beyond the end of {oid} ({size} bytes)")]
    InvalidOffset { oid: Oid, offset: u64, size: u64 },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for errors that mean "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
