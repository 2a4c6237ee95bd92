//! Error types for blob storage operations.

use std::fmt;

use burrow_types::Address;

/// Which physical backend an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The file tree holding whole large objects.
    Large,
    /// The pack store holding small objects.
    Small,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Large => f.write_str("large store"),
            Backend::Small => f.write_str("small store"),
        }
    }
}

/// Errors that can occur during blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No backend holds the requested object.
    #[error("object not found: {0}")]
    NotFound(Address),

    /// The object exists but the requested window is outside its payload.
    #[error(
        "range out of bounds for {address}: offset {offset} length {length}, payload is {payload_len} bytes"
    )]
    OutOfRange {
        /// The object that was read.
        address: Address,
        /// Requested offset.
        offset: u64,
        /// Requested length.
        length: u64,
        /// Actual payload length.
        payload_len: u64,
    },

    /// Stored bytes could not be decompressed or unmarshaled.
    ///
    /// Never triggers a fallback to another backend.
    #[error("{backend}: corrupt object {address}: {reason}")]
    Integrity {
        /// Backend that returned the bytes.
        backend: Backend,
        /// The object that was read.
        address: Address,
        /// What went wrong.
        reason: String,
    },

    /// An I/O error while reading or writing a specific object.
    #[error("{backend}: io error on {address}: {source}")]
    ObjectIo {
        /// Backend that failed.
        backend: Backend,
        /// The object being accessed.
        address: Address,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O error not tied to a single object (e.g. opening a store).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A pack file on disk could not be decoded when opening the small store.
    #[error("corrupt pack file {}: {source}", path.display())]
    CorruptPack {
        /// Path of the pack file.
        path: std::path::PathBuf,
        /// Decoding error.
        #[source]
        source: postcard::Error,
    },

    /// Object could not be marshaled for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),
}

impl BlobError {
    /// Whether this error means "the object does not exist here".
    ///
    /// This is the only condition that allows the dispatcher to try another
    /// backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }

    /// Whether the object exists but the requested range is invalid.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, BlobError::OutOfRange { .. })
    }

    /// Whether the stored data is corrupt.
    pub fn is_integrity(&self) -> bool {
        matches!(self, BlobError::Integrity { .. })
    }
}
