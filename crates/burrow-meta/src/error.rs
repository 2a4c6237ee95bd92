//! Error types for the metadata index.

use burrow_types::AddressParseError;

/// Errors returned when decoding a listing cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor token is empty.
    #[error("empty cursor")]
    Empty,

    /// The leading byte is not a known partition tag.
    #[error("invalid cursor prefix {0:?}")]
    UnknownTag(char),

    /// The remainder is not a valid address.
    #[error("invalid cursor address: {0}")]
    Address(#[from] AddressParseError),
}

/// Errors returned by [`MetaBase`](crate::MetaBase) operations.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The listing cursor could not be decoded.
    #[error("{0}")]
    InvalidCursor(#[from] CursorError),

    /// A listing was requested with a page size of zero.
    #[error("listing count must be greater than zero")]
    InvalidCount,

    /// The listing has no more addresses past the given cursor.
    #[error("end of listing")]
    EndOfListing,
}

impl MetaError {
    /// Whether this is the end-of-listing sentinel rather than a failure.
    pub fn is_end_of_listing(&self) -> bool {
        matches!(self, MetaError::EndOfListing)
    }
}
