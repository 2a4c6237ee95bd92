//! Contracts the physical backends must satisfy.

use burrow_types::{Address, Object, Range};
use bytes::Bytes;

use crate::error::BlobError;

/// Content-addressed storage of whole compressed, marshaled objects.
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait::async_trait]
pub trait LargeStore: Send + Sync {
    /// Store raw (already encoded) bytes under `address`.
    async fn put(&self, address: Address, data: Bytes) -> Result<(), BlobError>;

    /// Retrieve the raw bytes stored under `address`. Returns `None` if not found.
    async fn get(&self, address: Address) -> Result<Option<Bytes>, BlobError>;
}

/// Storage that packs many small objects into locator-addressed containers.
///
/// A `None` locator means the caller does not know where the object lives
/// and every container may be searched.
#[async_trait::async_trait]
pub trait SmallStore: Send + Sync {
    /// Store `object` inside the container named by `locator`.
    async fn put(&self, locator: &[u8], object: &Object) -> Result<(), BlobError>;

    /// Read a whole object.
    ///
    /// Returns [`BlobError::NotFound`] if no searched container holds it.
    async fn get(&self, address: Address, locator: Option<&[u8]>) -> Result<Object, BlobError>;

    /// Read a window of an object's payload.
    ///
    /// Returns [`BlobError::NotFound`] if no searched container holds the
    /// object and [`BlobError::OutOfRange`] if the window is invalid.
    async fn get_range(
        &self,
        address: Address,
        range: Range,
        locator: Option<&[u8]>,
    ) -> Result<Bytes, BlobError>;
}
