//! Dispatcher that routes reads to the large or small store.

use std::sync::Arc;

use burrow_types::{Address, Object, Range, StorageId};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::codec::{Compressor, slice_payload};
use crate::error::{Backend, BlobError};
use crate::traits::{LargeStore, SmallStore};

/// How reads without a storage hint reach the two backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Large store first, small store only if the large store has no such object.
    #[default]
    Sequential,
    /// Query both stores at once and resolve with the sequential precedence.
    Race,
}

/// Configuration for a [`BlobStor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobStorConfig {
    /// Codec used for large-store records.
    pub compressor: Compressor,
    /// Lookup strategy for reads with an unknown storage hint.
    pub lookup: LookupMode,
}

/// Read-side front of the two physical backends.
///
/// Routing by [`StorageId`]:
/// - [`StorageId::Unknown`]: large store, then small store on `NotFound`.
///   Any other large-store error is returned as is.
/// - [`StorageId::Large`]: large store only.
/// - [`StorageId::Small`]: small store only, with the locator.
pub struct BlobStor {
    large: Arc<dyn LargeStore>,
    small: Arc<dyn SmallStore>,
    config: BlobStorConfig,
}

impl BlobStor {
    /// Create a dispatcher over the given backends.
    pub fn new(
        config: BlobStorConfig,
        large: Arc<dyn LargeStore>,
        small: Arc<dyn SmallStore>,
    ) -> Self {
        Self {
            large,
            small,
            config,
        }
    }

    /// Encode `object` and store it in the large store.
    pub async fn put_large(&self, object: &Object) -> Result<(), BlobError> {
        let raw = self.config.compressor.encode_object(object)?;
        self.large.put(object.address(), Bytes::from(raw)).await
    }

    /// Store `object` in the small store under `locator`.
    pub async fn put_small(&self, locator: &[u8], object: &Object) -> Result<(), BlobError> {
        self.small.put(locator, object).await
    }

    /// Read `range` of the payload of the object at `address`.
    ///
    /// Fails with [`BlobError::NotFound`] when no consulted backend holds the
    /// object and with [`BlobError::OutOfRange`] when it exists but the
    /// window does not fit its payload.
    pub async fn get_range(
        &self,
        address: Address,
        range: Range,
        storage_id: &StorageId,
    ) -> Result<Bytes, BlobError> {
        match storage_id {
            StorageId::Large => self.get_range_large(address, range).await,
            StorageId::Small(locator) => {
                self.small
                    .get_range(address, range, Some(locator.as_slice()))
                    .await
            }
            StorageId::Unknown => match self.config.lookup {
                LookupMode::Sequential => match self.get_range_large(address, range).await {
                    Err(e) if e.is_not_found() => {
                        debug!(%address, "not in large store, trying small store");
                        self.small.get_range(address, range, None).await
                    }
                    other => other,
                },
                LookupMode::Race => {
                    race(
                        self.get_range_large(address, range),
                        self.small.get_range(address, range, None),
                    )
                    .await
                }
            },
        }
    }

    /// Read the whole object at `address`, with the same routing as
    /// [`get_range`](Self::get_range).
    pub async fn get(&self, address: Address, storage_id: &StorageId) -> Result<Object, BlobError> {
        match storage_id {
            StorageId::Large => self.get_large(address).await,
            StorageId::Small(locator) => self.small.get(address, Some(locator.as_slice())).await,
            StorageId::Unknown => match self.config.lookup {
                LookupMode::Sequential => match self.get_large(address).await {
                    Err(e) if e.is_not_found() => {
                        debug!(%address, "not in large store, trying small store");
                        self.small.get(address, None).await
                    }
                    other => other,
                },
                LookupMode::Race => {
                    race(self.get_large(address), self.small.get(address, None)).await
                }
            },
        }
    }

    /// Fetch, decompress and unmarshal an object from the large store.
    async fn get_large(&self, address: Address) -> Result<Object, BlobError> {
        let raw = self
            .large
            .get(address)
            .await?
            .ok_or(BlobError::NotFound(address))?;
        self.config
            .compressor
            .decode_object(&raw, Backend::Large, address)
    }

    async fn get_range_large(&self, address: Address, range: Range) -> Result<Bytes, BlobError> {
        let object = self.get_large(address).await?;
        slice_payload(object, range)
    }
}

/// Run both lookups at once, resolving with sequential precedence.
///
/// The small-store result only counts when the large store reported
/// `NotFound`. Any other large-store result is returned as soon as it is
/// known, dropping the pending small-store lookup.
async fn race<T>(
    large: impl Future<Output = Result<T, BlobError>>,
    small: impl Future<Output = Result<T, BlobError>>,
) -> Result<T, BlobError> {
    tokio::pin!(large, small);
    tokio::select! {
        biased;
        res = &mut large => match res {
            Err(e) if e.is_not_found() => small.await,
            other => other,
        },
        res = &mut small => match large.await {
            Err(e) if e.is_not_found() => res,
            other => other,
        },
    }
}
