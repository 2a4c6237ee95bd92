//! Small-object store grouping objects into named packs.
//!
//! Each pack is one file `{base_dir}/{hex(locator)}.pack` holding the
//! postcard-encoded map of its records. Packs are loaded when the store is
//! opened and rewritten atomically (tmp + rename) on every put.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use burrow_types::{Address, Object, Range};
use bytes::Bytes;
use tracing::{debug, error};

use crate::codec::{Compressor, slice_payload};
use crate::error::{Backend, BlobError};
use crate::fstree::tmp_path;
use crate::traits::SmallStore;

/// File extension of persisted packs.
const PACK_EXTENSION: &str = "pack";

/// Encoded records of one pack, keyed by address.
type Pack = HashMap<Address, Vec<u8>>;

/// Small-object store that groups encoded objects into named packs.
///
/// The locator of an object is the name of its pack. Reads without a
/// locator search every pack in ascending locator order.
pub struct PackStore {
    packs: RwLock<BTreeMap<Vec<u8>, Pack>>,
    compressor: Compressor,
    /// Directory of pack files; `None` keeps packs in memory only.
    base_dir: Option<PathBuf>,
    /// Serializes pack file rewrites so the last put always lands last.
    flush: tokio::sync::Mutex<()>,
}

impl PackStore {
    /// Create an empty, memory-only pack store.
    pub fn new(compressor: Compressor) -> Self {
        Self {
            packs: RwLock::new(BTreeMap::new()),
            compressor,
            base_dir: None,
            flush: tokio::sync::Mutex::new(()),
        }
    }

    /// Open a pack store persisted under `base_dir`, loading every pack file.
    ///
    /// The directory is created if it does not exist.
    pub fn open(base_dir: impl AsRef<Path>, compressor: Compressor) -> Result<Self, BlobError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;

        let mut packs = BTreeMap::new();
        for entry in std::fs::read_dir(&base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PACK_EXTENSION) {
                continue;
            }
            let Some(locator) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| hex::decode(s).ok())
            else {
                debug!(path = %path.display(), "ignoring file with non-hex pack name");
                continue;
            };

            let raw = std::fs::read(&path)?;
            let pack: Pack = postcard::from_bytes(&raw).map_err(|source| {
                error!(path = %path.display(), %source, "corrupt pack file");
                BlobError::CorruptPack {
                    path: path.clone(),
                    source,
                }
            })?;
            packs.insert(locator, pack);
        }

        debug!(path = %base_dir.display(), packs = packs.len(), "opened pack store");
        Ok(Self {
            packs: RwLock::new(packs),
            compressor,
            base_dir: Some(base_dir),
            flush: tokio::sync::Mutex::new(()),
        })
    }

    /// Locator of the first pack holding `address`, if any.
    pub fn locate(&self, address: &Address) -> Option<Vec<u8>> {
        let packs = self.packs.read().expect("lock poisoned");
        packs
            .iter()
            .find(|(_, pack)| pack.contains_key(address))
            .map(|(locator, _)| locator.clone())
    }

    /// Number of packs currently holding at least one object.
    pub fn pack_count(&self) -> usize {
        self.packs.read().expect("lock poisoned").len()
    }

    /// Return a reference to the inner map (for testing purposes).
    #[cfg(test)]
    pub(crate) fn inner(&self) -> &RwLock<BTreeMap<Vec<u8>, Pack>> {
        &self.packs
    }

    /// Find the encoded record for `address`, optionally restricted to one pack.
    fn find_raw(&self, address: Address, locator: Option<&[u8]>) -> Result<Vec<u8>, BlobError> {
        let packs = self.packs.read().expect("lock poisoned");
        let found = match locator {
            Some(locator) => packs.get(locator).and_then(|pack| pack.get(&address)),
            None => packs.values().find_map(|pack| pack.get(&address)),
        };
        found.cloned().ok_or(BlobError::NotFound(address))
    }
}

fn pack_path(base_dir: &Path, locator: &[u8]) -> PathBuf {
    base_dir.join(format!("{}.{PACK_EXTENSION}", hex::encode(locator)))
}

impl Default for PackStore {
    fn default() -> Self {
        Self::new(Compressor::default())
    }
}

#[async_trait::async_trait]
impl SmallStore for PackStore {
    async fn put(&self, locator: &[u8], object: &Object) -> Result<(), BlobError> {
        let raw = self.compressor.encode_object(object)?;
        let address = object.address();
        debug!(%address, pack = %hex::encode(locator), size = raw.len(), "storing object in pack");

        let _flush = self.flush.lock().await;
        let encoded = {
            let mut packs = self.packs.write().expect("lock poisoned");
            let pack = packs.entry(locator.to_vec()).or_default();
            pack.insert(address, raw);
            match &self.base_dir {
                Some(_) => Some(postcard::to_allocvec(pack)?),
                None => None,
            }
        };

        if let (Some(base_dir), Some(encoded)) = (&self.base_dir, encoded) {
            let path = pack_path(base_dir, locator);
            let tmp = tmp_path(&path);
            let io = |source| BlobError::ObjectIo {
                backend: Backend::Small,
                address,
                source,
            };
            tokio::fs::write(&tmp, &encoded).await.map_err(io)?;
            tokio::fs::rename(&tmp, &path).await.map_err(io)?;
        }
        Ok(())
    }

    async fn get(&self, address: Address, locator: Option<&[u8]>) -> Result<Object, BlobError> {
        let raw = self.find_raw(address, locator)?;
        self.compressor.decode_object(&raw, Backend::Small, address)
    }

    async fn get_range(
        &self,
        address: Address,
        range: Range,
        locator: Option<&[u8]>,
    ) -> Result<Bytes, BlobError> {
        let object = self.get(address, locator).await?;
        slice_payload(object, range)
    }
}
