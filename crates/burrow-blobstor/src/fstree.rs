//! File-based large-object store.
//!
//! Stores one file per object with a 2-level fan-out directory structure
//! keyed by the object identifier:
//! `{base_dir}/{oid[0..2]}/{oid[2..4]}/{cid}.{oid}`.

use std::path::{Path, PathBuf};

use burrow_types::Address;
use bytes::Bytes;
use tracing::debug;

use crate::error::{Backend, BlobError};
use crate::traits::LargeStore;

/// File-based object store with 2-level fan-out directory layout.
///
/// Writes are atomic: data is written to a temporary file first, then
/// renamed into place, so a reader never observes a half-written object.
pub struct FsTree {
    base_dir: PathBuf,
}

impl FsTree {
    /// Create a new file tree rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, BlobError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Compute the full file path for an address.
    fn object_path(&self, address: &Address) -> PathBuf {
        let oid = address.object.to_string();
        self.base_dir
            .join(&oid[0..2])
            .join(&oid[2..4])
            .join(format!("{}.{oid}", address.container))
    }
}

/// Sibling temp file used for atomic writes: `<path>.tmp`.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn object_io(address: Address, source: std::io::Error) -> BlobError {
    BlobError::ObjectIo {
        backend: Backend::Large,
        address,
        source,
    }
}

#[async_trait::async_trait]
impl LargeStore for FsTree {
    async fn put(&self, address: Address, data: Bytes) -> Result<(), BlobError> {
        let path = self.object_path(&address);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| object_io(address, e))?;
        }

        let tmp_path = tmp_path(&path);
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| object_io(address, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| object_io(address, e))?;

        debug!(%address, path = %path.display(), size = data.len(), "stored object to fs tree");
        Ok(())
    }

    async fn get(&self, address: Address) -> Result<Option<Bytes>, BlobError> {
        let path = self.object_path(&address);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(object_io(address, e)),
        }
    }
}
