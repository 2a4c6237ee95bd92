//! Shared test harness for Burrow integration tests.
//!
//! Provides [`TestNode`]: a file tree, a pack store and a metadata index
//! wired together the way `burrowd` wires them, rooted in a temporary
//! directory.

use std::path::Path;
use std::sync::Arc;

use burrow_blobstor::{BlobStor, BlobStorConfig, FsTree, LookupMode, PackStore};
use burrow_meta::{GraveMark, MetaBase, MetaError};
use burrow_types::{Address, ContainerId, Object, Partition};
use tempfile::TempDir;

/// Blob stores and index of one storage node.
pub struct TestNode {
    /// Dispatcher over `large` and `small`.
    pub blobs: BlobStor,
    /// Small-object store, shared with the dispatcher.
    pub small: Arc<PackStore>,
    /// Metadata index (Fjall, under the node directory).
    pub meta: MetaBase,
    dir: TempDir,
}

impl TestNode {
    /// Node with default codec and sequential lookups.
    pub fn new() -> Self {
        Self::with_config(BlobStorConfig::default())
    }

    /// Node whose locator-less reads use `lookup`.
    pub fn with_lookup(lookup: LookupMode) -> Self {
        Self::with_config(BlobStorConfig {
            lookup,
            ..BlobStorConfig::default()
        })
    }

    /// Node with an explicit dispatcher configuration.
    pub fn with_config(config: BlobStorConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let (blobs, small) = open_blobs(dir.path(), config);
        let meta = MetaBase::open(dir.path().join("meta")).expect("open meta");
        Self {
            blobs,
            small,
            meta,
            dir,
        }
    }

    /// Root directory of the node.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Reopen both blob stores and the index from disk with `config`.
    pub fn reopen(self, config: BlobStorConfig) -> Self {
        let Self {
            blobs,
            small,
            meta,
            dir,
        } = self;
        drop(blobs);
        drop(small);
        drop(meta);

        let (blobs, small) = open_blobs(dir.path(), config);
        let meta = MetaBase::open(dir.path().join("meta")).expect("reopen meta");
        Self {
            blobs,
            small,
            meta,
            dir,
        }
    }

    /// Store `payload` in the large store and index it.
    pub async fn put_large(
        &self,
        container: ContainerId,
        partition: Partition,
        payload: Vec<u8>,
    ) -> Address {
        let object = Object::new(container, payload);
        self.blobs.put_large(&object).await.expect("put large");
        self.meta
            .insert(partition, &object.address())
            .expect("index");
        object.address()
    }

    /// Store `payload` in pack `locator` and index it.
    pub async fn put_small(
        &self,
        locator: &[u8],
        container: ContainerId,
        partition: Partition,
        payload: Vec<u8>,
    ) -> Address {
        let object = Object::new(container, payload);
        self.blobs
            .put_small(locator, &object)
            .await
            .expect("put small");
        self.meta
            .insert(partition, &object.address())
            .expect("index");
        object.address()
    }

    /// Mark `address` as garbage.
    pub fn inhume(&self, address: &Address) {
        self.meta
            .inhume(address, GraveMark::Garbage)
            .expect("inhume");
    }

    /// Drain the listing with pages of `count`, passing cursors as tokens.
    pub fn list_all(&self, count: u32) -> Vec<Address> {
        let mut out = Vec::new();
        let mut token = String::new();
        loop {
            match self.meta.list_with_token(count, &token) {
                Ok(page) => {
                    out.extend(page.addresses);
                    token = page.cursor.to_string();
                }
                Err(MetaError::EndOfListing) => return out,
                Err(e) => panic!("listing failed: {e}"),
            }
        }
    }
}

impl Default for TestNode {
    fn default() -> Self {
        Self::new()
    }
}

fn open_blobs(root: &Path, config: BlobStorConfig) -> (BlobStor, Arc<PackStore>) {
    let large = FsTree::new(root.join("blobs")).expect("open fs tree");
    let small = PackStore::open(root.join("packs"), config.compressor).expect("open packs");
    let small = Arc::new(small);
    (BlobStor::new(config, Arc::new(large), small.clone()), small)
}

/// Container ids sorted in index order.
pub fn sorted_containers(n: usize) -> Vec<ContainerId> {
    let mut ids: Vec<ContainerId> = (0..n)
        .map(|i| ContainerId::from_data(format!("container-{i}").as_bytes()))
        .collect();
    ids.sort();
    ids
}

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}

/// Generate test data with a specific seed (for unique objects).
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}
