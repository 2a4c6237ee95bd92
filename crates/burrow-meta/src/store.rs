//! [`MetaBase`] implementation over Fjall or an in-memory map.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use burrow_types::{Address, Partition};
use fjall::{Database, Keyspace, KeyspaceCreateOptions, Readable, Snapshot};
use tracing::debug;

use crate::MetaError;
use crate::keys;

pub(crate) type Result<T> = std::result::Result<T, MetaError>;

/// Graveyard marker recorded for a soft-deleted address.
///
/// Any marker other than [`GraveMark::Cleared`] hides the address from
/// listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraveMark {
    /// The address was revived; it is listed again.
    Cleared,
    /// The address is covered by a tombstone.
    Tombstoned,
    /// The address is marked as garbage awaiting removal.
    Garbage,
}

impl GraveMark {
    /// Byte stored as the graveyard value.
    pub fn to_byte(self) -> u8 {
        match self {
            GraveMark::Cleared => 0,
            GraveMark::Tombstoned => 1,
            GraveMark::Garbage => 2,
        }
    }
}

/// Inner backend: either Fjall-backed (disk) or pure in-memory.
enum Backend {
    Fjall {
        db: Database,
        index: Keyspace,
        graveyard: Keyspace,
        /// Directory backing a temporary database, removed on drop.
        #[allow(dead_code)]
        tmp: Option<tempfile::TempDir>,
    },
    Memory(Box<MemoryBackend>),
}

/// Index and graveyard contents of the in-memory backend.
#[derive(Clone, Default)]
pub(crate) struct Tables {
    index: BTreeSet<Vec<u8>>,
    graveyard: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Pure in-memory storage.
///
/// Writers copy the tables when a reader still holds the previous version,
/// so a [`ReadView`] is a true point-in-time snapshot.
struct MemoryBackend {
    tables: RwLock<Arc<Tables>>,
}

/// Metadata index of stored objects.
///
/// Holds, per container, the primary, tombstone and storage-group partitions,
/// plus a global graveyard of soft-deleted addresses.
pub struct MetaBase {
    backend: Backend,
}

impl MetaBase {
    /// Open a persistent index at the given path (Fjall backend).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_fjall(db, None)
    }

    /// Open a temporary Fjall-backed index that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_fjall(db, Some(tmp))
    }

    /// Create a pure in-memory index.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Box::new(MemoryBackend {
                tables: RwLock::new(Arc::new(Tables::default())),
            })),
        }
    }

    fn init_fjall(db: Database, tmp: Option<tempfile::TempDir>) -> Result<Self> {
        let index = db.keyspace("index", KeyspaceCreateOptions::default)?;
        let graveyard = db.keyspace("graveyard", KeyspaceCreateOptions::default)?;
        Ok(Self {
            backend: Backend::Fjall {
                db,
                index,
                graveyard,
                tmp,
            },
        })
    }

    // ----- Partitions -----

    /// Record `address` in the given partition of its container.
    pub fn insert(&self, partition: Partition, address: &Address) -> Result<()> {
        self.insert_index_key(keys::index_key(partition, address))?;
        debug!(%address, %partition, "indexed object");
        Ok(())
    }

    /// Remove `address` from the given partition of its container.
    pub fn remove(&self, partition: Partition, address: &Address) -> Result<()> {
        let key = keys::index_key(partition, address);
        match &self.backend {
            Backend::Fjall { index, .. } => {
                index.remove(key.as_slice())?;
            }
            Backend::Memory(m) => {
                m.write(|t| {
                    t.index.remove(&key);
                });
            }
        }
        debug!(%address, %partition, "removed object from index");
        Ok(())
    }

    pub(crate) fn insert_index_key(&self, key: Vec<u8>) -> Result<()> {
        match &self.backend {
            Backend::Fjall { index, .. } => {
                let empty: &[u8] = &[];
                index.insert(key.as_slice(), empty)?;
            }
            Backend::Memory(m) => {
                m.write(|t| {
                    t.index.insert(key);
                });
            }
        }
        Ok(())
    }

    // ----- Graveyard -----

    /// Record a graveyard marker for `address`.
    pub fn inhume(&self, address: &Address, mark: GraveMark) -> Result<()> {
        self.put_graveyard_marker(address, &[mark.to_byte()])?;
        debug!(%address, ?mark, "updated graveyard");
        Ok(())
    }

    pub(crate) fn put_graveyard_marker(&self, address: &Address, value: &[u8]) -> Result<()> {
        let key = keys::graveyard_key(address);
        match &self.backend {
            Backend::Fjall { graveyard, .. } => {
                graveyard.insert(key.as_slice(), value)?;
            }
            Backend::Memory(m) => {
                m.write(|t| {
                    t.graveyard.insert(key, value.to_vec());
                });
            }
        }
        Ok(())
    }

    /// Raw graveyard marker of `address`, if one is recorded.
    pub fn graveyard_status(&self, address: &Address) -> Result<Option<u8>> {
        self.read_view()
            .graveyard_marker(&keys::graveyard_key(address))
    }

    /// Whether `address` is soft-deleted: a marker exists and is positive.
    pub fn is_inhumed(&self, address: &Address) -> Result<bool> {
        Ok(self.graveyard_status(address)?.is_some_and(|m| m > 0))
    }

    // ----- Reads -----

    /// Open a point-in-time read view over the index and graveyard.
    pub(crate) fn read_view(&self) -> ReadView<'_> {
        match &self.backend {
            Backend::Fjall {
                db,
                index,
                graveyard,
                ..
            } => ReadView::Fjall {
                snapshot: db.snapshot(),
                index,
                graveyard,
            },
            Backend::Memory(m) => {
                ReadView::Memory(Arc::clone(&m.tables.read().expect("lock poisoned")))
            }
        }
    }
}

impl MemoryBackend {
    fn write(&self, f: impl FnOnce(&mut Tables)) {
        let mut tables = self.tables.write().expect("lock poisoned");
        f(Arc::make_mut(&mut tables));
    }
}

/// Snapshot of the index and graveyard, held for the duration of one call.
pub(crate) enum ReadView<'a> {
    Fjall {
        snapshot: Snapshot,
        index: &'a Keyspace,
        graveyard: &'a Keyspace,
    },
    Memory(Arc<Tables>),
}

impl ReadView<'_> {
    /// Index keys in ascending order, starting at the first key `>= from`.
    pub(crate) fn keys_from(&self, from: &[u8]) -> Box<dyn Iterator<Item = Result<Vec<u8>>> + '_> {
        match self {
            ReadView::Fjall {
                snapshot, index, ..
            } => Box::new(
                snapshot
                    .range(*index, from.to_vec()..)
                    .map(|guard| -> Result<Vec<u8>> { Ok(guard.key()?.to_vec()) }),
            ),
            ReadView::Memory(tables) => {
                Box::new(tables.index.range(from.to_vec()..).map(|k| Ok(k.clone())))
            }
        }
    }

    /// First index key `>= from`.
    pub(crate) fn first_key_from(&self, from: &[u8]) -> Result<Option<Vec<u8>>> {
        self.keys_from(from).next().transpose()
    }

    /// Graveyard marker byte stored under `key`.
    ///
    /// A present but empty value reads as marker `0`.
    pub(crate) fn graveyard_marker(&self, key: &[u8]) -> Result<Option<u8>> {
        let value = match self {
            ReadView::Fjall {
                snapshot,
                graveyard,
                ..
            } => snapshot.get(*graveyard, key)?.map(|v| v.to_vec()),
            ReadView::Memory(tables) => tables.graveyard.get(key).cloned(),
        };
        Ok(value.map(|v| v.first().copied().unwrap_or(0)))
    }
}
