//! Blob storage for object payloads.
//!
//! This crate defines the backend contracts and the dispatcher that routes
//! payload reads between them:
//!
//! - [`LargeStore`] / [`FsTree`] — whole compressed objects, one file each.
//! - [`SmallStore`] / [`PackStore`] — small objects packed into named packs.
//! - [`BlobStor`] — picks the backend from a [`StorageId`](burrow_types::StorageId)
//!   and performs bounds-checked range reads.

mod blobstor;
mod codec;
mod error;
mod fstree;
mod pack_store;
mod traits;

pub use blobstor::{BlobStor, BlobStorConfig, LookupMode};
pub use codec::{Compressor, DEFAULT_COMPRESSION_LEVEL};
pub use error::{Backend, BlobError};
pub use fstree::FsTree;
pub use pack_store::PackStore;
pub use traits::{LargeStore, SmallStore};
