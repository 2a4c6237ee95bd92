//! Compression and object marshaling for stored records.
//!
//! Objects are marshaled with postcard and optionally compressed with zstd.
//! Decompression sniffs the zstd frame magic, so data written while
//! compression was disabled stays readable after it is enabled.

use burrow_types::{Address, Object, Range};
use bytes::Bytes;
use tracing::error;

use crate::error::{Backend, BlobError};

/// Leading bytes of every zstd frame.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// Default zstd compression level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Reversible byte-stream compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compressor {
    enabled: bool,
    level: i32,
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl Compressor {
    /// Create a compressor. When `enabled` is false, [`compress`](Self::compress)
    /// is the identity.
    pub fn new(enabled: bool, level: i32) -> Self {
        Self { enabled, level }
    }

    /// A compressor that never compresses (but still decompresses).
    pub fn disabled() -> Self {
        Self::new(false, DEFAULT_COMPRESSION_LEVEL)
    }

    /// Compress `data` if compression is enabled.
    pub fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        if !self.enabled {
            return Ok(data.to_vec());
        }
        zstd::encode_all(data, self.level)
    }

    /// Decompress `data` if it is a zstd frame, otherwise return it unchanged.
    pub fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        if !data.starts_with(&ZSTD_MAGIC) {
            return Ok(data.to_vec());
        }
        zstd::decode_all(data)
    }

    /// Marshal and compress an object for storage.
    pub fn encode_object(&self, object: &Object) -> Result<Vec<u8>, BlobError> {
        let marshaled = postcard::to_allocvec(object)?;
        Ok(self.compress(&marshaled)?)
    }

    /// Decompress and unmarshal stored bytes read for `address`.
    ///
    /// Any failure, including a record that decodes to a different address,
    /// is reported as [`BlobError::Integrity`].
    pub fn decode_object(
        &self,
        raw: &[u8],
        backend: Backend,
        address: Address,
    ) -> Result<Object, BlobError> {
        let data = self
            .decompress(raw)
            .map_err(|e| integrity(backend, address, format!("could not decompress: {e}")))?;
        let object: Object = postcard::from_bytes(&data)
            .map_err(|e| integrity(backend, address, format!("could not unmarshal: {e}")))?;
        if object.address() != address {
            return Err(integrity(
                backend,
                address,
                format!("record holds {}", object.address()),
            ));
        }
        Ok(object)
    }
}

fn integrity(backend: Backend, address: Address, reason: String) -> BlobError {
    error!(%address, %backend, %reason, "stored object failed integrity check");
    BlobError::Integrity {
        backend,
        address,
        reason,
    }
}

/// Cut `range` out of an object's payload, checking bounds.
pub(crate) fn slice_payload(object: Object, range: Range) -> Result<Bytes, BlobError> {
    let address = object.address();
    let payload_len = object.payload.len();
    match range.resolve(payload_len) {
        Some(window) => Ok(Bytes::from(object.payload).slice(window)),
        None => Err(BlobError::OutOfRange {
            address,
            offset: range.offset,
            length: range.length,
            payload_len: payload_len as u64,
        }),
    }
}
