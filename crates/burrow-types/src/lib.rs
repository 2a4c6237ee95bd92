//! Shared types and identifiers for Burrow.
//!
//! This crate defines the core types used across the Burrow workspace:
//! identifiers ([`ContainerId`], [`ObjectId`], [`Address`]),
//! read parameters ([`Range`], [`StorageId`]),
//! the stored record ([`Object`]) and the index partitions ([`Partition`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

/// Length of an identifier rendered as hex.
pub const ID_HEX_LEN: usize = 64;

/// Separator between the container and object parts of an [`Address`].
pub const ADDRESS_SEPARATOR: char = '/';

/// Errors returned when parsing identifiers and addresses from strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The identifier does not have exactly [`ID_HEX_LEN`] characters.
    #[error("invalid identifier length: expected {ID_HEX_LEN} hex characters, found {0}")]
    InvalidLength(usize),

    /// The identifier contains a non-hex character.
    #[error("invalid identifier: {0}")]
    InvalidHex(String),

    /// The address has no `/` between container and object.
    #[error("missing '/' separator in address {0:?}")]
    MissingSeparator(String),
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create an ID by hashing arbitrary data with BLAKE3.
            pub fn from_data(data: &[u8]) -> Self {
                Self(blake3::hash(data).into())
            }

            /// Return the raw 32-byte representation.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = AddressParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != ID_HEX_LEN {
                    return Err(AddressParseError::InvalidLength(s.len()));
                }
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
                Ok(Self(bytes))
            }
        }
    };
}

define_id!(
    /// Identifier of a container: the namespace objects are grouped under.
    ContainerId
);

define_id!(
    /// Identifier of an object inside its container.
    ObjectId
);

/// Globally unique location of an object: container plus object identifier.
///
/// The canonical string form is `<container>/<object>`, both parts rendered
/// as lowercase hex. Hex never contains `/`, so the form is unambiguous and
/// [`Address::from_str`] inverts [`Address::to_string`] exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address {
    /// Container the object belongs to.
    pub container: ContainerId,
    /// Object identifier within the container.
    pub object: ObjectId,
}

impl Address {
    /// Build an address from its two components.
    pub fn new(container: ContainerId, object: ObjectId) -> Self {
        Self { container, object }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ADDRESS_SEPARATOR}{}", self.container, self.object)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (container, object) = s
            .split_once(ADDRESS_SEPARATOR)
            .ok_or_else(|| AddressParseError::MissingSeparator(s.to_string()))?;
        Ok(Self {
            container: container.parse()?,
            object: object.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Read parameters
// ---------------------------------------------------------------------------

/// A window over an object's payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    /// First byte of the window.
    pub offset: u64,
    /// Number of bytes in the window.
    pub length: u64,
}

impl Range {
    /// Create a range of `length` bytes starting at `offset`.
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Resolve this range against a payload of `payload_len` bytes.
    ///
    /// Returns `None` when `offset + length` overflows or runs past the end
    /// of the payload.
    pub fn resolve(&self, payload_len: usize) -> Option<std::ops::Range<usize>> {
        let end = self.offset.checked_add(self.length)?;
        if end > payload_len as u64 {
            return None;
        }
        // Both bounds are <= payload_len, so they fit in usize.
        Some(self.offset as usize..end as usize)
    }
}

/// Backend selection hint attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageId {
    /// Location unknown: try the large store, then the small store.
    #[default]
    Unknown,
    /// The object lives in the large store.
    Large,
    /// The object lives in the small store under this opaque locator.
    Small(Vec<u8>),
}

impl StorageId {
    /// Map a raw, optionally empty locator to a [`StorageId`].
    ///
    /// An absent locator means unknown; an empty one historically marks the
    /// large store.
    pub fn from_raw(raw: Option<&[u8]>) -> Self {
        match raw {
            None => Self::Unknown,
            Some([]) => Self::Large,
            Some(locator) => Self::Small(locator.to_vec()),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// A stored object as recovered from a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Container the object belongs to.
    pub container: ContainerId,
    /// Object identifier within the container.
    pub id: ObjectId,
    /// Object payload.
    pub payload: Vec<u8>,
}

impl Object {
    /// Build an object whose identifier is derived from its payload.
    pub fn new(container: ContainerId, payload: Vec<u8>) -> Self {
        Self {
            container,
            id: ObjectId::from_data(&payload),
            payload,
        }
    }

    /// Address of this object.
    pub fn address(&self) -> Address {
        Address::new(self.container, self.id)
    }
}

/// Logical sub-category of addresses within a container's index.
///
/// The declaration order is the enumeration order used by listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Partition {
    /// Regular objects.
    Primary,
    /// Tombstone objects.
    Tombstone,
    /// Storage group objects.
    StorageGroup,
}

impl Partition {
    /// All partitions in enumeration order.
    pub const ALL: [Partition; 3] = [
        Partition::Primary,
        Partition::Tombstone,
        Partition::StorageGroup,
    ];

    /// Single-byte tag identifying the partition in keys and cursors.
    pub fn tag(self) -> u8 {
        match self {
            Partition::Primary => b'p',
            Partition::Tombstone => b't',
            Partition::StorageGroup => b's',
        }
    }

    /// Inverse of [`Partition::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'p' => Some(Partition::Primary),
            b't' => Some(Partition::Tombstone),
            b's' => Some(Partition::StorageGroup),
            _ => None,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partition::Primary => "primary",
            Partition::Tombstone => "tombstone",
            Partition::StorageGroup => "storage-group",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
