//! Listing cursor codec.
//!
//! A cursor is the partition tag byte followed by the string form of the
//! last address returned: `p<container>/<object>`.

use std::fmt;
use std::str::FromStr;

use burrow_types::{Address, Partition};

use crate::error::CursorError;

/// Resumption point of a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Partition of the last address returned.
    pub partition: Partition,
    /// Last address returned.
    pub address: Address,
}

impl Cursor {
    /// Create a cursor pointing at `address` in `partition`.
    pub fn new(partition: Partition, address: Address) -> Self {
        Self { partition, address }
    }

    /// Parse an opaque token, treating the empty token as "start of listing".
    pub fn parse_token(token: &str) -> Result<Option<Self>, CursorError> {
        if token.is_empty() {
            return Ok(None);
        }
        token.parse().map(Some)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(self.partition.tag()), self.address)
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let tag = chars.next().ok_or(CursorError::Empty)?;
        let partition = u8::try_from(tag)
            .ok()
            .and_then(Partition::from_tag)
            .ok_or(CursorError::UnknownTag(tag))?;
        let address = chars.as_str().parse()?;
        Ok(Self { partition, address })
    }
}
