//! Cursor-paginated listing over every container of the index.

use std::collections::HashSet;

use burrow_types::{Address, ContainerId, ObjectId, Partition};
use tracing::{debug, warn};

use crate::cursor::Cursor;
use crate::keys;
use crate::store::{ReadView, Result};
use crate::{MetaBase, MetaError};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    /// Live addresses in (container, partition, key) order.
    pub addresses: Vec<Address>,
    /// Position of the last returned address; pass it back to continue.
    pub cursor: Cursor,
    /// Set when a malformed index key cut a partition scan short.
    pub truncated: bool,
}

impl MetaBase {
    /// List up to `count` live addresses, resuming after `cursor`.
    ///
    /// Containers are visited in ascending key order and, inside each
    /// container, partitions in the order primary, tombstone, storage-group.
    /// Addresses with a positive graveyard marker are skipped without using
    /// a result slot.
    ///
    /// Returns [`MetaError::EndOfListing`] when nothing is left to return and
    /// [`MetaError::InvalidCount`] when `count` is zero.
    pub fn list_with_cursor(&self, count: u32, cursor: Option<&Cursor>) -> Result<ListPage> {
        if count == 0 {
            return Err(MetaError::InvalidCount);
        }

        let view = self.read_view();
        let mut scan = Scan::new(&view, count as usize);
        let mut resume = cursor.copied();
        let mut seen = HashSet::new();
        let mut from = resume
            .map(|c| keys::container_prefix(&c.address.container))
            .unwrap_or_default();

        while let Some(key) = view.first_key_from(&from)? {
            let Some(name) = keys::container_name(&key) else {
                from = keys::next_key(&key);
                continue;
            };
            from = keys::next_container(name);

            let Some(name) = std::str::from_utf8(name).ok() else {
                continue;
            };
            if !seen.insert(name.to_owned()) {
                continue;
            }
            let Ok(container) = name.parse::<ContainerId>() else {
                debug!(container = name, "skipping unparsable container");
                continue;
            };

            // The cursor only applies to the container it was issued for.
            let start = resume.take().filter(|c| c.address.container == container);
            if scan.container(container, start)? {
                break;
            }
        }

        scan.finish()
    }

    /// List from an opaque cursor token; the empty token starts from the
    /// beginning.
    pub fn list_with_token(&self, count: u32, token: &str) -> Result<ListPage> {
        let cursor = Cursor::parse_token(token)?;
        self.list_with_cursor(count, cursor.as_ref())
    }
}

/// Accumulator for a single listing call.
struct Scan<'v, 'a> {
    view: &'v ReadView<'a>,
    limit: usize,
    addresses: Vec<Address>,
    last: Option<Cursor>,
    truncated: bool,
}

impl<'v, 'a> Scan<'v, 'a> {
    fn new(view: &'v ReadView<'a>, limit: usize) -> Self {
        Self {
            view,
            limit,
            addresses: Vec::new(),
            last: None,
            truncated: false,
        }
    }

    /// Scan every partition of `container`. Returns `true` once the page is full.
    fn container(&mut self, container: ContainerId, resume: Option<Cursor>) -> Result<bool> {
        for partition in Partition::ALL {
            let start = match resume {
                Some(c) if partition < c.partition => continue,
                Some(c) if partition == c.partition => {
                    keys::next_key(&keys::index_key(partition, &c.address))
                }
                _ => keys::partition_prefix(&container, partition),
            };
            if self.partition(container, partition, &start)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn partition(
        &mut self,
        container: ContainerId,
        partition: Partition,
        start: &[u8],
    ) -> Result<bool> {
        let view = self.view;
        let prefix = keys::partition_prefix(&container, partition);

        for key in view.keys_from(start) {
            let key = key?;
            if !key.starts_with(&prefix) {
                break;
            }

            let Some(object) = std::str::from_utf8(&key[prefix.len()..])
                .ok()
                .and_then(|s| s.parse::<ObjectId>().ok())
            else {
                warn!(
                    %container,
                    %partition,
                    key = %String::from_utf8_lossy(&key),
                    "malformed index key, stopping partition scan"
                );
                self.truncated = true;
                break;
            };

            let address = Address::new(container, object);
            let marker = view.graveyard_marker(&keys::graveyard_key(&address))?;
            if marker.is_some_and(|m| m > 0) {
                continue;
            }

            self.addresses.push(address);
            self.last = Some(Cursor::new(partition, address));
            if self.addresses.len() >= self.limit {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn finish(self) -> Result<ListPage> {
        let cursor = self.last.ok_or(MetaError::EndOfListing)?;
        debug!(
            count = self.addresses.len(),
            truncated = self.truncated,
            %cursor,
            "listed index page"
        );
        Ok(ListPage {
            addresses: self.addresses,
            cursor,
            truncated: self.truncated,
        })
    }
}
