//! Key layout of the `index` and `graveyard` keyspaces.
//!
//! Index keys are `<container>/<tag><object>` with an empty value, so each
//! container owns three contiguous key ranges, one per partition.
//! Graveyard keys are the address string `<container>/<object>` with a
//! one-byte marker value.

use burrow_types::{ADDRESS_SEPARATOR, Address, ContainerId, Partition};

const SEPARATOR: u8 = ADDRESS_SEPARATOR as u8;

/// `<container>/`: prefix shared by every index key of a container.
pub(crate) fn container_prefix(container: &ContainerId) -> Vec<u8> {
    let mut key = container.to_string().into_bytes();
    key.push(SEPARATOR);
    key
}

/// `<container>/<tag>`: prefix of one partition's key range.
pub(crate) fn partition_prefix(container: &ContainerId, partition: Partition) -> Vec<u8> {
    let mut key = container_prefix(container);
    key.push(partition.tag());
    key
}

/// Full index key of `address` in `partition`.
pub(crate) fn index_key(partition: Partition, address: &Address) -> Vec<u8> {
    let mut key = partition_prefix(&address.container, partition);
    key.extend_from_slice(address.object.to_string().as_bytes());
    key
}

/// Graveyard key of `address`.
pub(crate) fn graveyard_key(address: &Address) -> Vec<u8> {
    address.to_string().into_bytes()
}

/// Container name of an index key: the bytes before the first separator.
pub(crate) fn container_name(key: &[u8]) -> Option<&[u8]> {
    key.iter()
        .position(|&b| b == SEPARATOR)
        .map(|pos| &key[..pos])
}

/// Smallest key greater than every key of the container named `name`.
///
/// The separator is followed by the next byte value, so a seek to this key
/// lands on the first key of the next container.
pub(crate) fn next_container(name: &[u8]) -> Vec<u8> {
    let mut key = name.to_vec();
    key.push(SEPARATOR + 1);
    key
}

/// Smallest key strictly greater than `key`.
pub(crate) fn next_key(key: &[u8]) -> Vec<u8> {
    let mut next = key.to_vec();
    next.push(0);
    next
}
