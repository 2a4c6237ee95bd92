//! Paginated listing feeding range reads, across partitions and containers.

use std::collections::HashSet;

use burrow_blobstor::BlobStorConfig;
use burrow_integration_tests::{TestNode, sorted_containers, test_data_seeded};
use burrow_meta::Cursor;
use burrow_types::{Address, Partition, Range, StorageId};

#[tokio::test]
async fn test_list_then_read_every_object() {
    let node = TestNode::new();
    let mut payloads = Vec::new();
    let mut seed = 1;

    for (i, cid) in sorted_containers(3).into_iter().enumerate() {
        for partition in Partition::ALL {
            for _ in 0..4 {
                seed += 1;
                let payload = test_data_seeded(512, seed);
                let addr = if seed % 2 == 0 {
                    node.put_large(cid, partition, payload.clone()).await
                } else {
                    let pack = format!("pack-{i}");
                    node.put_small(pack.as_bytes(), cid, partition, payload.clone())
                        .await
                };
                payloads.push((addr, payload));
            }
        }
    }

    let dead: HashSet<Address> = payloads.iter().step_by(5).map(|(a, _)| *a).collect();
    for addr in &dead {
        node.inhume(addr);
    }

    let listed = node.list_all(7);
    let unique: HashSet<Address> = listed.iter().copied().collect();
    assert_eq!(unique.len(), listed.len(), "duplicate address in listing");
    assert_eq!(listed.len(), payloads.len() - dead.len());

    for (addr, payload) in &payloads {
        if dead.contains(addr) {
            assert!(!unique.contains(addr), "inhumed {addr} was listed");
            continue;
        }
        assert!(unique.contains(addr), "live {addr} missing");

        let head = node
            .blobs
            .get_range(*addr, Range::new(0, 16), &StorageId::Unknown)
            .await
            .unwrap();
        assert_eq!(&head[..], &payload[..16]);
    }
}

#[tokio::test]
async fn test_cursor_survives_reopen() {
    let node = TestNode::new();
    let cids = sorted_containers(2);
    let mut expected = Vec::new();
    for cid in &cids {
        let mut addrs = Vec::new();
        for seed in 0..3 {
            let payload = test_data_seeded(32, seed);
            addrs.push(node.put_large(*cid, Partition::Primary, payload).await);
        }
        addrs.sort();
        expected.extend(addrs);
    }

    let page = node.meta.list_with_token(4, "").unwrap();
    assert_eq!(page.addresses, expected[..4].to_vec());
    let token = page.cursor.to_string();

    let node = node.reopen(BlobStorConfig::default());
    let page = node.meta.list_with_token(4, &token).unwrap();
    assert_eq!(page.addresses, expected[4..].to_vec());
    assert_eq!(page.cursor, Cursor::new(Partition::Primary, expected[5]));

    let err = node
        .meta
        .list_with_token(4, &page.cursor.to_string())
        .unwrap_err();
    assert!(err.is_end_of_listing());
}

#[tokio::test]
async fn test_revived_address_is_listed_again() {
    let node = TestNode::new();
    let cid = sorted_containers(1)[0];
    let addr = node
        .put_large(cid, Partition::Tombstone, test_data_seeded(8, 1))
        .await;

    node.inhume(&addr);
    assert!(node.list_all(10).is_empty());

    node.meta
        .inhume(&addr, burrow_meta::GraveMark::Cleared)
        .unwrap();
    assert_eq!(node.list_all(10), vec![addr]);
}
