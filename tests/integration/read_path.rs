//! Range reads through the dispatcher over a real file tree and pack store.

use burrow_blobstor::{BlobStorConfig, Compressor, LookupMode};
use burrow_integration_tests::{TestNode, test_data, test_data_seeded};
use burrow_types::{ContainerId, Partition, Range, StorageId};

#[tokio::test]
async fn test_ranges_from_both_backends() {
    for lookup in [LookupMode::Sequential, LookupMode::Race] {
        let node = TestNode::with_lookup(lookup);
        let cid = ContainerId::from_data(b"bucket");

        let big = test_data(256 * 1024);
        let small = test_data_seeded(300, 7);
        let big_addr = node
            .put_large(cid, Partition::Primary, big.clone())
            .await;
        let small_addr = node
            .put_small(b"pack-1", cid, Partition::Primary, small.clone())
            .await;

        for (offset, length) in [(0, 1), (1000, 4096), (256 * 1024 - 10, 10)] {
            let got = node
                .blobs
                .get_range(big_addr, Range::new(offset, length), &StorageId::Unknown)
                .await
                .unwrap();
            let start = offset as usize;
            assert_eq!(&got[..], &big[start..start + length as usize], "{lookup:?}");
        }

        // No hint: the large store misses, the small store answers.
        let got = node
            .blobs
            .get_range(small_addr, Range::new(10, 20), &StorageId::Unknown)
            .await
            .unwrap();
        assert_eq!(&got[..], &small[10..30]);

        // Hinted read goes straight to the pack.
        let hint = StorageId::from_raw(Some(&b"pack-1"[..]));
        let got = node
            .blobs
            .get_range(small_addr, Range::new(0, 300), &hint)
            .await
            .unwrap();
        assert_eq!(&got[..], &small[..]);
    }
}

#[tokio::test]
async fn test_error_classification() {
    let node = TestNode::new();
    let cid = ContainerId::from_data(b"bucket");
    let big_addr = node
        .put_large(cid, Partition::Primary, test_data(1024))
        .await;
    let small_addr = node
        .put_small(b"p", cid, Partition::Primary, test_data_seeded(64, 3))
        .await;

    // Window past the end of a large object.
    let err = node
        .blobs
        .get_range(big_addr, Range::new(1000, 25), &StorageId::Unknown)
        .await
        .unwrap_err();
    assert!(err.is_out_of_range(), "got {err:?}");

    // A small object is invisible to large-only reads.
    let err = node
        .blobs
        .get_range(small_addr, Range::new(0, 1), &StorageId::Large)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // An empty locator selects the large store as well.
    let err = node
        .blobs
        .get_range(small_addr, Range::new(0, 1), &StorageId::from_raw(Some(b"".as_slice())))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // A wrong locator does not fall back to other packs.
    let err = node
        .blobs
        .get_range(small_addr, Range::new(0, 1), &StorageId::Small(b"q".to_vec()))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // Overflowing window.
    let err = node
        .blobs
        .get_range(small_addr, Range::new(u64::MAX, 2), &StorageId::Unknown)
        .await
        .unwrap_err();
    assert!(err.is_out_of_range(), "got {err:?}");
}

#[tokio::test]
async fn test_uncompressed_objects_readable_after_enabling_compression() {
    let plain = BlobStorConfig {
        compressor: Compressor::disabled(),
        ..BlobStorConfig::default()
    };
    let node = TestNode::with_config(plain);
    let cid = ContainerId::from_data(b"bucket");
    let payload = test_data(64 * 1024);
    let addr = node
        .put_large(cid, Partition::Primary, payload.clone())
        .await;

    let node = node.reopen(BlobStorConfig::default());
    let got = node
        .blobs
        .get_range(addr, Range::new(100, 1000), &StorageId::Large)
        .await
        .unwrap();
    assert_eq!(&got[..], &payload[100..1100]);
    assert!(node.path().join("blobs").is_dir());
}

#[tokio::test]
async fn test_whole_object_read_matches_range_read() {
    let node = TestNode::with_lookup(LookupMode::Race);
    let cid = ContainerId::from_data(b"bucket");
    let payload = test_data_seeded(4096, 11);
    let addr = node
        .put_large(cid, Partition::Primary, payload.clone())
        .await;

    let object = node.blobs.get(addr, &StorageId::Unknown).await.unwrap();
    assert_eq!(object.payload, payload);
    assert_eq!(object.address(), addr);

    let range = node
        .blobs
        .get_range(addr, Range::new(0, 4096), &StorageId::Unknown)
        .await
        .unwrap();
    assert_eq!(&range[..], &object.payload[..]);
}

#[tokio::test]
async fn test_small_objects_readable_after_reopen() {
    let node = TestNode::new();
    let cid = ContainerId::from_data(b"bucket");
    let first = test_data_seeded(200, 21);
    let second = test_data_seeded(120, 22);
    let first_addr = node
        .put_small(b"pack-a", cid, Partition::Primary, first.clone())
        .await;
    let second_addr = node
        .put_small(b"pack-b", cid, Partition::Primary, second.clone())
        .await;

    let node = node.reopen(BlobStorConfig::default());
    assert_eq!(node.small.pack_count(), 2);
    assert_eq!(node.small.locate(&first_addr), Some(b"pack-a".to_vec()));

    let hint = StorageId::from_raw(Some(&b"pack-a"[..]));
    let got = node
        .blobs
        .get_range(first_addr, Range::new(50, 100), &hint)
        .await
        .unwrap();
    assert_eq!(&got[..], &first[50..150]);

    // Without a hint the large store misses and the reopened packs answer.
    let got = node
        .blobs
        .get_range(second_addr, Range::new(0, 120), &StorageId::Unknown)
        .await
        .unwrap();
    assert_eq!(&got[..], &second[..]);
    assert!(node.path().join("packs").is_dir());
}
