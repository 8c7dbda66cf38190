//! Extraction policy: unsafe entry names, overwrite refusal, import
//! root-count enforcement.

use std::io::Cursor;

use carpack_engine::{EngineError, car_to_files, generate_car_from_dir};
use carpack_store::{BlockStore as _, MemoryBlockStore};
use carpack_tests::{test_data, touch};
use carpack_unixfs::{FileDagBuilder, PbLink, PbNode, UnixfsData};
use tempfile::TempDir;

const MIB: u64 = 1 << 20;

/// Craft a CAR whose root directory contains one entry with the given
/// name.
async fn car_with_entry_name(name: &str) -> Vec<u8> {
    let store = MemoryBlockStore::new();
    let file = FileDagBuilder::new(&store)
        .build(Cursor::new(b"payload".to_vec()))
        .await
        .unwrap();
    let root = PbNode {
        links: vec![PbLink {
            cid: file.cid,
            name: name.to_string(),
            tsize: file.tsize,
        }],
        data: UnixfsData::directory().encode(),
    }
    .into_block()
    .unwrap();
    let root_cid = root.cid;
    store.put(root.cid, root.data).await.unwrap();

    let mut out = Cursor::new(Vec::new());
    carpack_car::write_car(&store, root_cid, &mut out)
        .await
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_dotdot_entry_rejected() {
    let tmp = TempDir::new().unwrap();
    let car_path = tmp.path().join("evil.car");
    std::fs::write(&car_path, car_with_entry_name("..").await).unwrap();

    let err = car_to_files(&car_path, &tmp.path().join("restored"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidEntryName(name) if name == ".."));
}

#[tokio::test]
async fn test_slash_and_nul_entries_rejected() {
    let tmp = TempDir::new().unwrap();
    for bad in ["a/b", "nul\0name", "", "."] {
        let car_path = tmp.path().join("evil.car");
        std::fs::write(&car_path, car_with_entry_name(bad).await).unwrap();
        let err = car_to_files(&car_path, &tmp.path().join("restored"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidEntryName(_)),
            "{bad:?} must be rejected"
        );
    }
}

#[tokio::test]
async fn test_existing_target_refused_and_untouched() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    touch(&input_dir.join("victim"), &test_data(64));
    let out = tmp.path().join("out");
    let car_name = generate_car_from_dir(&out, &input_dir, MIB)
        .await
        .unwrap()
        .unwrap();

    // Pre-create the target with different contents.
    let restored = tmp.path().join("restored");
    touch(&restored.join("victim"), b"do not clobber");

    let err = car_to_files(&out.join(&car_name), &restored)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PathExists(_)));
    assert_eq!(
        std::fs::read(restored.join("victim")).unwrap(),
        b"do not clobber"
    );
}

#[tokio::test]
async fn test_multi_root_car_unsupported() {
    // Hand-build a CAR with two roots in the header.
    let store = MemoryBlockStore::new();
    let block = PbNode {
        links: vec![],
        data: UnixfsData::directory().encode(),
    }
    .into_block()
    .unwrap();
    let cid = block.cid;
    store.put(block.cid, block.data.clone()).await.unwrap();

    use bytes::Bytes;
    use futures::SinkExt;
    use tokio_util::codec::FramedWrite;
    let header = serde_ipld_dagcbor::to_vec(&carpack_car::CarHeader {
        roots: vec![cid, cid],
        version: 1,
    })
    .unwrap();
    let mut framed = FramedWrite::new(
        Cursor::new(Vec::new()),
        unsigned_varint::codec::UviBytes::<Bytes>::default(),
    );
    framed.send(Bytes::from(header)).await.unwrap();
    let mut frame = cid.to_bytes();
    frame.extend_from_slice(&block.data);
    framed.send(Bytes::from(frame)).await.unwrap();
    let bytes = framed.into_inner().into_inner();

    let tmp = TempDir::new().unwrap();
    let car_path = tmp.path().join("two-roots.car");
    std::fs::write(&car_path, bytes).unwrap();

    let err = car_to_files(&car_path, &tmp.path().join("restored"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unsupported(_)));
}

#[tokio::test]
async fn test_truncated_car_is_corrupt() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    touch(&input_dir.join("f"), &test_data(5000));
    let out = tmp.path().join("out");
    let car_name = generate_car_from_dir(&out, &input_dir, MIB)
        .await
        .unwrap()
        .unwrap();

    let mut bytes = std::fs::read(out.join(&car_name)).unwrap();
    bytes.truncate(bytes.len() - 10);
    let broken = tmp.path().join("broken.car");
    std::fs::write(&broken, bytes).unwrap();

    let err = car_to_files(&broken, &tmp.path().join("restored"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Car(_)));
}
