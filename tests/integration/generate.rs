//! CAR generation end-to-end: single files, uuid tagging, manifest
//! behavior, determinism.

use std::path::PathBuf;

use carpack_engine::{
    CarGenerator, generate_car_from_dir, generate_car_from_files,
    generate_car_from_files_with_uuid, get_car_root, list_car_file,
};
use carpack_tests::{SAMPLE_UUIDS, read_manifest, sample_tree, test_data, touch};
use carpack_types::BuildOptions;
use carpack_unixfs::{PbNode, UnixfsData, cid_v0};
use tempfile::TempDir;

const MIB: u64 = 1 << 20;

#[tokio::test]
async fn test_single_small_file() {
    carpack_tests::init_logging();
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in/a");
    let data = test_data(100);
    touch(&input, &data);
    let out = tmp.path().join("out");

    let car_name = generate_car_from_files(&out, &[input], MIB)
        .await
        .unwrap()
        .unwrap();

    // The CAR is named after its root CID.
    let root = get_car_root(&out.join(&car_name)).await.unwrap();
    assert_eq!(car_name, format!("{root}.car"));

    // Exactly one file record, whose CID is the canonical 100-byte leaf.
    let infos = list_car_file(&out.join(&car_name)).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].size, 100);
    assert!(infos[0].path.ends_with("in/a"));

    let expected_leaf = PbNode {
        links: vec![],
        data: UnixfsData::file_leaf(data).encode(),
    };
    assert_eq!(infos[0].cid, cid_v0(&expected_leaf.encode()).unwrap());

    // One manifest row under the exact header.
    let (header, rows) = read_manifest(&out);
    assert_eq!(header, "payload_cid,filename,detail");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with(&format!("{root},a.car,")));
}

#[tokio::test]
async fn test_uuid_tagged_tree() {
    let (tmp, _root, files) = sample_tree(2048);
    let out = tmp.path().join("out");
    let uuids: Vec<String> = SAMPLE_UUIDS.iter().map(|u| u.to_string()).collect();

    let car_name = generate_car_from_files_with_uuid(&out, &files, &uuids, 16 * MIB)
        .await
        .unwrap()
        .unwrap();

    let infos = list_car_file(&out.join(&car_name)).await.unwrap();
    assert_eq!(infos.len(), 5);
    // Every file entry carries its uuid suffix exactly once.
    for info in &infos {
        assert_eq!(info.path.matches("-uuid-").count(), 1, "path {}", info.path);
    }
    for uuid in SAMPLE_UUIDS {
        assert!(
            infos.iter().any(|i| i.path.ends_with(&format!("-uuid-{uuid}"))),
            "missing uuid {uuid}"
        );
    }
    // The nested tree survives: dir1 and dir1/dir2 appear in paths.
    assert!(infos.iter().any(|i| i.path.contains("dir1/dir2/")));
}

#[tokio::test]
async fn test_uuid_length_mismatch_is_invalid_argument() {
    let (tmp, _root, files) = sample_tree(16);
    let out = tmp.path().join("out");
    let err = generate_car_from_files_with_uuid(
        &out,
        &files,
        &[SAMPLE_UUIDS[0].to_string()],
        MIB,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        carpack_engine::EngineError::InvalidArgument(_)
    ));
}

#[tokio::test]
async fn test_root_cid_stable_across_parallelism() {
    let (tmp, root, _files) = sample_tree(4096);
    let out1 = tmp.path().join("out1");
    let out2 = tmp.path().join("out2");

    let car1 = CarGenerator::new(&out1)
        .with_options(BuildOptions {
            parallel: 1,
            attach_uuid: false,
        })
        .generate_from_dir(&root, 16 * MIB)
        .await
        .unwrap()
        .unwrap();
    let car2 = CarGenerator::new(&out2)
        .with_options(BuildOptions {
            parallel: 8,
            attach_uuid: false,
        })
        .generate_from_dir(&root, 16 * MIB)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(car1, car2, "root CID must not depend on worker count");
    let bytes1 = std::fs::read(out1.join(&car1)).unwrap();
    let bytes2 = std::fs::read(out2.join(&car2)).unwrap();
    assert_eq!(bytes1, bytes2, "car streams must be byte-identical");
}

#[tokio::test]
async fn test_manifest_appends_across_invocations() {
    let (tmp, root, _files) = sample_tree(512);
    let out = tmp.path().join("out");

    generate_car_from_dir(&out, &root, 16 * MIB).await.unwrap();
    generate_car_from_dir(&out, &root, 16 * MIB).await.unwrap();

    let (header, rows) = read_manifest(&out);
    assert_eq!(header, "payload_cid,filename,detail");
    assert_eq!(rows.len(), 2, "one row per produced car, appended");
}

#[tokio::test]
async fn test_manifest_detail_is_compact_json_tree() {
    let (tmp, root, _files) = sample_tree(256);
    let out = tmp.path().join("out");
    generate_car_from_dir(&out, &root, 16 * MIB).await.unwrap();

    let (_, rows) = read_manifest(&out);
    let detail = rows[0].splitn(3, ',').nth(2).unwrap().to_string();
    assert!(detail.starts_with(r#"{"Name":"","Hash":""#));
    // The tree names dir1 and dir2 with nested links.
    assert!(detail.contains(r#""Name":"dir1""#));
    assert!(detail.contains(r#""Name":"dir2""#));
    assert!(!detail.contains('\n'));
}

#[tokio::test]
async fn test_empty_input_produces_nothing() {
    let tmp = TempDir::new().unwrap();
    let empty_dir = tmp.path().join("empty");
    std::fs::create_dir_all(&empty_dir).unwrap();
    let out = tmp.path().join("out");

    let result = generate_car_from_dir(&out, &empty_dir, MIB).await.unwrap();
    assert_eq!(result, None);
    assert!(!out.join("manifest.csv").exists());
}

#[tokio::test]
async fn test_invalid_slice_size_rejected() {
    let err = generate_car_from_files(PathBuf::from("/tmp/out"), &[], 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        carpack_engine::EngineError::InvalidArgument(_)
    ));
}
