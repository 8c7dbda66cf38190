//! Full round trips: directory tree → CAR → filesystem.

use carpack_engine::{car_to_files, extract_file_from_car, generate_car_from_dir};
use carpack_tests::{sample_tree, test_data, touch};
use carpack_types::BuildOptions;
use tempfile::TempDir;

const MIB: u64 = 1 << 20;

#[tokio::test]
async fn test_tree_roundtrip_preserves_bytes_and_structure() {
    let (tmp, root, files) = sample_tree(3000);
    let out = tmp.path().join("out");

    let car_name = generate_car_from_dir(&out, &root, 16 * MIB)
        .await
        .unwrap()
        .unwrap();

    let restored = tmp.path().join("restored");
    car_to_files(&out.join(&car_name), &restored).await.unwrap();

    for original in &files {
        let rel = original.strip_prefix(&root).unwrap();
        let copy = restored.join(rel);
        assert!(copy.exists(), "missing {}", copy.display());
        assert_eq!(
            std::fs::read(original).unwrap(),
            std::fs::read(&copy).unwrap(),
            "bytes differ for {}",
            rel.display()
        );
    }
    assert!(restored.join("dir1/dir2").is_dir());
}

#[tokio::test]
async fn test_multi_chunk_file_roundtrip() {
    // A file spanning several 1 MiB chunks within one slice.
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    let data = test_data(5 * MIB as usize + 4321);
    touch(&input_dir.join("chunky"), &data);
    let out = tmp.path().join("out");

    let car_name = generate_car_from_dir(&out, &input_dir, 64 * MIB)
        .await
        .unwrap()
        .unwrap();

    let restored = tmp.path().join("restored");
    car_to_files(&out.join(&car_name), &restored).await.unwrap();
    assert_eq!(std::fs::read(restored.join("chunky")).unwrap(), data);
}

#[tokio::test]
async fn test_uuid_suffix_survives_roundtrip_once() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    touch(&input_dir.join("tagged"), &test_data(100));
    let out = tmp.path().join("out");

    let car_name = carpack_engine::CarGenerator::new(&out)
        .with_options(BuildOptions {
            parallel: 2,
            attach_uuid: true,
        })
        .generate_from_dir(&input_dir, MIB)
        .await
        .unwrap()
        .unwrap();

    let restored = tmp.path().join("restored");
    car_to_files(&out.join(&car_name), &restored).await.unwrap();

    let names: Vec<_> = std::fs::read_dir(&restored)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("tagged-uuid-"));
    assert_eq!(names[0].matches("-uuid-").count(), 1);
}

#[tokio::test]
async fn test_extract_single_file_by_name() {
    let (tmp, root, files) = sample_tree(1234);
    let out = tmp.path().join("out");
    let car_name = generate_car_from_dir(&out, &root, 16 * MIB)
        .await
        .unwrap()
        .unwrap();

    let restored = tmp.path().join("restored");
    extract_file_from_car(&out.join(&car_name), &restored, "test2")
        .await
        .unwrap();

    // Only the matching file is written; the directory chain still exists.
    assert!(restored.join("dir1/dir2/test2").is_file());
    assert!(!restored.join("dir1/dir2/test3").exists());
    assert!(!restored.join("test0").exists());
    assert_eq!(
        std::fs::read(restored.join("dir1/dir2/test2")).unwrap(),
        std::fs::read(&files[3]).unwrap()
    );
}

#[tokio::test]
async fn test_empty_file_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    touch(&input_dir.join("empty"), b"");
    touch(&input_dir.join("full"), &test_data(10));
    let out = tmp.path().join("out");

    let car_name = generate_car_from_dir(&out, &input_dir, MIB)
        .await
        .unwrap()
        .unwrap();
    let restored = tmp.path().join("restored");
    car_to_files(&out.join(&car_name), &restored).await.unwrap();

    assert_eq!(std::fs::metadata(restored.join("empty")).unwrap().len(), 0);
    assert_eq!(std::fs::read(restored.join("full")).unwrap(), test_data(10));
}
