use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use frog_catalog::assets::AssetStore;
use frog_catalog::domain::AssetCategory;
use frog_catalog::error::CatalogError;

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

#[test]
fn same_name_sources_get_distinct_paths() {
    let temp = tempfile::tempdir().unwrap();
    let first_dir = utf8(temp.path().join("field-a"));
    let second_dir = utf8(temp.path().join("field-b"));
    std::fs::create_dir_all(&first_dir).unwrap();
    std::fs::create_dir_all(&second_dir).unwrap();
    let first = first_dir.join("call.mp3");
    let second = second_dir.join("call.mp3");
    std::fs::write(&first, b"bullfrog").unwrap();
    std::fs::write(&second, b"spring peeper").unwrap();

    let store = AssetStore::new(utf8(temp.path().join("data")));
    let stored_first = store.store(&first, AssetCategory::Audio).unwrap();
    let stored_second = store.store(&second, AssetCategory::Audio).unwrap();

    assert_ne!(stored_first, stored_second);
    assert!(stored_first.ends_with("audio/call.mp3"));
    assert!(stored_second.ends_with("audio/call_1.mp3"));
    assert_eq!(std::fs::read(&stored_first).unwrap(), b"bullfrog");
    assert_eq!(std::fs::read(&stored_second).unwrap(), b"spring peeper");
}

#[test]
fn suffix_increments_until_free() {
    let temp = tempfile::tempdir().unwrap();
    let source = utf8(temp.path().join("range.png"));
    std::fs::write(&source, b"png").unwrap();

    let store = AssetStore::new(utf8(temp.path().join("data")));
    let maps = store.category_dir(AssetCategory::Maps);
    std::fs::create_dir_all(&maps).unwrap();
    std::fs::write(maps.join("range.png"), b"old").unwrap();
    std::fs::write(maps.join("range_1.png"), b"older").unwrap();

    let stored = store.store(&source, AssetCategory::Maps).unwrap();
    assert_eq!(stored, maps.join("range_2.png"));
    assert_eq!(std::fs::read(maps.join("range.png")).unwrap(), b"old");
    assert_eq!(std::fs::read(maps.join("range_1.png")).unwrap(), b"older");
}

#[test]
fn creates_category_directory() {
    let temp = tempfile::tempdir().unwrap();
    let source = utf8(temp.path().join("toad.jpg"));
    std::fs::write(&source, b"jpg").unwrap();

    let store = AssetStore::new(utf8(temp.path().join("deep/data/root")));
    let stored = store.store(&source, AssetCategory::Images).unwrap();
    assert_eq!(stored, store.root().join("images").join("toad.jpg"));
    assert!(stored.as_std_path().is_file());
}

#[test]
fn missing_source_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let store = AssetStore::new(utf8(temp.path().join("data")));
    let err = store
        .store(&utf8(temp.path().join("nope.mp3")), AssetCategory::Audio)
        .unwrap_err();
    assert_matches!(err, CatalogError::AssetSource { .. });
}

#[test]
fn directory_source_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let store = AssetStore::new(utf8(temp.path().join("data")));
    let err = store
        .store(&utf8(temp.path().to_path_buf()), AssetCategory::Images)
        .unwrap_err();
    assert_matches!(err, CatalogError::AssetSource { .. });
}

#[test]
fn no_temp_files_left_behind() {
    let temp = tempfile::tempdir().unwrap();
    let source = utf8(temp.path().join("call.wav"));
    std::fs::write(&source, b"wav").unwrap();

    let store = AssetStore::new(utf8(temp.path().join("data")));
    store.store(&source, AssetCategory::Audio).unwrap();
    store.store(&source, AssetCategory::Audio).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(store.category_dir(AssetCategory::Audio))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["call.wav", "call_1.wav"]);
}
