//! Discovery against real directory trees

use super::fixtures::{nested_layout, touch, write_mdx};
use dictfleet::discovery::{scan, BundleRegistry, DiscoveryError};
use tempfile::TempDir;

#[test]
fn test_nested_layout_one_bundle_per_directory() {
    let tmp = nested_layout(&["Oxford", "Collins", "Longman"]);

    let bundles = scan(tmp.path()).unwrap();
    let names: Vec<_> = bundles.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["Collins", "Longman", "Oxford"]);

    for bundle in &bundles {
        assert!(bundle.is_valid());
        assert_eq!(bundle.main_file, format!("{}.mdx", bundle.name()));
        assert_eq!(bundle.aux_files, vec![format!("{}.mdd", bundle.name())]);
        assert_eq!(bundle.root.parent().unwrap(), tmp.path());
    }
}

#[test]
fn test_nested_layout_keeps_every_aux_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("OxfordDict");
    std::fs::create_dir(&dir).unwrap();
    write_mdx(&dir.join("main.mdx"), "Oxford");
    touch(&dir.join("aux2.mdd"));
    touch(&dir.join("aux1.mdd"));
    touch(&dir.join("style.css"));

    let bundles = scan(tmp.path()).unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].root, dir);
    assert_eq!(bundles[0].main_file, "main.mdx");
    assert_eq!(bundles[0].aux_files, vec!["aux1.mdd", "aux2.mdd"]);
}

#[test]
fn test_flat_layout_falls_back_to_root() {
    let tmp = TempDir::new().unwrap();
    write_mdx(&tmp.path().join("dict.mdx"), "Flat");
    touch(&tmp.path().join("dict.mdd"));
    std::fs::create_dir(tmp.path().join("images")).unwrap();

    let bundles = scan(tmp.path()).unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].root, tmp.path());
    assert_eq!(bundles[0].main_file, "dict.mdx");
    assert_eq!(bundles[0].aux_files, vec!["dict.mdd"]);
}

#[test]
fn test_nested_bundles_win_over_root_files() {
    let tmp = nested_layout(&["Oxford"]);
    write_mdx(&tmp.path().join("root.mdx"), "Root");

    let bundles = scan(tmp.path()).unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].name(), "Oxford");
}

#[test]
fn test_directories_without_main_file_are_skipped() {
    let tmp = nested_layout(&["Oxford"]);
    let orphan = tmp.path().join("Orphan");
    std::fs::create_dir(&orphan).unwrap();
    touch(&orphan.join("orphan.mdd"));

    let bundles = scan(tmp.path()).unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].name(), "Oxford");
}

#[test]
fn test_nothing_found_is_empty_for_scan_and_error_for_registry() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("readme.txt"));
    std::fs::create_dir(tmp.path().join("empty")).unwrap();

    assert!(scan(tmp.path()).unwrap().is_empty());
    assert!(matches!(
        BundleRegistry::discover(tmp.path()),
        Err(DiscoveryError::NoBundles { .. })
    ));
}

#[test]
fn test_missing_root_is_reported() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    assert!(matches!(
        scan(&missing),
        Err(DiscoveryError::DirectoryNotFound { .. })
    ));
}

#[test]
fn test_file_root_is_reported() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("dict.mdx");
    write_mdx(&file, "File");

    assert!(matches!(
        scan(&file),
        Err(DiscoveryError::NotADirectory { .. })
    ));
}

#[test]
fn test_registry_order_is_stable() {
    let tmp = nested_layout(&["b", "a", "c"]);

    let first = BundleRegistry::discover(tmp.path()).unwrap();
    let second = BundleRegistry::discover(tmp.path()).unwrap();
    assert_eq!(first.to_vec(), second.to_vec());
    assert_eq!(first.root(), tmp.path());
    assert_eq!(
        first.iter().map(|b| b.name()).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
}
