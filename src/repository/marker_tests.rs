use tempfile::TempDir;

use super::*;

#[test]
fn load_missing_marker_returns_none() {
    let dir = TempDir::new().unwrap();
    let result = RepositoryMarker::load(&dir.path().join(".mobilecombackup.yaml")).unwrap();
    assert!(result.is_none());
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".mobilecombackup.yaml");
    let marker = RepositoryMarker::new();
    marker.save(&path).unwrap();

    let loaded = RepositoryMarker::load(&path).unwrap().unwrap();
    assert_eq!(loaded, marker);
    assert_eq!(loaded.repository_structure_version, CURRENT_STRUCTURE_VERSION);
}

#[test]
fn load_rejects_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".mobilecombackup.yaml");
    std::fs::write(&path, "not: [valid\n").unwrap();
    assert!(RepositoryMarker::load(&path).is_err());
}
