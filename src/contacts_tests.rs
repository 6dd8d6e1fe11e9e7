use tempfile::TempDir;

use super::*;

#[test]
fn resolve_returns_none_for_unknown_number() {
    let registry = ContactRegistry::new();
    assert_eq!(registry.resolve("5551234567"), None);
}

#[test]
fn add_observation_then_save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.yaml");

    let mut registry = ContactRegistry::new();
    registry.add_observation("5551234567", "Oscar Wilde");
    registry.save(&path).unwrap();

    let reloaded = ContactRegistry::load(&path).unwrap();
    assert_eq!(reloaded.unprocessed_numbers().collect::<Vec<_>>(), vec!["5551234567"]);
}

#[test]
fn add_observation_discards_unknown_names() {
    let mut registry = ContactRegistry::new();
    registry.add_observation("5551234567", "");
    registry.add_observation("5551234567", "(Unknown)");
    registry.add_observation("5551234567", "null");
    assert_eq!(registry.unprocessed_numbers().count(), 0);
}

#[test]
fn add_observation_skips_already_canonical_numbers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.yaml");
    std::fs::write(
        &path,
        "contacts:\n  - name: Jim Henson\n    numbers: [\"5555550004\"]\nunprocessed: []\n",
    )
    .unwrap();

    let mut registry = ContactRegistry::load(&path).unwrap();
    assert_eq!(registry.resolve("5555550004"), Some("Jim Henson"));

    registry.add_observation("5555550004", "Oscar Wilde");
    assert_eq!(registry.unprocessed_numbers().count(), 0);
}

#[test]
fn load_accepts_legacy_unprocessed_string_form() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.yaml");
    std::fs::write(&path, "contacts: []\nunprocessed:\n  - \"5551234567: Oscar Wilde, Jane\"\n").unwrap();

    let registry = ContactRegistry::load(&path).unwrap();
    assert_eq!(registry.unprocessed_numbers().collect::<Vec<_>>(), vec!["5551234567"]);
}

#[test]
fn load_missing_file_yields_empty_registry() {
    let dir = TempDir::new().unwrap();
    let registry = ContactRegistry::load(&dir.path().join("does-not-exist.yaml")).unwrap();
    assert_eq!(registry.unprocessed_numbers().count(), 0);
    assert_eq!(registry.canonical_numbers().count(), 0);
}

#[test]
fn add_observations_multi_recipient_matching_lengths_records_both() {
    let mut registry = ContactRegistry::new();
    registry.add_observations("555~666", "Alice,Bob").unwrap();
    let mut numbers: Vec<&str> = registry.unprocessed_numbers().collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec!["555", "666"]);
}

#[test]
fn add_observations_rejects_mismatched_lengths() {
    let mut registry = ContactRegistry::new();
    let result = registry.add_observations("555~666", "Alice");
    assert!(result.is_err());
    assert_eq!(registry.unprocessed_numbers().count(), 0);
}

#[test]
fn observe_routes_tilde_addresses_through_add_observations() {
    let mut registry = ContactRegistry::new();
    registry.observe("555~666", "Alice,Bob");
    let mut numbers: Vec<&str> = registry.unprocessed_numbers().collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec!["555", "666"]);
}

#[test]
fn observe_on_tilde_address_with_mismatched_names_records_nothing() {
    let mut registry = ContactRegistry::new();
    registry.observe("555~666", "Alice");
    assert_eq!(registry.unprocessed_numbers().count(), 0);
}

#[test]
fn observe_on_plain_address_behaves_like_add_observation() {
    let mut registry = ContactRegistry::new();
    registry.observe("5551234567", "Oscar Wilde");
    assert_eq!(registry.unprocessed_numbers().collect::<Vec<_>>(), vec!["5551234567"]);
}

#[test]
fn save_sorts_unprocessed_numbers_and_names_deterministically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.yaml");

    let mut registry = ContactRegistry::new();
    registry.add_observation("222", "Zeta");
    registry.add_observation("111", "Beta");
    registry.add_observation("111", "Alpha");
    registry.save(&path).unwrap();

    let yaml = std::fs::read_to_string(&path).unwrap();
    let alpha_pos = yaml.find("Alpha").unwrap();
    let beta_pos = yaml.find("Beta").unwrap();
    let number_111_pos = yaml.find("111").unwrap();
    let number_222_pos = yaml.find("222").unwrap();
    assert!(alpha_pos < beta_pos);
    assert!(number_111_pos < number_222_pos);
}
