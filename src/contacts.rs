//! In-memory contact registry plus its `contacts.yaml` persistence (§3, §4.6,
//! §6). Two canonical indices (`canonical`, `by_number`, the latter derived)
//! and one staging index (`unprocessed`) for names seen but not yet promoted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ImportErrorKind;
use crate::phone;

/// On-disk shape of one canonical contact (§6 `contacts.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ContactRecord {
    name: String,
    numbers: Vec<String>,
}

/// On-disk shape of one staged observation set (§6 `contacts.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct UnprocessedRecord {
    phone_number: String,
    contact_names: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ContactsFile {
    #[serde(default)]
    contacts: Vec<ContactRecord>,
    #[serde(default)]
    unprocessed: Vec<UnprocessedYamlEntry>,
}

/// `unprocessed` entries accept either the structured form or the legacy
/// `"<phone>: <name1>, <name2>"` string form, upgraded in memory on load (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum UnprocessedYamlEntry {
    Structured(UnprocessedRecord),
    Legacy(String),
}

/// Names judged "unknown" and discarded rather than observed (§4.6).
fn is_unknown_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed == "(Unknown)" || trimmed == "null"
}

#[derive(Debug, Default)]
pub struct ContactRegistry {
    /// display name -> raw numbers as originally observed, insertion order preserved.
    canonical: BTreeMap<String, Vec<String>>,
    /// normalized number -> display name; derived from `canonical`, rebuilt on load.
    by_number: BTreeMap<String, String>,
    /// normalized number -> sorted set of observed names awaiting promotion.
    unprocessed: BTreeMap<String, BTreeSet<String>>,
}

impl ContactRegistry {
    pub fn new() -> Self {
        ContactRegistry::default()
    }

    /// Parses `contacts.yaml`, accepting both the structured and legacy
    /// `unprocessed` forms (§4.6). A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(ContactRegistry::new());
        }
        let raw = std::fs::read_to_string(path).with_context(|| ImportErrorKind::Filesystem {
            operation: "read contacts",
            path: path.to_path_buf(),
            detail: "failed to read contacts.yaml".to_owned(),
        })?;
        let parsed: ContactsFile = serde_yaml::from_str(&raw).with_context(|| ImportErrorKind::Parsing {
            path: path.to_path_buf(),
            context: "contacts.yaml".to_owned(),
            detail: "invalid YAML".to_owned(),
        })?;

        let mut registry = ContactRegistry::new();
        for contact in parsed.contacts {
            registry.canonical.insert(contact.name.clone(), contact.numbers.clone());
            for raw_number in &contact.numbers {
                registry.by_number.insert(phone::normalize(raw_number), contact.name.clone());
            }
        }
        for entry in parsed.unprocessed {
            match entry {
                UnprocessedYamlEntry::Structured(rec) => {
                    let set = registry.unprocessed.entry(rec.phone_number).or_default();
                    set.extend(rec.contact_names);
                }
                UnprocessedYamlEntry::Legacy(line) => {
                    if let Some((number, names)) = line.split_once(':') {
                        let set = registry.unprocessed.entry(number.trim().to_owned()).or_default();
                        set.extend(names.split(',').map(|n| n.trim().to_owned()).filter(|n| !is_unknown_name(n)));
                    }
                }
            }
        }
        Ok(registry)
    }

    /// Writes canonical + unprocessed sections atomically, with unprocessed
    /// entries sorted by normalized number and each name list sorted (§4.6).
    pub fn save(&self, path: &Path) -> Result<()> {
        let contacts = self
            .canonical
            .iter()
            .map(|(name, numbers)| ContactRecord { name: name.clone(), numbers: numbers.clone() })
            .collect();
        let unprocessed = self
            .unprocessed
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(phone_number, names)| UnprocessedRecord {
                phone_number: phone_number.clone(),
                contact_names: names.iter().cloned().collect(),
            })
            .map(UnprocessedYamlEntry::Structured)
            .collect();
        let file = ContactsFile { contacts, unprocessed };
        let yaml = serde_yaml::to_string(&file).context("failed to serialize contacts.yaml")?;
        crate::utils::atomic_write(path, yaml.as_bytes())
    }

    /// Normalizes `raw_number` and looks it up in `by_number` (§4.6).
    pub fn resolve(&self, raw_number: &str) -> Option<&str> {
        self.by_number.get(&phone::normalize(raw_number)).map(String::as_str)
    }

    /// Records `name` as an observation for `raw_number` unless the number is
    /// already canonical or the name is judged unknown (§4.6).
    pub fn add_observation(&mut self, raw_number: &str, name: &str) {
        if is_unknown_name(name) {
            return;
        }
        let normalized = phone::normalize(raw_number);
        if self.by_number.contains_key(&normalized) {
            return;
        }
        self.unprocessed.entry(normalized).or_default().insert(name.trim().to_owned());
    }

    /// The multi-recipient form (§4.6, §8 boundary behavior): `addresses` is
    /// `~`-delimited, `names` is `,`-delimited; lengths must match exactly or
    /// the whole observation is rejected.
    pub fn add_observations(&mut self, addresses: &str, names: &str) -> Result<()> {
        let address_list: Vec<&str> = addresses.split('~').collect();
        let name_list: Vec<&str> = names.split(',').collect();
        if address_list.len() != name_list.len() {
            anyhow::bail!(ImportErrorKind::Validation {
                operation: "add_observations",
                identifier: addresses.to_owned(),
                detail: format!(
                    "address count ({}) does not match name count ({})",
                    address_list.len(),
                    name_list.len()
                ),
            });
        }
        for (address, name) in address_list.into_iter().zip(name_list) {
            self.add_observation(address, name);
        }
        Ok(())
    }

    /// Single entry point for importers (§4.6, §8): dispatches to
    /// `add_observations` when `address` carries the multi-recipient `~`
    /// delimiter, otherwise to `add_observation`. A length mismatch in the
    /// multi-recipient form is swallowed -- the record is still coalesced,
    /// it simply contributes no observations.
    pub fn observe(&mut self, address: &str, name: &str) {
        if address.contains('~') {
            let _ = self.add_observations(address, name);
        } else {
            self.add_observation(address, name);
        }
    }

    /// The key sets of `by_number` and `unprocessed` after save, for the §3
    /// disjointness invariant and the validator (§4.14).
    pub fn unprocessed_numbers(&self) -> impl Iterator<Item = &str> {
        self.unprocessed.keys().map(String::as_str)
    }

    pub fn canonical_numbers(&self) -> impl Iterator<Item = &str> {
        self.by_number.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "contacts_tests.rs"]
mod tests;
