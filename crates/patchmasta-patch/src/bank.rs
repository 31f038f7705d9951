//! Bank files: named slot→patch assignments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// A device bank layout: which patch file goes into which program slot.
///
/// Unassigned slots are simply absent. Serialization emits slots in
/// ascending order; a referenced patch file that no longer exists is
/// reported but does not invalidate the bank.
#[derive(Debug, Clone)]
pub struct Bank {
    pub name: String,
    slots: BTreeMap<u8, PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct BankDoc {
    name: String,
    #[serde(default)]
    slots: Vec<SlotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SlotEntry {
    slot: u8,
    patch_file: PathBuf,
}

impl Bank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: BTreeMap::new(),
        }
    }

    pub fn assign(&mut self, slot: u8, patch_file: PathBuf) {
        self.slots.insert(slot, patch_file);
    }

    pub fn remove(&mut self, slot: u8) {
        self.slots.remove(&slot);
    }

    pub fn get(&self, slot: u8) -> Option<&PathBuf> {
        self.slots.get(&slot)
    }

    /// Assignments in ascending slot order.
    pub fn ordered_slots(&self) -> impl Iterator<Item = (u8, &PathBuf)> {
        self.slots.iter().map(|(&s, p)| (s, p))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slug(&self) -> String {
        self.name.to_lowercase().replace(' ', "-")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let doc = BankDoc {
            name: self.name.clone(),
            slots: self
                .ordered_slots()
                .map(|(slot, patch_file)| SlotEntry {
                    slot,
                    patch_file: patch_file.clone(),
                })
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let doc: BankDoc = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut bank = Bank::new(doc.name);
        for entry in doc.slots {
            if !entry.patch_file.exists() {
                warn!(
                    "bank '{}' slot {}: missing patch file {}",
                    bank.name,
                    entry.slot,
                    entry.patch_file.display()
                );
            }
            bank.assign(entry.slot, entry.patch_file);
        }
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_emit_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live-set.json");

        let mut bank = Bank::new("Live Set");
        bank.assign(7, PathBuf::from("c.json"));
        bank.assign(0, PathBuf::from("a.json"));
        bank.assign(3, PathBuf::from("b.json"));
        bank.save(&path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let slots: Vec<u64> = doc["slots"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["slot"].as_u64().unwrap())
            .collect();
        assert_eq!(slots, vec![0, 3, 7]);
    }

    #[test]
    fn test_roundtrip_and_missing_files_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");

        let mut bank = Bank::new("My Bank");
        bank.assign(5, dir.path().join("nonexistent.json"));
        bank.save(&path).unwrap();

        let loaded = Bank::load(&path).unwrap();
        assert_eq!(loaded.name, "My Bank");
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(5).is_some());
    }

    #[test]
    fn test_assign_replaces_and_remove() {
        let mut bank = Bank::new("B");
        bank.assign(1, PathBuf::from("x.json"));
        bank.assign(1, PathBuf::from("y.json"));
        assert_eq!(bank.get(1).unwrap(), &PathBuf::from("y.json"));

        bank.remove(1);
        assert!(bank.is_empty());
    }

    #[test]
    fn test_slug() {
        assert_eq!(Bank::new("My Live Set").slug(), "my-live-set");
    }
}
