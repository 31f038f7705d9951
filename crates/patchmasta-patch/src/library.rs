//! The on-disk patch and bank store.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::bank::Bank;
use crate::error::Result;
use crate::patch::Patch;

/// Flat directories of patch and bank files under one root.
///
/// Listing skips malformed files with a warning so one bad download never
/// hides the rest of the library.
pub struct Library {
    patches_dir: PathBuf,
    banks_dir: PathBuf,
}

impl Library {
    pub fn open(root: &Path) -> Result<Self> {
        let patches_dir = root.join("patches");
        let banks_dir = root.join("banks");
        std::fs::create_dir_all(&patches_dir)?;
        std::fs::create_dir_all(&banks_dir)?;
        Ok(Self {
            patches_dir,
            banks_dir,
        })
    }

    pub fn patches_dir(&self) -> &Path {
        &self.patches_dir
    }

    pub fn banks_dir(&self) -> &Path {
        &self.banks_dir
    }

    /// First non-colliding `<slug>.json` / `<slug>-N.json` path.
    fn unique_path(dir: &Path, slug: &str) -> PathBuf {
        let candidate = dir.join(format!("{slug}.json"));
        if !candidate.exists() {
            return candidate;
        }
        let mut counter = 1;
        loop {
            let candidate = dir.join(format!("{slug}-{counter}.json"));
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    pub fn save_patch(&self, patch: &Patch) -> Result<PathBuf> {
        let path = Self::unique_path(&self.patches_dir, &patch.slug());
        patch.save(&path)?;
        Ok(path)
    }

    pub fn list_patches(&self) -> Vec<(PathBuf, Patch)> {
        self.list_json(&self.patches_dir)
            .filter_map(|path| match Patch::load(&path) {
                Ok(patch) => Some((path, patch)),
                Err(e) => {
                    warn!("skipping unreadable patch {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Delete a patch's JSON sidecar and its `.syx` payload.
    pub fn delete_patch(&self, json_path: &Path) -> Result<()> {
        let syx = json_path.with_extension("syx");
        if syx.exists() {
            std::fs::remove_file(&syx)?;
        }
        if json_path.exists() {
            std::fs::remove_file(json_path)?;
        }
        Ok(())
    }

    pub fn save_bank(&self, bank: &Bank) -> Result<PathBuf> {
        let path = Self::unique_path(&self.banks_dir, &bank.slug());
        bank.save(&path)?;
        Ok(path)
    }

    pub fn list_banks(&self) -> Vec<(PathBuf, Bank)> {
        self.list_json(&self.banks_dir)
            .filter_map(|path| match Bank::load(&path) {
                Ok(bank) => Some((path, bank)),
                Err(e) => {
                    warn!("skipping unreadable bank {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    fn list_json<'a>(&self, dir: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        paths.into_iter()
    }
}
