//! The patch model and its on-disk format.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One synthesizer preset: display metadata plus the raw program dump.
///
/// Serialized as a `<slug>.json` sidecar whose `sysex_file` field names the
/// `.syx` payload next to it. Fields this version does not know about are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    #[serde(default)]
    pub program_number: u8,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default = "today")]
    pub created: String,
    #[serde(skip)]
    pub sysex_data: Option<Vec<u8>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

impl Patch {
    pub fn new(name: impl Into<String>, program_number: u8) -> Self {
        Self {
            name: name.into(),
            program_number,
            category: String::new(),
            notes: String::new(),
            created: today(),
            sysex_data: None,
            extra: Map::new(),
        }
    }

    pub fn with_sysex(mut self, data: Vec<u8>) -> Self {
        self.sysex_data = Some(data);
        self
    }

    /// Filesystem-safe name: lowercase, non-word runs collapsed to `-`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        for c in self.name.to_lowercase().chars() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                slug.push(c);
            } else {
                slug.push('-');
            }
        }
        slug.trim_matches('-').to_string()
    }

    /// Write the JSON sidecar at `json_path` and, when raw data is
    /// present, the `.syx` payload next to it.
    pub fn save(&self, json_path: &Path) -> Result<()> {
        let mut doc = serde_json::to_value(self)?;
        let obj = doc.as_object_mut().expect("patch serializes to an object");

        match &self.sysex_data {
            Some(data) => {
                let syx_path = json_path.with_extension("syx");
                std::fs::write(&syx_path, data)?;
                let file_name = syx_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                obj.insert("sysex_file".into(), Value::String(file_name));
            }
            None => {
                obj.insert("sysex_file".into(), Value::Null);
            }
        }

        std::fs::write(json_path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    /// Load a patch and its referenced `.syx` payload, if present.
    pub fn load(json_path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(json_path)?;
        let doc: Value = serde_json::from_str(&text)?;
        if doc.get("name").and_then(Value::as_str).is_none() {
            return Err(Error::MissingField("name"));
        }

        let sysex_file = doc
            .get("sysex_file")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut patch: Patch = serde_json::from_value(doc)?;
        // The pointer field lives in `extra` after deserialization; drop it
        // so a re-save regenerates it from the actual payload.
        patch.extra.remove("sysex_file");

        if let Some(file) = sysex_file {
            let syx_path = json_path.parent().unwrap_or(Path::new(".")).join(file);
            if syx_path.exists() {
                patch.sysex_data = Some(std::fs::read(&syx_path)?);
            } else {
                tracing::warn!("missing sysex payload: {}", syx_path.display());
            }
        }
        Ok(patch)
    }
}
