//! Application configuration.
//!
//! A single JSON document at `~/.patchmasta/config.json`. Keys this
//! version does not recognize are preserved on save; a missing file yields
//! defaults, a malformed one is warned about and ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use patchmasta_ai::{AnthropicBackend, ChatBackend, OpenAiBackend};

/// Which remote service answers the chat calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiBackendKind {
    #[default]
    Claude,
    Groq,
}

fn default_channel() -> u8 {
    1
}

fn default_model_id() -> u8 {
    patchmasta_sysex::DEFAULT_MODEL_ID
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ai_backend: AiBackendKind,
    #[serde(default)]
    pub claude_api_key: String,
    #[serde(default)]
    pub groq_api_key: String,
    /// Substring-matched audio input device name; `None` = system default.
    #[serde(default)]
    pub audio_input_device: Option<String>,
    /// Global MIDI channel, 1-16.
    #[serde(default = "default_channel")]
    pub midi_channel: u8,
    /// SysEx model id; kept configurable until verified against hardware.
    #[serde(default = "default_model_id")]
    pub model_id: u8,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_backend: AiBackendKind::default(),
            claude_api_key: String::new(),
            groq_api_key: String::new(),
            audio_input_device: None,
            midi_channel: default_channel(),
            model_id: default_model_id(),
            extra: Map::new(),
        }
    }
}

impl AppConfig {
    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".patchmasta")
            .join("config.json")
    }

    /// Load from the user config path; any failure falls back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring malformed config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("could not read config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Config(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }

    /// Build the configured chat backend.
    pub fn chat_backend(&self) -> Result<Box<dyn ChatBackend>> {
        match self.ai_backend {
            AiBackendKind::Claude => {
                if self.claude_api_key.is_empty() {
                    return Err(Error::Config("claude_api_key is not set".into()));
                }
                Ok(Box::new(AnthropicBackend::new(self.claude_api_key.clone())))
            }
            AiBackendKind::Groq => {
                if self.groq_api_key.is_empty() {
                    return Err(Error::Config("groq_api_key is not set".into()));
                }
                Ok(Box::new(OpenAiBackend::new(self.groq_api_key.clone())))
            }
        }
    }
}
