//! Tool execution against the device, the program editor, and the audio
//! pipeline.
//!
//! Nothing here raises across the tool boundary: every outcome, success or
//! failure, becomes a text result the model can reason about.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::debug;

use patchmasta_audio::{analyze, compare, load_wav, save_wav, AudioRecorder};
use patchmasta_patch::ProgramEditor;

use crate::tools::ToolRequest;

/// Executes parsed tool requests and tracks the values set this session.
pub struct ToolExecutor {
    editor: Arc<ProgramEditor>,
    recorder: AudioRecorder,
    /// Last value written per parameter; the device cannot be queried.
    param_state: Mutex<HashMap<String, i64>>,
}

impl ToolExecutor {
    pub fn new(editor: Arc<ProgramEditor>, recorder: AudioRecorder) -> Self {
        Self {
            editor,
            recorder,
            param_state: Mutex::new(HashMap::new()),
        }
    }

    pub fn editor(&self) -> &ProgramEditor {
        &self.editor
    }

    /// Run one tool call to completion and describe the outcome.
    pub fn execute(&self, request: ToolRequest) -> String {
        debug!("tool call: {request:?}");
        match request {
            ToolRequest::SetParameter { name, value } => self.set_parameter(&name, value),
            ToolRequest::GetParameter { name } => self.get_parameter(&name),
            ToolRequest::ListParameters => self.list_parameters(),
            ToolRequest::TriggerNote {
                note,
                velocity,
                duration_ms,
            } => self.trigger_note(note, velocity, duration_ms),
            ToolRequest::RecordAudio { duration_s } => self.record_audio(duration_s),
            ToolRequest::AnalyzeAudio { wav_path } => self.analyze_audio(&wav_path),
            ToolRequest::CompareAudio {
                target_path,
                recorded_path,
            } => self.compare_audio(&target_path, &recorded_path),
        }
    }

    fn set_parameter(&self, name: &str, value: i64) -> String {
        if self.editor.params().get(name).is_none() {
            return format!("Unknown parameter: {name}");
        }
        match self.editor.write_param(name, value) {
            Ok(applied) => {
                self.param_state.lock().insert(name.to_string(), applied as i64);
                format!("Set {name} = {applied}")
            }
            Err(patchmasta_patch::Error::Device(patchmasta_device::Error::NotConnected)) => {
                "Device not connected".to_string()
            }
            Err(e) => format!("Failed to set {name}: {e}"),
        }
    }

    fn get_parameter(&self, name: &str) -> String {
        if self.editor.params().get(name).is_none() {
            return format!("Unknown parameter: {name}");
        }
        if let Some(value) = self.param_state.lock().get(name) {
            return format!("{name} = {value}");
        }
        // SysEx-addressed parameters can fall back to the loaded buffer.
        if let Ok(Some(value)) = self.editor.read_param(name) {
            return format!("{name} = {value}");
        }
        format!("{name} = unknown (not yet set in this session)")
    }

    fn list_parameters(&self) -> String {
        let state = self.param_state.lock();
        self.editor
            .params()
            .list_all()
            .iter()
            .map(|p| {
                let current = state
                    .get(p.name)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!(
                    "{}: {} [{}-{}] current={current}",
                    p.name, p.description, p.min, p.max
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn trigger_note(&self, note: u8, velocity: u8, duration_ms: u64) -> String {
        let session = match self.editor.session() {
            Some(s) if s.connected() => s,
            _ => return "Device not connected".to_string(),
        };
        let channel = session.codec().channel();
        if let Err(e) = session.send_note_on(channel, note, velocity) {
            return format!("Failed to play note: {e}");
        }
        std::thread::sleep(Duration::from_millis(duration_ms));
        if let Err(e) = session.send_note_off(channel, note) {
            return format!("Failed to release note: {e}");
        }
        format!("Played note {note} vel={velocity} for {duration_ms}ms")
    }

    fn record_audio(&self, duration_s: f32) -> String {
        let samples = match self.recorder.record(duration_s) {
            Ok(s) => s,
            Err(e) => return format!("Audio recording failed: {e}"),
        };
        let path = temp_wav_path();
        match save_wav(&path, &samples, self.recorder.sample_rate()) {
            Ok(()) => path.display().to_string(),
            Err(e) => format!("Failed to save recording: {e}"),
        }
    }

    fn analyze_audio(&self, wav_path: &Path) -> String {
        match load_wav(wav_path) {
            Ok((samples, rate)) => {
                let report = analyze(&samples, rate);
                serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| format!("Failed to serialize analysis: {e}"))
            }
            Err(e) => format!("Could not read {}: {e}", wav_path.display()),
        }
    }

    fn compare_audio(&self, target_path: &Path, recorded_path: &Path) -> String {
        let (target, rate) = match load_wav(target_path) {
            Ok(t) => t,
            Err(e) => return format!("Could not read {}: {e}", target_path.display()),
        };
        let (recorded, _) = match load_wav(recorded_path) {
            Ok(r) => r,
            Err(e) => return format!("Could not read {}: {e}", recorded_path.display()),
        };
        let report = compare(&target, &recorded, rate);
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| format!("Failed to serialize comparison: {e}"))
    }
}

fn temp_wav_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("patchmasta-rec-{nanos}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchmasta_audio::generate_test_tone;
    use serde_json::json;

    fn executor() -> ToolExecutor {
        ToolExecutor::new(
            Arc::new(ProgramEditor::new(None)),
            AudioRecorder::new(None, 44100),
        )
    }

    fn executor_with_program() -> ToolExecutor {
        let editor = ProgramEditor::new(None);
        editor.load_program(vec![0u8; 400]).unwrap();
        ToolExecutor::new(Arc::new(editor), AudioRecorder::new(None, 44100))
    }

    #[test]
    fn test_unknown_parameter_is_text_not_error() {
        let result = executor().execute(ToolRequest::SetParameter {
            name: "warp_drive".into(),
            value: 1,
        });
        assert_eq!(result, "Unknown parameter: warp_drive");
    }

    #[test]
    fn test_nrpn_set_without_device_reports_disconnected() {
        let result = executor().execute(ToolRequest::SetParameter {
            name: "voice_mode".into(),
            value: 2,
        });
        assert_eq!(result, "Device not connected");
    }

    #[test]
    fn test_sysex_set_works_offline_and_updates_state() {
        let ex = executor_with_program();
        let result = ex.execute(ToolRequest::SetParameter {
            name: "fx1_type".into(),
            value: 500,
        });
        assert_eq!(result, "Set fx1_type = 17"); // clamped

        let result = ex.execute(ToolRequest::GetParameter {
            name: "fx1_type".into(),
        });
        assert_eq!(result, "fx1_type = 17");
    }

    #[test]
    fn test_get_unset_parameter() {
        let result = executor().execute(ToolRequest::GetParameter {
            name: "voice_mode".into(),
        });
        assert_eq!(result, "voice_mode = unknown (not yet set in this session)");
    }

    #[test]
    fn test_list_parameters_includes_ranges() {
        let listing = executor().execute(ToolRequest::ListParameters);
        assert!(listing.contains("voice_mode: Voice mode [0-127] current=?"));
        assert!(listing.contains("fx1_type"));
        assert!(listing.lines().count() >= 20);
    }

    #[test]
    fn test_trigger_note_without_device() {
        let result = executor().execute(ToolRequest::TriggerNote {
            note: 60,
            velocity: 100,
            duration_ms: 1,
        });
        assert_eq!(result, "Device not connected");
    }

    #[test]
    fn test_analyze_audio_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        save_wav(&path, &generate_test_tone(440.0, 0.5, 44100), 44100).unwrap();

        let result = executor().execute(ToolRequest::AnalyzeAudio {
            wav_path: path.clone(),
        });
        let report: serde_json::Value = serde_json::from_str(&result).unwrap();
        let f0 = report["fundamental_hz"].as_f64().unwrap();
        assert!((430.0..=450.0).contains(&f0));
    }

    #[test]
    fn test_analyze_missing_file_is_text() {
        let result = executor().execute(ToolRequest::AnalyzeAudio {
            wav_path: "/no/such/file.wav".into(),
        });
        assert!(result.starts_with("Could not read"));
    }

    #[test]
    fn test_compare_audio_distance() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        save_wav(&a, &generate_test_tone(440.0, 0.5, 44100), 44100).unwrap();
        save_wav(&b, &generate_test_tone(880.0, 0.5, 44100), 44100).unwrap();

        let ex = executor();
        let same: serde_json::Value = serde_json::from_str(&ex.execute(
            ToolRequest::CompareAudio {
                target_path: a.clone(),
                recorded_path: a.clone(),
            },
        ))
        .unwrap();
        assert!(same["spectral_distance"].as_f64().unwrap() < 0.01);

        let octave: serde_json::Value = serde_json::from_str(&ex.execute(
            ToolRequest::CompareAudio {
                target_path: a,
                recorded_path: b,
            },
        ))
        .unwrap();
        assert!(octave["spectral_distance"].as_f64().unwrap() > 0.1);
    }

    #[test]
    fn test_parse_then_execute_unknown_tool() {
        // The driver path: parse failure text goes straight to the model.
        let err = ToolRequest::parse("fly", &json!({})).unwrap_err();
        assert!(err.contains("Unknown tool"));
    }
}
