//! The tool catalog and typed tool dispatch.
//!
//! Seven tools are visible to the model. Incoming calls are parsed into a
//! closed [`ToolRequest`] enum before execution; a name or payload the
//! parser does not recognize becomes an error string for the model, never
//! a crash.

use std::path::PathBuf;

use serde_json::{json, Value};

/// JSON tool schemas, in the order they are presented to the model.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "set_parameter",
            "description": "Set a synth parameter on the connected Korg RK-100S 2. The parameter change is sent immediately via MIDI and heard in real-time.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Parameter name (e.g., 'voice_mode', 'arp_on_off')"},
                    "value": {"type": "integer", "description": "Value to set (within the parameter's valid range)"},
                },
                "required": ["name", "value"],
            },
        }),
        json!({
            "name": "get_parameter",
            "description": "Get the current value of a synth parameter.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Parameter name"},
                },
                "required": ["name"],
            },
        }),
        json!({
            "name": "list_parameters",
            "description": "List all available synth parameters with their current values, valid ranges, and descriptions.",
            "input_schema": {"type": "object", "properties": {}},
        }),
        json!({
            "name": "trigger_note",
            "description": "Play a MIDI note on the synth so we can hear or record the current sound.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "note": {"type": "integer", "description": "MIDI note number (60 = middle C)", "default": 60},
                    "velocity": {"type": "integer", "description": "Note velocity (0-127)", "default": 100},
                    "duration_ms": {"type": "integer", "description": "Duration in milliseconds", "default": 1000},
                },
            },
        }),
        json!({
            "name": "record_audio",
            "description": "Record audio from the computer's audio input for the specified duration. Returns the file path of the recorded WAV.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "duration_s": {"type": "number", "description": "Recording duration in seconds", "default": 2.0},
                },
            },
        }),
        json!({
            "name": "analyze_audio",
            "description": "Analyze a WAV file and return spectral characteristics: fundamental frequency, harmonic content, spectral centroid, amplitude envelope shape.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "wav_path": {"type": "string", "description": "Path to the WAV file to analyze"},
                },
                "required": ["wav_path"],
            },
        }),
        json!({
            "name": "compare_audio",
            "description": "Compare two audio files spectrally and return a similarity report showing which features differ most.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "target_path": {"type": "string", "description": "Path to the target WAV file"},
                    "recorded_path": {"type": "string", "description": "Path to the recorded WAV file"},
                },
                "required": ["target_path", "recorded_path"],
            },
        }),
    ]
}

/// A parsed, typed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    SetParameter { name: String, value: i64 },
    GetParameter { name: String },
    ListParameters,
    TriggerNote { note: u8, velocity: u8, duration_ms: u64 },
    RecordAudio { duration_s: f32 },
    AnalyzeAudio { wav_path: PathBuf },
    CompareAudio { target_path: PathBuf, recorded_path: PathBuf },
}

impl ToolRequest {
    /// Parse a model-issued call. The error is the text handed back to the
    /// model as the tool result.
    pub fn parse(name: &str, input: &Value) -> std::result::Result<Self, String> {
        match name {
            "set_parameter" => Ok(ToolRequest::SetParameter {
                name: required_str(input, "name")?,
                value: input
                    .get("value")
                    .and_then(Value::as_i64)
                    .ok_or("set_parameter requires an integer 'value'")?,
            }),
            "get_parameter" => Ok(ToolRequest::GetParameter {
                name: required_str(input, "name")?,
            }),
            "list_parameters" => Ok(ToolRequest::ListParameters),
            "trigger_note" => Ok(ToolRequest::TriggerNote {
                note: u7_or(input, "note", 60),
                velocity: u7_or(input, "velocity", 100),
                duration_ms: input
                    .get("duration_ms")
                    .and_then(Value::as_u64)
                    .unwrap_or(1000),
            }),
            "record_audio" => Ok(ToolRequest::RecordAudio {
                duration_s: input
                    .get("duration_s")
                    .and_then(Value::as_f64)
                    .unwrap_or(2.0) as f32,
            }),
            "analyze_audio" => Ok(ToolRequest::AnalyzeAudio {
                wav_path: required_str(input, "wav_path")?.into(),
            }),
            "compare_audio" => Ok(ToolRequest::CompareAudio {
                target_path: required_str(input, "target_path")?.into(),
                recorded_path: required_str(input, "recorded_path")?.into(),
            }),
            other => Err(format!("Unknown tool: {other}")),
        }
    }
}

fn required_str(input: &Value, key: &str) -> std::result::Result<String, String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("missing required string field '{key}'"))
}

fn u7_or(input: &Value, key: &str, default: u8) -> u8 {
    input
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| (v as u8) & 0x7F)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 7);
        for def in &defs {
            assert!(def["name"].is_string());
            assert!(def["description"].is_string());
            assert!(def["input_schema"].is_object());
        }
        let names: Vec<_> = defs.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"set_parameter"));
        assert!(names.contains(&"list_parameters"));
        assert!(names.contains(&"trigger_note"));
        assert!(names.contains(&"compare_audio"));
    }

    #[test]
    fn test_parse_set_parameter() {
        let req = ToolRequest::parse(
            "set_parameter",
            &json!({"name": "voice_mode", "value": 2}),
        )
        .unwrap();
        assert_eq!(
            req,
            ToolRequest::SetParameter {
                name: "voice_mode".into(),
                value: 2
            }
        );
    }

    #[test]
    fn test_parse_trigger_note_defaults() {
        let req = ToolRequest::parse("trigger_note", &json!({})).unwrap();
        assert_eq!(
            req,
            ToolRequest::TriggerNote {
                note: 60,
                velocity: 100,
                duration_ms: 1000
            }
        );
    }

    #[test]
    fn test_parse_failures_are_strings() {
        assert!(ToolRequest::parse("set_parameter", &json!({"name": "x"})).is_err());
        assert!(ToolRequest::parse("analyze_audio", &json!({})).is_err());
        let err = ToolRequest::parse("teleport", &json!({})).unwrap_err();
        assert!(err.contains("Unknown tool"));
    }

    #[test]
    fn test_every_catalog_entry_parses() {
        // Each advertised tool round-trips through the parser with a
        // minimal valid payload.
        let payloads = [
            ("set_parameter", json!({"name": "x", "value": 0})),
            ("get_parameter", json!({"name": "x"})),
            ("list_parameters", json!({})),
            ("trigger_note", json!({})),
            ("record_audio", json!({})),
            ("analyze_audio", json!({"wav_path": "/tmp/a.wav"})),
            (
                "compare_audio",
                json!({"target_path": "/tmp/a.wav", "recorded_path": "/tmp/b.wav"}),
            ),
        ];
        for def in tool_definitions() {
            let name = def["name"].as_str().unwrap();
            let (_, payload) = payloads.iter().find(|(n, _)| *n == name).unwrap();
            assert!(ToolRequest::parse(name, payload).is_ok(), "{name}");
        }
    }
}
