//! # Patchmasta - Korg RK-100S 2 patch manager
//!
//! Umbrella crate coordinating the subsystems:
//! - **patchmasta-sysex** - SysEx codec, packed offsets, program buffer
//! - **patchmasta-params** - parameter and effect-type registries
//! - **patchmasta-audio** - spectral analysis, WAV I/O, audio capture
//! - **patchmasta-device** - MIDI session and program-dump correlation
//! - **patchmasta-patch** - patch/bank library and the program editor
//! - **patchmasta-ai** - LLM backends, synth tools, sound matching
//!
//! ## Quick start
//!
//! ```ignore
//! use patchmasta::prelude::*;
//!
//! let config = AppConfig::load();
//! let codec = KorgCodec::new(config.midi_channel, config.model_id)?;
//! let session = DeviceSession::new(codec);
//!
//! let ports = patchmasta::device::list_ports();
//! if let Some(index) = patchmasta::device::find_device(&ports) {
//!     session.connect(index, &ports[index])?;
//! }
//!
//! // Pull a program and start editing it.
//! let editor = std::sync::Arc::new(ProgramEditor::new(Some(session.clone())));
//! if let Some(payload) = session.pull_slot(0, std::time::Duration::from_secs(2))? {
//!     editor.load_program(payload)?;
//! }
//!
//! // Hand the same primitives to the AI sound designer.
//! let backend = config.chat_backend()?;
//! let recorder = AudioRecorder::new(config.audio_input_device.clone(), 44100);
//! let ai = AiController::new(backend, ToolExecutor::new(editor, recorder));
//! ai.send_message("make it sound like a detuned analog brass")?;
//! ```

/// Re-export of the protocol layer for direct access.
pub use patchmasta_sysex as sysex;

pub use patchmasta_sysex::{
    extract_patch_name, fx_param_packed, FxSlot, KorgCodec, ProgramBuffer, Section,
    DEFAULT_MODEL_ID, RIBBON_ASSIGN_OFF,
};

pub use patchmasta_params as params;

pub use patchmasta_params::{
    EffectParam, EffectRegistry, EffectTypeDef, MidiAddress, ParamDef, ParamRegistry,
};

pub use patchmasta_audio as audio;

pub use patchmasta_audio::{
    analyze, compare, generate_test_tone, list_input_devices, load_wav, save_wav, AnalysisReport,
    AudioRecorder, CompareReport,
};

pub use patchmasta_device as device;

pub use patchmasta_device::{
    find_device, list_ports, DeviceSession, MidiTransport, PullProgress, PULL_DEADLINE_MS,
};

pub use patchmasta_patch as patch;

pub use patchmasta_patch::{Bank, Library, Patch, ProgramEditor};

pub use patchmasta_ai as ai;

pub use patchmasta_ai::{
    tool_definitions, AiController, AiEvent, AnthropicBackend, AssistantTurn, ChatBackend,
    Message, OpenAiBackend, ToolExecutor, ToolLoop, ToolRequest,
};

mod config;
pub use config::{AiBackendKind, AppConfig};

mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports.
pub mod prelude {
    pub use crate::config::{AiBackendKind, AppConfig};
    pub use crate::{
        AiController, AudioRecorder, DeviceSession, FxSlot, KorgCodec, Library, Patch,
        ProgramEditor, ToolExecutor,
    };
}
