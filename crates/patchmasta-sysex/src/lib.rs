//! SysEx protocol layer for the Korg RK-100S 2.
//!
//! Provides message framing and parsing, the 7-bit packed-offset arithmetic
//! used to address bytes inside a program dump, and a raw program buffer
//! with typed byte access.
//!
//! All functions operate on plain byte slices - no MIDI I/O here.

pub mod error;
pub use error::{Error, Result};

mod codec;
pub use codec::{
    extract_patch_name, KorgCodec, FUNC_ALL_DUMP_REQUEST, FUNC_PROGRAM_DUMP,
    FUNC_PROGRAM_DUMP_REQUEST, KORG_ID, PATCH_NAME_LEN,
};

mod offsets;
pub use offsets::{
    fx_param_packed, FxSlot, Section, FX_PARAM_SLOTS, MAX_EFFECT_TYPE, RIBBON_ASSIGN_OFF,
};

mod buffer;
pub use buffer::ProgramBuffer;

/// Model id of the RK-100S 2 in Korg SysEx headers.
///
/// Placeholder pending verification against the Parameter Guide; callers
/// should take the value from configuration rather than this constant.
pub const DEFAULT_MODEL_ID: u8 = 0x57;
