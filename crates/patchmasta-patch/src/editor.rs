//! Program-buffer editor.
//!
//! All parameter reads and writes go through here so that packed offsets,
//! the currently selected effect types, and the ribbon assignment stay
//! consistent. Writes fan out to the in-memory buffer (for persistence)
//! and, when a device is connected, to the wire for live audition.

use parking_lot::Mutex;
use tracing::debug;

use patchmasta_device::DeviceSession;
use patchmasta_params::{EffectRegistry, EffectTypeDef, MidiAddress, ParamRegistry};
use patchmasta_sysex::{fx_param_packed, FxSlot, ProgramBuffer, MAX_EFFECT_TYPE, RIBBON_ASSIGN_OFF};

use crate::error::{Error, Result};

struct EditorState {
    buffer: ProgramBuffer,
    /// Cached effect types for slots 1 and 2; index by `FxSlot`.
    fx_types: [u8; 2],
}

/// Mediates program-buffer access for UI and AI edits.
///
/// Shared between the foreground and tool workers; a coarse lock guards the
/// buffer together with the effect-type cache so layout resolution never
/// races a type change.
pub struct ProgramEditor {
    state: Mutex<EditorState>,
    params: ParamRegistry,
    effects: EffectRegistry,
    session: Option<DeviceSession>,
}

impl ProgramEditor {
    pub fn new(session: Option<DeviceSession>) -> Self {
        Self {
            state: Mutex::new(EditorState {
                buffer: ProgramBuffer::default(),
                fx_types: [0, 0],
            }),
            params: ParamRegistry::new(),
            effects: EffectRegistry::new(),
            session,
        }
    }

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn session(&self) -> Option<&DeviceSession> {
        self.session.as_ref()
    }

    /// Load a pulled program dump, rejecting buffers whose effect-type
    /// bytes are out of range (the reliable sign of a corrupt or
    /// misaligned image).
    pub fn load_program(&self, payload: Vec<u8>) -> Result<()> {
        if payload.len() <= FxSlot::Two.ribbon_polarity_offset() {
            return Err(Error::CorruptBuffer(format!(
                "program image truncated at {} bytes",
                payload.len()
            )));
        }
        let buffer = ProgramBuffer::new(payload);
        let mut fx_types = [0u8; 2];
        for slot in [FxSlot::One, FxSlot::Two] {
            let type_id = buffer.byte(slot.type_offset())?;
            if type_id > MAX_EFFECT_TYPE {
                return Err(Error::CorruptBuffer(format!(
                    "effect slot {} type byte {type_id} out of range",
                    slot.number()
                )));
            }
            fx_types[slot_index(slot)] = type_id;
        }

        let mut state = self.state.lock();
        state.buffer = buffer;
        state.fx_types = fx_types;
        debug!(
            "loaded program '{}' (fx {} / {})",
            state.buffer.name().unwrap_or_default(),
            state.fx_types[0],
            state.fx_types[1]
        );
        Ok(())
    }

    pub fn has_program(&self) -> bool {
        !self.state.lock().buffer.is_empty()
    }

    pub fn program_bytes(&self) -> Vec<u8> {
        self.state.lock().buffer.as_bytes().to_vec()
    }

    pub fn name(&self) -> Option<String> {
        self.state.lock().buffer.name()
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.buffer.set_name(name)?;
        Ok(())
    }

    pub fn fx_type(&self, slot: FxSlot) -> u8 {
        self.state.lock().fx_types[slot_index(slot)]
    }

    /// Write a registry parameter by name. Returns the clamped value that
    /// was applied.
    ///
    /// NRPN/CC parameters are sent live only - the buffer has no canonical
    /// byte for them. SysEx-addressed parameters modify the buffer and,
    /// when connected, are auditioned by re-sending the program image.
    pub fn write_param(&self, name: &str, value: i64) -> Result<u8> {
        let param = self
            .params
            .get(name)
            .ok_or_else(|| patchmasta_params::Error::UnknownParameter(name.to_string()))?;
        let clamped = param.clamp(value);

        match param.address {
            MidiAddress::Nrpn { .. } | MidiAddress::Cc(_) => {
                let session = self.session.as_ref().ok_or(patchmasta_device::Error::NotConnected)?;
                let channel = session.codec().channel();
                let msg = param.build_message(channel, value)?;
                for chunk in msg.chunks(3) {
                    session.send(chunk)?;
                }
            }
            MidiAddress::Sysex { offset } => {
                {
                    let mut state = self.state.lock();
                    if state.buffer.is_empty() {
                        return Err(Error::NoProgram);
                    }
                    state.buffer.set_byte(offset, clamped)?;
                    if let Some(slot) = fx_slot_for_type_offset(offset) {
                        apply_fx_type_change(&mut state, &self.effects, slot, clamped)?;
                    }
                }
                self.sync_to_device()?;
            }
        }
        Ok(clamped)
    }

    /// Last-written buffer value for SysEx-addressed parameters; NRPN/CC
    /// parameters have no buffer byte and yield `None`.
    pub fn read_param(&self, name: &str) -> Result<Option<u8>> {
        let param = self
            .params
            .get(name)
            .ok_or_else(|| patchmasta_params::Error::UnknownParameter(name.to_string()))?;
        match param.sysex_offset() {
            Some(offset) => {
                let state = self.state.lock();
                if state.buffer.is_empty() {
                    return Ok(None);
                }
                Ok(Some(state.buffer.byte(offset)?))
            }
            None => Ok(None),
        }
    }

    /// Write an effect parameter of the slot's currently selected type,
    /// addressed by its key.
    pub fn write_fx_param(&self, slot: FxSlot, key: &str, value: i64) -> Result<u8> {
        let (clamped, offset) = {
            let mut state = self.state.lock();
            if state.buffer.is_empty() {
                return Err(Error::NoProgram);
            }
            let type_id = state.fx_types[slot_index(slot)];
            let typedef = self.current_type(type_id);
            let param = typedef
                .param(key)
                .ok_or_else(|| patchmasta_params::Error::UnknownParameter(key.to_string()))?;
            let clamped = value.clamp(param.min as i64, param.max as i64) as u8;
            let offset = fx_param_packed(slot, param.slot_index);
            state.buffer.set_byte(offset, clamped)?;
            (clamped, offset)
        };
        debug!("fx{} {key} = {clamped} (packed {offset})", slot.number());
        self.sync_to_device()?;
        Ok(clamped)
    }

    pub fn read_fx_param(&self, slot: FxSlot, key: &str) -> Result<u8> {
        let state = self.state.lock();
        if state.buffer.is_empty() {
            return Err(Error::NoProgram);
        }
        let type_id = state.fx_types[slot_index(slot)];
        let param = self
            .current_type(type_id)
            .param(key)
            .ok_or_else(|| patchmasta_params::Error::UnknownParameter(key.to_string()))?;
        Ok(state.buffer.byte(fx_param_packed(slot, param.slot_index))?)
    }

    /// Push the whole program image to the device. No-op when offline.
    pub fn sync_to_device(&self) -> Result<()> {
        if let Some(session) = &self.session {
            if session.connected() {
                let bytes = {
                    let state = self.state.lock();
                    session.codec().program_write(state.buffer.as_bytes())
                };
                session.send(&bytes)?;
            }
        }
        Ok(())
    }

    fn current_type(&self, type_id: u8) -> &EffectTypeDef {
        // Bounds were validated on load/write.
        self.effects.get(type_id).expect("effect type in range")
    }
}

fn slot_index(slot: FxSlot) -> usize {
    (slot.number() - 1) as usize
}

fn fx_slot_for_type_offset(offset: usize) -> Option<FxSlot> {
    [FxSlot::One, FxSlot::Two]
        .into_iter()
        .find(|s| s.type_offset() == offset)
}

/// Re-resolve the slot layout after a type change. Buffer bytes in the
/// parameter area are preserved verbatim; only the ribbon assignment is
/// checked, and reset to "off" when it no longer names a ribbon-assignable
/// parameter of the new type.
fn apply_fx_type_change(
    state: &mut EditorState,
    effects: &EffectRegistry,
    slot: FxSlot,
    type_id: u8,
) -> crate::error::Result<()> {
    state.fx_types[slot_index(slot)] = type_id;

    let typedef = effects.get(type_id).expect("effect type in range");
    let ribbon_offset = slot.ribbon_assign_offset();
    let assigned = state.buffer.byte(ribbon_offset)?;
    let still_valid = assigned != RIBBON_ASSIGN_OFF
        && typedef
            .ribbon_assigns()
            .any(|p| p.slot_index == assigned);
    if !still_valid && assigned != RIBBON_ASSIGN_OFF {
        debug!(
            "fx{}: ribbon assign {assigned} invalid for type {type_id}, resetting",
            slot.number()
        );
        state.buffer.set_byte(ribbon_offset, RIBBON_ASSIGN_OFF)?;
    }
    Ok(())
}
