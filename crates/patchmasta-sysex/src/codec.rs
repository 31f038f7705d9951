//! Korg SysEx message framing and parsing.
//!
//! All RK-100S 2 exclusive messages share the header
//! `[F0, 42, 30+(channel-1), model_id, func]` and end with `F7`. The global
//! MIDI channel is encoded in the third byte; inbound messages are accepted
//! on any channel.

use crate::error::{Error, Result};

/// Korg manufacturer id.
pub const KORG_ID: u8 = 0x42;

/// Request a single program dump (body: program index, low 7 bits).
pub const FUNC_PROGRAM_DUMP_REQUEST: u8 = 0x10;
/// Request a dump of all programs.
pub const FUNC_ALL_DUMP_REQUEST: u8 = 0x0E;
/// Program dump, both directions.
pub const FUNC_PROGRAM_DUMP: u8 = 0x40;

/// Display name length inside a program dump payload.
pub const PATCH_NAME_LEN: usize = 12;

/// Builder/parser for Korg-framed messages on a fixed channel and model id.
///
/// The model id defaults to [`crate::DEFAULT_MODEL_ID`] but is configurable:
/// it has not yet been verified against hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KorgCodec {
    channel: u8,
    model_id: u8,
}

impl KorgCodec {
    /// `channel` is the 1-based global MIDI channel.
    pub fn new(channel: u8, model_id: u8) -> Result<Self> {
        if !(1..=16).contains(&channel) {
            return Err(Error::InvalidChannel(channel));
        }
        Ok(Self { channel, model_id })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn model_id(&self) -> u8 {
        self.model_id
    }

    fn channel_byte(&self) -> u8 {
        0x30 + (self.channel - 1)
    }

    fn header(&self, func: u8) -> [u8; 5] {
        [0xF0, KORG_ID, self.channel_byte(), self.model_id, func]
    }

    /// Dump request for one program slot. The request index is 7-bit; slots
    /// above 127 are selected with a preceding program change.
    pub fn program_dump_request(&self, program: u8) -> Vec<u8> {
        let mut msg = self.header(FUNC_PROGRAM_DUMP_REQUEST).to_vec();
        msg.push(program & 0x7F);
        msg.push(0xF7);
        msg
    }

    pub fn all_dump_request(&self) -> Vec<u8> {
        let mut msg = self.header(FUNC_ALL_DUMP_REQUEST).to_vec();
        msg.push(0xF7);
        msg
    }

    /// Write a full program image to the device edit buffer.
    ///
    /// The 0x40 body is the opaque program image; the slot is whatever the
    /// device currently has selected.
    pub fn program_write(&self, payload: &[u8]) -> Vec<u8> {
        let mut msg = Vec::with_capacity(payload.len() + 6);
        msg.extend_from_slice(&self.header(FUNC_PROGRAM_DUMP));
        msg.extend_from_slice(payload);
        msg.push(0xF7);
        msg
    }

    /// Extract the payload of a program dump.
    ///
    /// Validates the frame start, manufacturer, model id and function byte.
    /// The channel byte is deliberately not checked so devices on any global
    /// channel are accepted.
    pub fn parse_program_dump<'a>(&self, message: &'a [u8]) -> Result<&'a [u8]> {
        if message.len() < 6 {
            return Err(Error::NotAKorgDump);
        }
        if message[0] != 0xF0 || message[1] != KORG_ID {
            return Err(Error::NotAKorgDump);
        }
        if message[3] != self.model_id || message[4] != FUNC_PROGRAM_DUMP {
            return Err(Error::NotAKorgDump);
        }
        let end = if message[message.len() - 1] == 0xF7 {
            message.len() - 1
        } else {
            message.len()
        };
        Ok(&message[5..end])
    }

    // Plain channel messages used around dump pulls.

    pub fn program_change(&self, program: u8) -> Vec<u8> {
        vec![0xC0 | (self.channel - 1), program & 0x7F]
    }

    pub fn note_on(&self, note: u8, velocity: u8) -> Vec<u8> {
        vec![0x90 | (self.channel - 1), note & 0x7F, velocity & 0x7F]
    }

    pub fn note_off(&self, note: u8) -> Vec<u8> {
        vec![0x80 | (self.channel - 1), note & 0x7F, 0]
    }
}

impl Default for KorgCodec {
    fn default() -> Self {
        Self {
            channel: 1,
            model_id: crate::DEFAULT_MODEL_ID,
        }
    }
}

/// Read the display name out of a program dump payload.
///
/// The name occupies the first 12 bytes, filtered to printable ASCII and
/// right-trimmed. Payloads shorter than the name field yield `None`, as
/// does an all-blank name; callers substitute a slot-derived fallback.
pub fn extract_patch_name(payload: &[u8]) -> Option<String> {
    if payload.len() < PATCH_NAME_LEN {
        return None;
    }
    let raw = &payload[..PATCH_NAME_LEN];
    let name: String = raw
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| b as char)
        .collect();
    let trimmed = name.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> KorgCodec {
        KorgCodec::default()
    }

    #[test]
    fn test_dump_request_framing() {
        let msg = codec().program_dump_request(5);
        assert_eq!(msg, vec![0xF0, 0x42, 0x30, 0x57, 0x10, 5, 0xF7]);

        let c = KorgCodec::new(16, 0x57).unwrap();
        let msg = c.program_dump_request(200);
        assert_eq!(msg[2], 0x3F);
        assert_eq!(msg[5], 200 & 0x7F);
    }

    #[test]
    fn test_all_dump_request_framing() {
        let msg = codec().all_dump_request();
        assert_eq!(msg, vec![0xF0, 0x42, 0x30, 0x57, 0x0E, 0xF7]);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        assert!(KorgCodec::new(0, 0x57).is_err());
        assert!(KorgCodec::new(17, 0x57).is_err());
        assert!(KorgCodec::new(1, 0x57).is_ok());
        assert!(KorgCodec::new(16, 0x57).is_ok());
    }

    #[test]
    fn test_write_parse_roundtrip() {
        let payload: Vec<u8> = (0u8..40).collect();
        for channel in 1..=16 {
            let c = KorgCodec::new(channel, 0x57).unwrap();
            let msg = c.program_write(&payload);
            let parsed = c.parse_program_dump(&msg).unwrap();
            assert_eq!(parsed, &payload[..]);
        }
    }

    #[test]
    fn test_parse_rejects_wrong_manufacturer() {
        let mut msg = codec().program_write(&[0; 16]);
        msg[1] = 0x41; // Roland
        assert!(codec().parse_program_dump(&msg).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_model_or_func() {
        let mut msg = codec().program_write(&[0; 16]);
        msg[3] = 0x58;
        assert!(codec().parse_program_dump(&msg).is_err());

        let mut msg = codec().program_write(&[0; 16]);
        msg[4] = 0x4E;
        assert!(codec().parse_program_dump(&msg).is_err());
    }

    #[test]
    fn test_parse_ignores_channel_byte() {
        let mut msg = codec().program_write(&[1, 2, 3, 4, 5, 6]);
        msg[2] = 0x3A; // channel 11
        assert_eq!(
            codec().parse_program_dump(&msg).unwrap(),
            &[1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_parse_rejects_short_messages() {
        assert!(codec().parse_program_dump(&[]).is_err());
        assert!(codec().parse_program_dump(&[0xF0, 0x42, 0x30, 0x57, 0x40]).is_err());
    }

    #[test]
    fn test_name_extraction() {
        let mut payload = b"BrassLead   ".to_vec();
        payload.extend_from_slice(&[0u8; 20]);
        assert_eq!(extract_patch_name(&payload).as_deref(), Some("BrassLead"));

        let mut payload = b"Pad         ".to_vec();
        payload.extend_from_slice(&[0u8; 20]);
        assert_eq!(extract_patch_name(&payload).as_deref(), Some("Pad"));
    }

    #[test]
    fn test_name_extraction_filters_non_printable() {
        let mut payload = vec![0x01, b'L', b'e', b'a', b'd', 0x7F, 0x00];
        payload.extend_from_slice(&[0u8; 20]);
        assert_eq!(extract_patch_name(&payload).as_deref(), Some("Lead"));
    }

    #[test]
    fn test_name_extraction_empty_and_short_inputs() {
        assert_eq!(extract_patch_name(&[]), None);
        assert_eq!(extract_patch_name(b"Pad"), None); // shorter than the name field
        assert_eq!(extract_patch_name(&[0u8; 32]), None);
        assert_eq!(extract_patch_name(&[b' '; 12]), None);
    }

    #[test]
    fn test_program_change_and_notes() {
        let c = KorgCodec::new(3, 0x57).unwrap();
        assert_eq!(c.program_change(10), vec![0xC2, 10]);
        assert_eq!(c.note_on(60, 100), vec![0x92, 60, 100]);
        assert_eq!(c.note_off(60), vec![0x82, 60, 0]);
    }
}
