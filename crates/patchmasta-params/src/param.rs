//! Parameter definitions and their MIDI encodings.

use crate::error::{Error, Result};

/// How a parameter reaches the device.
///
/// Exactly one addressing per parameter: an NRPN pair, a plain CC, or a
/// packed byte offset inside the program dump (SysEx-only parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiAddress {
    Nrpn { msb: u8, lsb: u8 },
    Cc(u8),
    Sysex { offset: usize },
}

/// One user-addressable synth parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub description: &'static str,
    /// What turning it does to the sound; surfaced to the AI tools.
    pub sonic_effect: &'static str,
    pub min: u8,
    pub max: u8,
    pub address: MidiAddress,
}

impl ParamDef {
    pub fn clamp(&self, value: i64) -> u8 {
        value.clamp(self.min as i64, self.max as i64) as u8
    }

    /// Build the channel-message bytes that set this parameter live.
    ///
    /// NRPN parameters produce three concatenated 3-byte CC messages
    /// (address MSB, address LSB, data entry); CC parameters produce one.
    /// The value is clamped to the parameter range first. SysEx-addressed
    /// parameters have no channel-message form and fail with
    /// [`Error::NoMidiAddress`] - they are written through the program
    /// buffer instead.
    pub fn build_message(&self, channel: u8, value: i64) -> Result<Vec<u8>> {
        let value = self.clamp(value);
        let ch = (channel.wrapping_sub(1)) & 0x0F;
        match self.address {
            MidiAddress::Nrpn { msb, lsb } => Ok(vec![
                0xB0 | ch,
                99,
                msb,
                0xB0 | ch,
                98,
                lsb,
                0xB0 | ch,
                6,
                value & 0x7F,
            ]),
            MidiAddress::Cc(cc) => Ok(vec![0xB0 | ch, cc, value & 0x7F]),
            MidiAddress::Sysex { .. } => Err(Error::NoMidiAddress(self.name.to_string())),
        }
    }

    /// Packed program-buffer offset, for SysEx-addressed parameters.
    pub fn sysex_offset(&self) -> Option<usize> {
        match self.address {
            MidiAddress::Sysex { offset } => Some(offset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nrpn_param() -> ParamDef {
        ParamDef {
            name: "voice_mode",
            description: "Voice mode",
            sonic_effect: "Single/Layer/Split/Multi timbre mode",
            min: 0,
            max: 127,
            address: MidiAddress::Nrpn { msb: 0x05, lsb: 0x00 },
        }
    }

    #[test]
    fn test_nrpn_byte_exactness() {
        let msg = nrpn_param().build_message(1, 63).unwrap();
        assert_eq!(msg, vec![0xB0, 99, 5, 0xB0, 98, 0, 0xB0, 6, 63]);
    }

    #[test]
    fn test_channel_encoding() {
        let msg = nrpn_param().build_message(3, 0).unwrap();
        assert_eq!(msg[0], 0xB2);
        assert_eq!(msg[3], 0xB2);
        assert_eq!(msg[6], 0xB2);
    }

    #[test]
    fn test_cc_message() {
        let p = ParamDef {
            name: "volume",
            description: "Channel volume",
            sonic_effect: "Overall loudness",
            min: 0,
            max: 127,
            address: MidiAddress::Cc(7),
        };
        assert_eq!(p.build_message(1, 100).unwrap(), vec![0xB0, 7, 100]);
    }

    #[test]
    fn test_value_clamping() {
        let p = ParamDef {
            name: "b1_gain",
            description: "Band 1 gain",
            sonic_effect: "Low band boost/cut",
            min: 0,
            max: 36,
            address: MidiAddress::Cc(20),
        };
        assert_eq!(p.build_message(1, 500).unwrap()[2], 36);
        assert_eq!(p.build_message(1, -5).unwrap()[2], 0);
        assert_eq!(p.clamp(12), 12);
    }

    #[test]
    fn test_sysex_param_has_no_channel_message() {
        let p = ParamDef {
            name: "fx1_type",
            description: "Master effect 1 type",
            sonic_effect: "Selects the effect algorithm",
            min: 0,
            max: 17,
            address: MidiAddress::Sysex { offset: 327 },
        };
        assert!(matches!(
            p.build_message(1, 3),
            Err(Error::NoMidiAddress(_))
        ));
        assert_eq!(p.sysex_offset(), Some(327));
    }
}
