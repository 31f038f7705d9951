//! Port enumeration and the outbound transport seam.

use midir::{MidiInput, MidiOutput};
use tracing::warn;

use crate::error::Result;

/// Substring identifying the keytar's ports in the system port list.
pub const DEVICE_NAME_FRAGMENT: &str = "RK-100S";

/// Outbound byte sink. Production wraps a `midir` output connection; tests
/// install an in-memory loopback.
pub trait MidiTransport: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

pub(crate) struct MidirTransport {
    pub(crate) conn: midir::MidiOutputConnection,
}

impl MidiTransport for MidirTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.conn.send(bytes)?;
        Ok(())
    }
}

/// Names of all MIDI output ports.
pub fn list_ports() -> Vec<String> {
    let midi_out = match MidiOutput::new("patchmasta-port-list") {
        Ok(m) => m,
        Err(e) => {
            warn!("MIDI unavailable: {e}");
            return Vec::new();
        }
    };
    midi_out
        .ports()
        .iter()
        .map(|p| {
            midi_out
                .port_name(p)
                .unwrap_or_else(|_| "Unknown Port".to_string())
        })
        .collect()
}

/// Index of the keytar's port in `ports`, if present.
///
/// Prefers the SOUND port - that is the internal synth, which answers
/// SysEx dump requests - then falls back to any matching port.
pub fn find_device(ports: &[String]) -> Option<usize> {
    ports
        .iter()
        .position(|n| n.contains(DEVICE_NAME_FRAGMENT) && n.contains("SOUND"))
        .or_else(|| ports.iter().position(|n| n.contains(DEVICE_NAME_FRAGMENT)))
}

/// Index of the device's input port, matched by name rather than by output
/// index - the two port lists are numbered independently on Windows.
pub(crate) fn find_input_port(midi_in: &MidiInput) -> Option<midir::MidiInputPort> {
    midi_in.ports().into_iter().find(|p| {
        midi_in
            .port_name(p)
            .map(|n| n.contains(DEVICE_NAME_FRAGMENT))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_device_prefers_sound_port() {
        let ports = vec![
            "RK-100S 2 KEYBOARD".to_string(),
            "RK-100S 2 SOUND".to_string(),
            "Some Other Synth".to_string(),
        ];
        assert_eq!(find_device(&ports), Some(1));
    }

    #[test]
    fn test_find_device_falls_back_to_any_match() {
        let ports = vec![
            "Some Other Synth".to_string(),
            "RK-100S 2 KEYBOARD".to_string(),
        ];
        assert_eq!(find_device(&ports), Some(1));
    }

    #[test]
    fn test_find_device_none_when_absent() {
        let ports = vec!["microKORG".to_string()];
        assert_eq!(find_device(&ports), None);
        assert_eq!(find_device(&[]), None);
    }
}
