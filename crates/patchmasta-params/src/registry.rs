//! The flat catalog of user-addressable parameters.

use std::collections::HashMap;

use patchmasta_sysex::{FxSlot, Section};

use crate::param::{MidiAddress, ParamDef};

/// Name-indexed parameter catalog with stable iteration order.
///
/// Insertion order is preserved so tool enumeration and test output stay
/// deterministic.
pub struct ParamRegistry {
    params: Vec<ParamDef>,
    index: HashMap<&'static str, usize>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            params: Vec::new(),
            index: HashMap::new(),
        };
        for p in catalog() {
            reg.insert(p);
        }
        reg
    }

    fn insert(&mut self, param: ParamDef) {
        debug_assert!(
            !self.index.contains_key(param.name),
            "duplicate parameter name"
        );
        self.index.insert(param.name, self.params.len());
        self.params.push(param);
    }

    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    pub fn list_all(&self) -> &[ParamDef] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl Default for ParamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn nrpn(
    name: &'static str,
    description: &'static str,
    sonic_effect: &'static str,
    msb: u8,
    lsb: u8,
) -> ParamDef {
    ParamDef {
        name,
        description,
        sonic_effect,
        min: 0,
        max: 127,
        address: MidiAddress::Nrpn { msb, lsb },
    }
}

fn sysex(
    name: &'static str,
    description: &'static str,
    sonic_effect: &'static str,
    max: u8,
    offset: usize,
) -> ParamDef {
    ParamDef {
        name,
        description,
        sonic_effect,
        min: 0,
        max,
        address: MidiAddress::Sysex { offset },
    }
}

/// Every entry the editor and the AI tools can address by name.
///
/// NRPN addresses come from the MIDI implementation chart; SysEx offsets
/// were discovered by patch diffing against the hardware.
fn catalog() -> Vec<ParamDef> {
    vec![
        nrpn(
            "arp_on_off",
            "Arpeggiator on/off",
            "Enables/disables the arpeggiator",
            0x00,
            0x02,
        ),
        nrpn(
            "arp_latch",
            "Arpeggiator latch",
            "Holds the arpeggio after releasing keys",
            0x00,
            0x04,
        ),
        nrpn(
            "arp_type",
            "Arpeggiator type",
            "Pattern: Up, Down, Alt1, Alt2, Random, Trigger",
            0x00,
            0x07,
        ),
        nrpn(
            "arp_gate",
            "Arpeggiator gate time",
            "Duration of each arpeggio note",
            0x00,
            0x0A,
        ),
        nrpn(
            "arp_select",
            "Arpeggiator timbre select",
            "Which timbre the arp applies to",
            0x00,
            0x0B,
        ),
        nrpn(
            "voice_mode",
            "Voice mode",
            "Single/Layer/Split/Multi timbre mode",
            0x05,
            0x00,
        ),
        nrpn(
            "patch1_source",
            "Virtual Patch 1 source",
            "Modulation source for patch 1",
            0x04,
            0x00,
        ),
        nrpn(
            "patch2_source",
            "Virtual Patch 2 source",
            "Modulation source for patch 2",
            0x04,
            0x01,
        ),
        nrpn(
            "patch3_source",
            "Virtual Patch 3 source",
            "Modulation source for patch 3",
            0x04,
            0x02,
        ),
        nrpn(
            "patch1_dest",
            "Virtual Patch 1 destination",
            "Parameter modulated by patch 1",
            0x04,
            0x08,
        ),
        nrpn(
            "patch2_dest",
            "Virtual Patch 2 destination",
            "Parameter modulated by patch 2",
            0x04,
            0x09,
        ),
        nrpn(
            "patch3_dest",
            "Virtual Patch 3 destination",
            "Parameter modulated by patch 3",
            0x04,
            0x0A,
        ),
        nrpn(
            "vocoder_sw",
            "Vocoder on/off",
            "Enables/disables the vocoder",
            0x05,
            0x04,
        ),
        // Master effect selectors and ribbon routing live only in the dump.
        sysex(
            "fx1_type",
            "Master effect 1 type",
            "Selects the algorithm for effect slot 1",
            17,
            FxSlot::One.type_offset(),
        ),
        sysex(
            "fx1_ribbon_assign",
            "Effect 1 ribbon assign",
            "Which effect-1 parameter the long ribbon modulates (31 = off)",
            31,
            FxSlot::One.ribbon_assign_offset(),
        ),
        sysex(
            "fx1_ribbon_polarity",
            "Effect 1 ribbon polarity",
            "Direction of ribbon modulation for effect 1",
            1,
            FxSlot::One.ribbon_polarity_offset(),
        ),
        sysex(
            "fx2_type",
            "Master effect 2 type",
            "Selects the algorithm for effect slot 2",
            17,
            FxSlot::Two.type_offset(),
        ),
        sysex(
            "fx2_ribbon_assign",
            "Effect 2 ribbon assign",
            "Which effect-2 parameter the long ribbon modulates (31 = off)",
            31,
            FxSlot::Two.ribbon_assign_offset(),
        ),
        sysex(
            "fx2_ribbon_polarity",
            "Effect 2 ribbon polarity",
            "Direction of ribbon modulation for effect 2",
            1,
            FxSlot::Two.ribbon_polarity_offset(),
        ),
        sysex(
            "vocoder_fc_offset",
            "Vocoder filter offset",
            "Shifts the vocoder band center frequencies",
            127,
            Section::Gap.packed(2),
        ),
        sysex(
            "vocoder_resonance",
            "Vocoder resonance",
            "Sharpness of the vocoder band filters",
            127,
            Section::Gap.packed(3),
        ),
        sysex(
            "vocoder_fc_mod_int",
            "Vocoder Fc mod intensity",
            "Depth of filter-frequency modulation",
            127,
            Section::Gap.packed(4),
        ),
        sysex(
            "vocoder_ef_sens",
            "Vocoder envelope sensitivity",
            "Responsiveness of the envelope followers",
            127,
            Section::Gap.packed(5),
        ),
    ]
}
