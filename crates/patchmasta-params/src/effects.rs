//! Master-effect type registry.
//!
//! The RK-100S 2 offers 17 master effect algorithms plus "off". Each type
//! owns up to 23 parameter slots inside the effect's data area; the slot
//! index is the byte position fed to
//! [`patchmasta_sysex::fx_param_packed`]. Parameter tables were extracted
//! from the Korg Sound Editor binary and confirmed against the Parameter
//! Guide; the ribbon-assignable flag marks which parameters the long
//! ribbon can modulate.

/// A single parameter within an effect type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectParam {
    pub key: &'static str,
    pub display_name: &'static str,
    pub min: u8,
    pub max: u8,
    /// Byte position within the effect's data area (0..=22).
    pub slot_index: u8,
    pub ribbon_assignable: bool,
}

/// Definition of one effect type.
#[derive(Debug, Clone)]
pub struct EffectTypeDef {
    pub type_id: u8,
    pub name: &'static str,
    pub params: Vec<EffectParam>,
}

impl EffectTypeDef {
    /// Parameters the ribbon can be assigned to, in slot order.
    pub fn ribbon_assigns(&self) -> impl Iterator<Item = &EffectParam> {
        self.params.iter().filter(|p| p.ribbon_assignable)
    }

    pub fn param(&self, key: &str) -> Option<&EffectParam> {
        self.params.iter().find(|p| p.key == key)
    }

    pub fn param_at_slot(&self, slot_index: u8) -> Option<&EffectParam> {
        self.params.iter().find(|p| p.slot_index == slot_index)
    }
}

/// All 18 effect types, ids 0..=17 in order.
pub struct EffectRegistry {
    types: Vec<EffectTypeDef>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self { types: build_types() }
    }

    pub fn get(&self, type_id: u8) -> Option<&EffectTypeDef> {
        self.types.get(type_id as usize)
    }

    pub fn list_all(&self) -> &[EffectTypeDef] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Ribbon-assignable parameter.
fn rib(key: &'static str, display_name: &'static str, max: u8, slot_index: u8) -> EffectParam {
    EffectParam {
        key,
        display_name,
        min: 0,
        max,
        slot_index,
        ribbon_assignable: true,
    }
}

/// Parameter hidden from the ribbon-assign list.
fn fix(key: &'static str, display_name: &'static str, max: u8, slot_index: u8) -> EffectParam {
    EffectParam {
        key,
        display_name,
        min: 0,
        max,
        slot_index,
        ribbon_assignable: false,
    }
}

fn build_types() -> Vec<EffectTypeDef> {
    let def = |type_id, name, params| EffectTypeDef { type_id, name, params };
    vec![
        def(0, "Effect Off", vec![]),
        def(
            1,
            "Compressor",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("envelope_select", "Envelope Select", 1, 1),
                rib("sensitivity", "Sensitivity", 127, 2),
                rib("attack", "Attack", 127, 3),
                fix("output_level", "Output Level", 127, 4),
            ],
        ),
        def(
            2,
            "Filter",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("filter_type", "Filter Type", 4, 1),
                rib("cutoff", "Cutoff", 127, 2),
                rib("resonance", "Resonance", 127, 3),
                fix("trim", "Trim", 127, 4),
                fix("mod_source", "Mod Source", 1, 5),
                rib("mod_intensity", "Mod Intensity", 127, 6),
                rib("mod_response", "Mod Response", 127, 7),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 8),
                rib("lfo_frequency", "LFO Frequency", 127, 9),
                rib("lfo_sync_note", "LFO Sync Note", 21, 10),
                fix("lfo_waveform", "LFO Waveform", 4, 11),
                fix("lfo_shape", "LFO Shape", 127, 12),
                fix("lfo_key_sync", "LFO KeySync", 1, 13),
                fix("lfo_init_phase", "LFO Init Phase", 127, 14),
                fix("control_source", "Control Source", 7, 15),
            ],
        ),
        def(
            3,
            "4Band EQ",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("trim", "Trim", 127, 1),
                fix("b1_type", "B1 Type", 1, 2),
                fix("b1_frequency", "B1 Frequency", 127, 3),
                fix("b1_q", "B1 Q", 127, 4),
                rib("b1_gain", "B1 Gain", 36, 5),
                fix("b2_frequency", "B2 Frequency", 127, 6),
                fix("b2_q", "B2 Q", 127, 7),
                rib("b2_gain", "B2 Gain", 36, 8),
                fix("b3_frequency", "B3 Frequency", 127, 9),
                fix("b3_q", "B3 Q", 127, 10),
                rib("b3_gain", "B3 Gain", 36, 11),
                fix("b4_type", "B4 Type", 1, 12),
                fix("b4_frequency", "B4 Frequency", 127, 13),
                fix("b4_q", "B4 Q", 127, 14),
                rib("b4_gain", "B4 Gain", 36, 15),
            ],
        ),
        def(
            4,
            "Distortion",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                rib("gain", "Gain", 127, 1),
                fix("pre_eq_frequency", "Pre EQ Frequency", 127, 2),
                fix("pre_eq_q", "Pre EQ Q", 127, 3),
                rib("pre_eq_gain", "Pre EQ Gain", 36, 4),
                fix("b1_frequency", "B1 Frequency", 127, 5),
                fix("b1_q", "B1 Q", 127, 6),
                rib("b1_gain", "B1 Gain", 36, 7),
                fix("b2_frequency", "B2 Frequency", 127, 8),
                fix("b2_q", "B2 Q", 127, 9),
                rib("b2_gain", "B2 Gain", 36, 10),
                fix("b3_frequency", "B3 Frequency", 127, 11),
                fix("b3_q", "B3 Q", 127, 12),
                rib("b3_gain", "B3 Gain", 36, 13),
                fix("output_level", "Output Level", 127, 14),
            ],
        ),
        def(
            5,
            "Decimator",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("pre_lpf", "Pre LPF", 1, 1),
                fix("high_damp", "High Damp", 100, 2),
                rib("fs", "Fs", 127, 3),
                rib("bit", "Bit", 20, 4),
                fix("output_level", "Output Level", 127, 5),
                rib("fs_mod_intensity", "Fs Mod Intensity", 127, 6),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 7),
                rib("lfo_frequency", "LFO Frequency", 127, 8),
                rib("lfo_sync_note", "LFO Sync Note", 21, 9),
                fix("lfo_waveform", "LFO Waveform", 4, 10),
                fix("lfo_shape", "LFO Shape", 127, 11),
                fix("lfo_key_sync", "LFO KeySync", 1, 12),
                fix("lfo_init_phase", "LFO Init Phase", 127, 13),
            ],
        ),
        def(
            6,
            "Delay",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("type", "Type", 1, 1),
                fix("delay_tempo_sync", "Delay Tempo Sync", 1, 2),
                rib("time_ratio", "Time Ratio", 127, 3),
                fix("l_delay_time", "L Delay Time", 127, 4),
                fix("r_delay_time", "R Delay Time", 127, 5),
                rib("feedback", "Feedback", 127, 6),
                fix("high_damp", "High Damp", 100, 7),
                fix("trim", "Trim", 127, 8),
                fix("spread", "Spread", 127, 9),
            ],
        ),
        def(
            7,
            "L/C/R Delay",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("delay_tempo_sync", "Delay Tempo Sync", 1, 1),
                rib("time_ratio", "Time Ratio", 127, 2),
                fix("l_delay_time", "L Delay Time", 127, 3),
                fix("c_delay_time", "C Delay Time", 127, 4),
                fix("r_delay_time", "R Delay Time", 127, 5),
                fix("l_delay_level", "L Delay Level", 127, 6),
                fix("c_delay_level", "C Delay Level", 127, 7),
                fix("r_delay_level", "R Delay Level", 127, 8),
                rib("c_feedback", "C Feedback", 127, 9),
                fix("trim", "Trim", 127, 10),
                fix("spread", "Spread", 127, 11),
            ],
        ),
        def(
            8,
            "Auto Panning Delay",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("delay_tempo_sync", "Delay Tempo Sync", 1, 1),
                rib("time_ratio", "Time Ratio", 127, 2),
                fix("l_delay_time", "L Delay Time", 127, 3),
                fix("r_delay_time", "R Delay Time", 127, 4),
                rib("feedback", "Feedback", 127, 5),
                rib("mod_depth", "Mod Depth", 127, 6),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 7),
                rib("lfo_frequency", "LFO Frequency", 127, 8),
                rib("lfo_sync_note", "LFO Sync Note", 21, 9),
                fix("lfo_waveform", "LFO Waveform", 4, 10),
                fix("lfo_shape", "LFO Shape", 127, 11),
                fix("lfo_key_sync", "LFO KeySync", 1, 12),
                fix("lfo_init_phase", "LFO Init Phase", 127, 13),
                fix("lfo_spread", "LFO Spread", 127, 14),
                fix("high_damp", "High Damp", 100, 15),
                fix("trim", "Trim", 127, 16),
                fix("spread", "Spread", 127, 17),
            ],
        ),
        def(
            9,
            "Modulation Delay",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("delay_tempo_sync", "Delay Tempo Sync", 1, 1),
                rib("time_ratio", "Time Ratio", 127, 2),
                fix("l_delay_time", "L Delay Time", 127, 3),
                fix("r_delay_time", "R Delay Time", 127, 4),
                rib("feedback", "Feedback", 127, 5),
                rib("mod_depth", "Mod Depth", 127, 6),
                rib("lfo_frequency", "LFO Frequency", 127, 7),
                fix("lfo_spread", "LFO Spread", 127, 8),
            ],
        ),
        def(
            10,
            "Tape Echo",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("delay_tempo_sync", "Delay Tempo Sync", 1, 1),
                rib("time_ratio", "Time Ratio", 127, 2),
                fix("tap1_delay_time", "Tap1 Delay Time", 127, 3),
                fix("tap2_delay_time", "Tap2 Delay Time", 127, 4),
                rib("tap1_level", "Tap1 Level", 127, 5),
                rib("tap2_level", "Tap2 Level", 127, 6),
                rib("feedback", "Feedback", 127, 7),
                fix("high_damp", "High Damp", 100, 8),
                fix("low_damp", "Low Damp", 100, 9),
                fix("trim", "Trim", 127, 10),
                rib("saturation", "Saturation", 127, 11),
                fix("wow_flutter_frequency", "WOW Flutter Frequency", 127, 12),
                fix("wow_flutter_depth", "WOW Flutter Depth", 127, 13),
                fix("pre_tone", "Pre Tone", 127, 14),
                fix("spread", "Spread", 127, 15),
            ],
        ),
        def(
            11,
            "Chorus",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                rib("mod_depth", "Mod Depth", 127, 1),
                rib("lfo_frequency", "LFO Frequency", 127, 2),
                fix("lfo_spread", "LFO Spread", 127, 3),
                fix("predelay_l", "PreDelay L", 127, 4),
                fix("predelay_r", "PreDelay R", 127, 5),
                fix("trim", "Trim", 127, 6),
                fix("high_eq_gain", "High EQ Gain", 127, 7),
            ],
        ),
        def(
            12,
            "Flanger",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                rib("delay", "Delay", 127, 1),
                rib("mod_depth", "Mod Depth", 127, 2),
                rib("feedback", "Feedback", 127, 3),
                fix("phase", "Phase", 1, 4),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 5),
                rib("lfo_frequency", "LFO Frequency", 127, 6),
                rib("lfo_sync_note", "LFO Sync Note", 21, 7),
                fix("lfo_waveform", "LFO Waveform", 4, 8),
                fix("lfo_shape", "LFO Shape", 127, 9),
                fix("lfo_key_sync", "LFO KeySync", 1, 10),
                fix("lfo_init_phase", "LFO Init Phase", 127, 11),
                fix("lfo_spread", "LFO Spread", 127, 12),
                fix("high_damp", "High Damp", 100, 13),
            ],
        ),
        def(
            13,
            "Vibrato",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                rib("mod_depth", "Mod Depth", 127, 1),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 2),
                rib("lfo_frequency", "LFO Frequency", 127, 3),
                rib("lfo_sync_note", "LFO Sync Note", 21, 4),
                fix("lfo_waveform", "LFO Waveform", 4, 5),
                fix("lfo_shape", "LFO Shape", 127, 6),
                fix("lfo_key_sync", "LFO KeySync", 1, 7),
                fix("lfo_init_phase", "LFO Init Phase", 127, 8),
                fix("lfo_spread", "LFO Spread", 127, 9),
            ],
        ),
        def(
            14,
            "Phaser",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("type", "Type", 1, 1),
                rib("manual", "Manual", 127, 2),
                rib("mod_depth", "Mod Depth", 127, 3),
                rib("resonance", "Resonance", 127, 4),
                fix("phase", "Phase", 1, 5),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 6),
                rib("lfo_frequency", "LFO Frequency", 127, 7),
                rib("lfo_sync_note", "LFO Sync Note", 21, 8),
                fix("lfo_waveform", "LFO Waveform", 4, 9),
                fix("lfo_shape", "LFO Shape", 127, 10),
                fix("lfo_key_sync", "LFO KeySync", 1, 11),
                fix("lfo_init_phase", "LFO Init Phase", 127, 12),
                fix("lfo_spread", "LFO Spread", 127, 13),
            ],
        ),
        def(
            15,
            "Tremolo",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                rib("mod_depth", "Mod Depth", 127, 1),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 2),
                rib("lfo_frequency", "LFO Frequency", 127, 3),
                rib("lfo_sync_note", "LFO Sync Note", 21, 4),
                fix("lfo_waveform", "LFO Waveform", 4, 5),
                fix("lfo_shape", "LFO Shape", 127, 6),
                fix("lfo_key_sync", "LFO KeySync", 1, 7),
                fix("lfo_init_phase", "LFO Init Phase", 127, 8),
                fix("lfo_spread", "LFO Spread", 127, 9),
            ],
        ),
        def(
            16,
            "Ring Modulator",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("osc_mode", "OSC Mode", 1, 1),
                rib("fixed_frequency", "Fixed Frequency", 127, 2),
                rib("note_offset", "Note Offset", 127, 3),
                fix("note_fine", "Note Fine", 127, 4),
                fix("osc_waveform", "OSC Waveform", 2, 5),
                rib("lfo_intensity", "LFO Intensity", 127, 6),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 7),
                rib("lfo_frequency", "LFO Frequency", 127, 8),
                rib("lfo_sync_note", "LFO Sync Note", 21, 9),
                fix("lfo_waveform", "LFO Waveform", 4, 10),
                fix("lfo_shape", "LFO Shape", 127, 11),
                fix("lfo_key_sync", "LFO KeySync", 1, 12),
                fix("lfo_init_phase", "LFO Init Phase", 127, 13),
                fix("pre_lpf", "Pre LPF", 127, 14),
            ],
        ),
        def(
            17,
            "Grain Shifter",
            vec![
                rib("dry_wet", "Dry/Wet", 127, 0),
                fix("duration_tempo_sync", "Duration Tempo Sync", 1, 1),
                rib("time_ratio", "Time Ratio", 127, 2),
                fix("duration", "Duration", 127, 3),
                fix("lfo_tempo_sync", "LFO Tempo Sync", 1, 4),
                rib("lfo_frequency", "LFO Frequency", 127, 5),
                rib("lfo_sync_note", "LFO Sync Note", 21, 6),
                fix("lfo_key_sync", "LFO KeySync", 1, 7),
                fix("lfo_init_phase", "LFO Init Phase", 127, 8),
                fix("lfo_waveform", "LFO Waveform", 4, 9),
                fix("lfo_shape", "LFO Shape", 127, 10),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchmasta_sysex::{FX_PARAM_SLOTS, MAX_EFFECT_TYPE, RIBBON_ASSIGN_OFF};
    use std::collections::HashSet;

    #[test]
    fn test_registry_has_eighteen_types_in_order() {
        let reg = EffectRegistry::new();
        assert_eq!(reg.len(), 18);
        for (i, t) in reg.list_all().iter().enumerate() {
            assert_eq!(t.type_id, i as u8);
        }
        assert_eq!(reg.get(0).unwrap().name, "Effect Off");
        assert_eq!(reg.get(17).unwrap().name, "Grain Shifter");
        assert!(reg.get(MAX_EFFECT_TYPE + 1).is_none());
    }

    #[test]
    fn test_type_zero_has_no_params() {
        let reg = EffectRegistry::new();
        assert!(reg.get(0).unwrap().params.is_empty());
    }

    #[test]
    fn test_slot_indices_unique_contiguous_and_in_range() {
        let reg = EffectRegistry::new();
        for t in reg.list_all() {
            let mut slots = HashSet::new();
            for p in &t.params {
                assert!(slots.insert(p.slot_index), "{}: dup slot {}", t.name, p.slot_index);
                assert!(p.slot_index < FX_PARAM_SLOTS, "{}", t.name);
                assert_ne!(p.slot_index, RIBBON_ASSIGN_OFF, "{}", t.name);
                assert!(p.min <= p.max);
            }
            // Contiguous from 0.
            for i in 0..t.params.len() as u8 {
                assert!(slots.contains(&i), "{}: missing slot {}", t.name, i);
            }
        }
    }

    #[test]
    fn test_ribbon_assigns_filter() {
        let reg = EffectRegistry::new();
        let comp = reg.get(1).unwrap();
        let keys: Vec<_> = comp.ribbon_assigns().map(|p| p.key).collect();
        assert_eq!(keys, vec!["dry_wet", "sensitivity", "attack"]);

        // Every active type exposes at least dry/wet to the ribbon.
        for t in reg.list_all().iter().skip(1) {
            assert!(t.ribbon_assigns().any(|p| p.key == "dry_wet"), "{}", t.name);
        }
    }

    #[test]
    fn test_lookup_by_key_and_slot() {
        let reg = EffectRegistry::new();
        let filter = reg.get(2).unwrap();
        assert_eq!(filter.param("cutoff").unwrap().slot_index, 2);
        assert_eq!(filter.param_at_slot(3).unwrap().key, "resonance");
        assert!(filter.param("no_such_key").is_none());
    }
}
