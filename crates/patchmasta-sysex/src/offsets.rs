//! Packed-offset arithmetic for the RK-100S 2 program image.
//!
//! Korg dumps interleave every 7 data bytes with a carrier byte holding
//! their 8th bits, so the physical (packed) index of a documented logical
//! field is
//!
//! ```text
//! packed(l) = base + l + ceil((l + k) / 7)
//! ```
//!
//! with per-section `base`/`k` constants derived from patch diffing and
//! NRPN validation against the hardware. Translation always goes through
//! this formula; there is no general bitstream unpacker.

/// Ribbon-assign byte value meaning "no parameter assigned".
///
/// No effect type declares a slot index of 31, so the sentinel never
/// collides with a real assignment.
pub const RIBBON_ASSIGN_OFF: u8 = 31;

/// Highest effect type id (0 = off).
pub const MAX_EFFECT_TYPE: u8 = 17;

/// Width of one effect slot's parameter area (slot indices 0..=22).
pub const FX_PARAM_SLOTS: u8 = 23;

/// A packed region of the program image.
///
/// Each section packs independently; `Common` bytes are stored verbatim at
/// the head of the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Header bytes 0-17, direct mapping (includes the patch name).
    Common,
    Timbre1,
    Timbre2,
    VocoderBand,
    /// Effects, vocoder filter, ribbon and scale settings.
    Gap,
    Arp,
}

impl Section {
    fn base_k(&self) -> Option<(usize, usize)> {
        match self {
            Section::Common => None,
            Section::Timbre1 => Some((18, 3)),
            Section::Timbre2 => Some((128, 1)),
            Section::VocoderBand => Some((237, 6)),
            Section::Gap => Some((283, 4)),
            Section::Arp => Some((384, 1)),
        }
    }

    /// Physical byte index of `logical` within this section.
    pub fn packed(&self, logical: usize) -> usize {
        match self.base_k() {
            None => logical,
            Some((base, k)) => base + logical + (logical + k).div_ceil(7),
        }
    }
}

/// One of the two master effect slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FxSlot {
    One,
    Two,
}

impl FxSlot {
    pub fn number(&self) -> u8 {
        match self {
            FxSlot::One => 1,
            FxSlot::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(FxSlot::One),
            2 => Some(FxSlot::Two),
            _ => None,
        }
    }

    /// Gap-logical index of the first effect parameter byte.
    fn param_base(&self) -> usize {
        match self {
            FxSlot::One => 42,
            FxSlot::Two => 66,
        }
    }

    fn type_logical(&self) -> usize {
        match self {
            FxSlot::One => 38,
            FxSlot::Two => 62,
        }
    }

    fn ribbon_assign_logical(&self) -> usize {
        match self {
            FxSlot::One => 40,
            FxSlot::Two => 64,
        }
    }

    /// Packed offset of this slot's effect-type byte (327 / 355).
    pub fn type_offset(&self) -> usize {
        Section::Gap.packed(self.type_logical())
    }

    /// Packed offset of this slot's ribbon-assign byte (330 / 357).
    pub fn ribbon_assign_offset(&self) -> usize {
        Section::Gap.packed(self.ribbon_assign_logical())
    }

    /// Packed offset of this slot's ribbon-polarity byte (331 / 358).
    pub fn ribbon_polarity_offset(&self) -> usize {
        Section::Gap.packed(self.ribbon_assign_logical() + 1)
    }
}

/// Packed offset of an effect parameter, addressed by its position within
/// the effect's data area.
pub fn fx_param_packed(slot: FxSlot, slot_index: u8) -> usize {
    debug_assert!(slot_index < FX_PARAM_SLOTS, "slot_index out of range");
    Section::Gap.packed(slot.param_base() + slot_index as usize)
}
