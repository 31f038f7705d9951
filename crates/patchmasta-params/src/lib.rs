//! Parameter metadata for the RK-100S 2.
//!
//! Two registries: the flat catalog of user-addressable parameters with
//! their MIDI encodings, and the 18 master-effect type definitions whose
//! parameter layout depends on the selected type.

pub mod error;
pub use error::{Error, Result};

mod param;
pub use param::{MidiAddress, ParamDef};

mod registry;
pub use registry::ParamRegistry;

mod effects;
pub use effects::{EffectParam, EffectRegistry, EffectTypeDef};
