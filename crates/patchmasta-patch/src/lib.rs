//! Patch storage and the program-buffer editor.
//!
//! A patch on disk is a `<slug>.json` metadata sidecar plus a `<slug>.syx`
//! file holding the raw program dump. The [`ProgramEditor`] mediates all
//! buffer reads and writes, keeping the effect-slot layout and ribbon
//! assignments consistent with the currently selected effect types and
//! mirroring edits to the connected device.

pub mod error;
pub use error::{Error, Result};

mod patch;
pub use patch::Patch;

mod bank;
pub use bank::Bank;

mod library;
pub use library::Library;

mod editor;
pub use editor::ProgramEditor;
