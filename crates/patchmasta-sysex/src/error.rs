//! Error types for the SysEx layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a Korg program dump")]
    NotAKorgDump,

    #[error("Payload too short: offset {offset} beyond buffer of {len} bytes")]
    PayloadTooShort { offset: usize, len: usize },

    #[error("Invalid MIDI channel {0}: must be 1-16")]
    InvalidChannel(u8),

    #[error("Effect type {0} out of range 0-17")]
    InvalidEffectType(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
