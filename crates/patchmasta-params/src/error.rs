//! Error types for the parameter registries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("No MIDI address for parameter '{0}'")]
    NoMidiAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
