//! Top-level error aggregating the subsystem errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Sysex(#[from] patchmasta_sysex::Error),

    #[error(transparent)]
    Params(#[from] patchmasta_params::Error),

    #[error(transparent)]
    Audio(#[from] patchmasta_audio::Error),

    #[error(transparent)]
    Device(#[from] patchmasta_device::Error),

    #[error(transparent)]
    Patch(#[from] patchmasta_patch::Error),

    #[error(transparent)]
    Ai(#[from] patchmasta_ai::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
