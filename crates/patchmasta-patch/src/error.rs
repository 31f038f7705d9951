//! Error types for patch storage and editing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Patch file missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Corrupt program buffer: {0}")]
    CorruptBuffer(String),

    #[error("No program loaded")]
    NoProgram,

    #[error(transparent)]
    Sysex(#[from] patchmasta_sysex::Error),

    #[error(transparent)]
    Params(#[from] patchmasta_params::Error),

    #[error(transparent)]
    Device(#[from] patchmasta_device::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
