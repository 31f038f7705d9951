//! Error types for the device session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not connected to a MIDI device")]
    NotConnected,

    #[error("A program pull is already in progress")]
    PullBusy,

    #[error("MIDI device error: {0}")]
    DeviceIo(String),

    #[error("MIDI port error: {0}")]
    Port(String),
}

impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::DeviceIo(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::Port(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::Port(e.to_string())
    }
}

impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::DeviceIo(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
