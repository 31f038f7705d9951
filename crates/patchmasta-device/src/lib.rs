//! MIDI device session for the RK-100S 2.
//!
//! Owns the port pair, routes unsolicited SysEx callbacks into a pending
//! response cell, and layers a synchronous request/response facade with a
//! bounded wait on top. Bulk pulls across program slots run on a worker
//! thread reporting progress over a channel.

pub mod error;
pub use error::{Error, Result};

mod transport;
pub use transport::{find_device, list_ports, MidiTransport, DEVICE_NAME_FRAGMENT};

mod session;
pub use session::{DeviceSession, PullProgress, PULL_DEADLINE_MS};
