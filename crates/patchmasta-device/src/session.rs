//! The device session: port lifecycle, outbound sends, and dump pulls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput};
use parking_lot::Mutex;
use tracing::{debug, warn};

use patchmasta_sysex::KorgCodec;

use crate::error::{Error, Result};
use crate::transport::{find_input_port, MidiTransport, MidirTransport};

/// Default per-slot wait for a dump response.
pub const PULL_DEADLINE_MS: u64 = 2000;

/// Settle time after a program change before requesting the dump.
const PROGRAM_SWITCH_MS: u64 = 50;

/// Progress report from a background bulk pull.
#[derive(Debug, Clone)]
pub struct PullProgress {
    pub slot: u8,
    /// `None` when the slot timed out.
    pub payload: Option<Vec<u8>>,
    pub done: usize,
    pub total: usize,
}

struct SessionInner {
    transport: Mutex<Option<Box<dyn MidiTransport>>>,
    /// Held only to keep the midir callback alive.
    input: Mutex<Option<MidiInputConnection<()>>>,
    /// Single-holder collector for the next expected dump payload.
    pending: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
    port_name: Mutex<Option<String>>,
    codec: KorgCodec,
    cancel: AtomicBool,
}

/// Cloneable handle to one device connection.
///
/// The device never answers requests directly; it emits unsolicited SysEx
/// callbacks. [`DeviceSession::pull_slot`] correlates them by installing a
/// collector, transmitting the request, and waiting on the collector with
/// a deadline. The collector cell is single-holder: concurrent pulls fail
/// with [`Error::PullBusy`] rather than interleaving payloads.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

impl DeviceSession {
    pub fn new(codec: KorgCodec) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport: Mutex::new(None),
                input: Mutex::new(None),
                pending: Arc::new(Mutex::new(None)),
                port_name: Mutex::new(None),
                codec,
                cancel: AtomicBool::new(false),
            }),
        }
    }

    pub fn codec(&self) -> &KorgCodec {
        &self.inner.codec
    }

    pub fn connected(&self) -> bool {
        self.inner.transport.lock().is_some()
    }

    pub fn port_name(&self) -> Option<String> {
        self.inner.port_name.lock().clone()
    }

    /// Open the output port at `index` and the input port matched by name.
    /// Replaces any existing connection.
    pub fn connect(&self, index: usize, name: &str) -> Result<()> {
        self.disconnect();

        let midi_out = MidiOutput::new("patchmasta")?;
        let ports = midi_out.ports();
        let port = ports
            .get(index)
            .ok_or_else(|| Error::Port(format!("output port {index} not found")))?;
        let out_conn = midi_out.connect(port, "patchmasta-out")?;
        debug!("OUT: {name} (index {index})");

        let mut midi_in = MidiInput::new("patchmasta")?;
        midi_in.ignore(Ignore::None);
        let in_port = find_input_port(&midi_in)
            .ok_or_else(|| Error::Port("no matching MIDI input port".to_string()))?;
        let in_name = midi_in.port_name(&in_port).unwrap_or_default();

        let pending = Arc::clone(&self.inner.pending);
        let codec = self.inner.codec;
        let in_conn = midi_in.connect(
            &in_port,
            "patchmasta-in",
            move |_timestamp, message, _| {
                route_sysex(&codec, &pending, message);
            },
            (),
        )?;
        debug!("IN:  {in_name}");

        *self.inner.transport.lock() = Some(Box::new(MidirTransport { conn: out_conn }));
        *self.inner.input.lock() = Some(in_conn);
        *self.inner.port_name.lock() = Some(name.to_string());
        Ok(())
    }

    /// Install a prepared transport instead of opening hardware ports.
    /// Used by tests and by loopback tooling; the caller feeds inbound
    /// messages through [`DeviceSession::handle_sysex`].
    pub fn connect_transport(&self, transport: Box<dyn MidiTransport>, name: &str) {
        self.disconnect();
        *self.inner.transport.lock() = Some(transport);
        *self.inner.port_name.lock() = Some(name.to_string());
    }

    /// Idempotent. An in-flight pull then resolves through its timeout.
    pub fn disconnect(&self) {
        self.inner.transport.lock().take();
        self.inner.input.lock().take();
        self.inner.port_name.lock().take();
    }

    /// Inbound SysEx entry point. midir calls this from its reader thread;
    /// tests call it directly.
    pub fn handle_sysex(&self, message: &[u8]) {
        route_sysex(&self.inner.codec, &self.inner.pending, message);
    }

    /// Send raw bytes. Fails with [`Error::NotConnected`] when no port is
    /// open; I/O failures surface as [`Error::DeviceIo`] and leave the
    /// session open.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.inner.transport.lock();
        let transport = guard.as_mut().ok_or(Error::NotConnected)?;
        transport.send(bytes)
    }

    pub fn send_cc(&self, channel: u8, cc: u8, value: u8) -> Result<()> {
        let ch = channel.wrapping_sub(1) & 0x0F;
        self.send(&[0xB0 | ch, cc & 0x7F, value & 0x7F])
    }

    /// NRPN address + data entry, three CC messages in order.
    pub fn send_nrpn(&self, channel: u8, msb: u8, lsb: u8, value: u8) -> Result<()> {
        let ch = channel.wrapping_sub(1) & 0x0F;
        let mut guard = self.inner.transport.lock();
        let transport = guard.as_mut().ok_or(Error::NotConnected)?;
        transport.send(&[0xB0 | ch, 99, msb & 0x7F])?;
        transport.send(&[0xB0 | ch, 98, lsb & 0x7F])?;
        transport.send(&[0xB0 | ch, 6, value & 0x7F])
    }

    pub fn send_note_on(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        let ch = channel.wrapping_sub(1) & 0x0F;
        self.send(&[0x90 | ch, note & 0x7F, velocity & 0x7F])
    }

    pub fn send_note_off(&self, channel: u8, note: u8) -> Result<()> {
        let ch = channel.wrapping_sub(1) & 0x0F;
        self.send(&[0x80 | ch, note & 0x7F, 0])
    }

    pub fn send_program_change(&self, channel: u8, program: u8) -> Result<()> {
        let ch = channel.wrapping_sub(1) & 0x0F;
        self.send(&[0xC0 | ch, program & 0x7F])
    }

    /// Pull one program slot, waiting up to `deadline` for the dump.
    ///
    /// Returns `Ok(None)` on timeout - the device not answering is an
    /// expected outcome, not a failure. A concurrent pull on the same
    /// session fails with [`Error::PullBusy`].
    pub fn pull_slot(&self, slot: u8, deadline: Duration) -> Result<Option<Vec<u8>>> {
        if !self.connected() {
            return Err(Error::NotConnected);
        }

        let rx = self.install_collector()?;
        let result = self.request_and_wait(slot, deadline, &rx);
        self.inner.pending.lock().take();
        result
    }

    fn install_collector(&self) -> Result<Receiver<Vec<u8>>> {
        let mut pending = self.inner.pending.lock();
        if pending.is_some() {
            return Err(Error::PullBusy);
        }
        let (tx, rx) = bounded(1);
        *pending = Some(tx);
        Ok(rx)
    }

    fn request_and_wait(
        &self,
        slot: u8,
        deadline: Duration,
        rx: &Receiver<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        // Select the slot, give the device time to switch, then ask for a
        // dump of the now-current program.
        self.send(&self.inner.codec.program_change(slot))?;
        thread::sleep(Duration::from_millis(PROGRAM_SWITCH_MS));
        self.send(&self.inner.codec.program_dump_request(slot))?;

        match rx.recv_timeout(deadline) {
            Ok(payload) => Ok(Some(payload)),
            Err(RecvTimeoutError::Timeout) => {
                debug!("slot {slot}: dump timed out");
                Ok(None)
            }
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    /// Pull a range of slots sequentially. Individual timeouts yield
    /// `None` entries and never abort the sweep; send failures are logged
    /// and also yield `None` so a mid-sweep unplug degrades gracefully.
    pub fn pull_range(
        &self,
        slots: impl IntoIterator<Item = u8> + 'static,
        deadline_each: Duration,
    ) -> impl Iterator<Item = (u8, Option<Vec<u8>>)> + '_ {
        slots.into_iter().map(move |slot| {
            if self.inner.cancel.load(Ordering::Acquire) {
                return (slot, None);
            }
            match self.pull_slot(slot, deadline_each) {
                Ok(payload) => (slot, payload),
                Err(e) => {
                    warn!("slot {slot}: pull failed: {e}");
                    (slot, None)
                }
            }
        })
    }

    /// Request cancellation of an in-flight background pull.
    pub fn cancel_pull(&self) {
        self.inner.cancel.store(true, Ordering::Release);
    }

    /// Run `pull_range` on a named worker thread, streaming progress back
    /// over a channel. The receiver sees one message per slot.
    pub fn pull_range_background(
        &self,
        slots: Vec<u8>,
        deadline_each: Duration,
    ) -> Receiver<PullProgress> {
        let (tx, rx) = bounded(slots.len().max(1));
        let session = self.clone();
        session.inner.cancel.store(false, Ordering::Release);
        let total = slots.len();

        thread::Builder::new()
            .name("patchmasta-pull".to_string())
            .spawn(move || {
                for (done, (slot, payload)) in
                    session.pull_range(slots, deadline_each).enumerate()
                {
                    let report = PullProgress {
                        slot,
                        payload,
                        done: done + 1,
                        total,
                    };
                    if tx.send(report).is_err() {
                        break; // receiver dropped, stop pulling
                    }
                }
            })
            .expect("failed to spawn pull thread");
        rx
    }
}

/// Route an inbound message into the pending collector if it parses as a
/// program dump. Non-dump traffic is ignored.
fn route_sysex(codec: &KorgCodec, pending: &Mutex<Option<Sender<Vec<u8>>>>, message: &[u8]) {
    let payload = match codec.parse_program_dump(message) {
        Ok(p) => p.to_vec(),
        Err(_) => return,
    };
    if let Some(tx) = pending.lock().as_ref() {
        if tx.try_send(payload).is_err() {
            debug!("dropping dump: collector already satisfied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Loopback transport: records outbound bytes and answers dump
    /// requests with a canned program dump via `handle_sysex`.
    struct MockPort {
        session: DeviceSession,
        sent: Arc<StdMutex<Vec<Vec<u8>>>>,
        respond: bool,
    }

    impl MidiTransport for MockPort {
        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            self.sent.lock().unwrap().push(bytes.to_vec());
            if self.respond && bytes.len() > 5 && bytes[4] == 0x10 {
                let mut payload = b"BrassLead   ".to_vec();
                payload.extend_from_slice(&[0u8; 388]);
                let reply = self.session.codec().program_write(&payload);
                self.session.handle_sysex(&reply);
            }
            Ok(())
        }
    }

    fn mock_session(respond: bool) -> (DeviceSession, Arc<StdMutex<Vec<Vec<u8>>>>) {
        let session = DeviceSession::new(KorgCodec::default());
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let port = MockPort {
            session: session.clone(),
            sent: Arc::clone(&sent),
            respond,
        };
        session.connect_transport(Box::new(port), "Mock RK-100S 2 SOUND");
        (session, sent)
    }

    #[test]
    fn test_send_requires_connection() {
        let session = DeviceSession::new(KorgCodec::default());
        assert!(matches!(session.send(&[0x90, 60, 100]), Err(Error::NotConnected)));
        assert!(!session.connected());
    }

    #[test]
    fn test_send_wrappers_byte_exactness() {
        let (session, sent) = mock_session(false);

        session.send_nrpn(1, 0x05, 0x00, 63).unwrap();
        session.send_cc(1, 7, 100).unwrap();
        session.send_cc(3, 7, 100).unwrap();
        session.send_note_on(1, 60, 100).unwrap();
        session.send_note_off(1, 60).unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0], vec![0xB0, 99, 5]);
        assert_eq!(sent[1], vec![0xB0, 98, 0]);
        assert_eq!(sent[2], vec![0xB0, 6, 63]);
        assert_eq!(sent[3], vec![0xB0, 7, 100]);
        assert_eq!(sent[4], vec![0xB2, 7, 100]);
        assert_eq!(sent[5], vec![0x90, 60, 100]);
        assert_eq!(sent[6], vec![0x80, 60, 0]);
    }

    #[test]
    fn test_data_bytes_masked() {
        let (session, sent) = mock_session(false);
        session.send_cc(1, 0xFF, 0xFF).unwrap();
        assert_eq!(sent.lock().unwrap()[0], vec![0xB0, 0x7F, 0x7F]);
    }

    #[test]
    fn test_pull_slot_receives_canned_dump() {
        let (session, sent) = mock_session(true);

        let payload = session
            .pull_slot(3, Duration::from_millis(PULL_DEADLINE_MS))
            .unwrap()
            .expect("mock port always answers");
        assert_eq!(&payload[..12], b"BrassLead   ");

        // Program change first, then the dump request for the same slot.
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0], vec![0xC0, 3]);
        assert_eq!(sent[1][4], 0x10);
        assert_eq!(sent[1][5], 3);
    }

    #[test]
    fn test_pull_slot_timeout_yields_none() {
        let (session, _) = mock_session(false);
        let start = std::time::Instant::now();
        let result = session.pull_slot(0, Duration::from_millis(100)).unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_millis(1000));
        // The collector was uninstalled; a second pull is allowed.
        assert!(session.pull_slot(0, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn test_concurrent_pull_is_rejected() {
        let (session, _) = mock_session(false);

        let background = session.clone();
        let handle = thread::spawn(move || {
            background.pull_slot(0, Duration::from_millis(500)).unwrap()
        });

        // Let the first pull install its collector (it sleeps 50 ms after
        // the program change before waiting).
        thread::sleep(Duration::from_millis(150));
        let second = session.pull_slot(1, Duration::from_millis(100));
        assert!(matches!(second, Err(Error::PullBusy)));

        assert!(handle.join().unwrap().is_none());
    }

    #[test]
    fn test_pull_range_never_aborts() {
        let (session, _) = mock_session(false);
        let results: Vec<_> = session
            .pull_range(0..3, Duration::from_millis(30))
            .collect();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(_, p)| p.is_none()));
    }

    #[test]
    fn test_pull_range_background_reports_progress() {
        let (session, _) = mock_session(true);
        let rx = session.pull_range_background(vec![0, 1], Duration::from_millis(500));

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first.slot, 0);
        assert_eq!(first.done, 1);
        assert_eq!(first.total, 2);
        assert!(first.payload.is_some());

        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(second.slot, 1);
        assert_eq!(second.done, 2);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (session, _) = mock_session(false);
        assert!(session.connected());
        session.disconnect();
        session.disconnect();
        assert!(!session.connected());
        assert!(session.port_name().is_none());
    }

    #[test]
    fn test_unparseable_sysex_is_ignored() {
        let (session, _) = mock_session(false);
        // No pending collector, garbage input: must not panic.
        session.handle_sysex(&[0xF0, 0x41, 0x30, 0x57, 0x40, 0xF7]);
        session.handle_sysex(&[]);
    }
}
