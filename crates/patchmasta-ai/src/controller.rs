//! Threaded front door for the tool loop.
//!
//! The loop blocks on network and MIDI I/O, so it lives on a dedicated
//! worker thread driven by a command channel. The foreground sends
//! commands and drains the event receiver; `stop()` flips the shared flag
//! the loop checks between backend turns.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::backend::ChatBackend;
use crate::driver::{AiEvent, ToolLoop};
use crate::error::{Error, Result};
use crate::executor::ToolExecutor;

enum Command {
    UserMessage(String),
    MatchSound { wav_path: PathBuf, max_iterations: usize },
    ResetHistory,
    Shutdown,
}

/// Owns the worker thread running a [`ToolLoop`].
pub struct AiController {
    commands: Sender<Command>,
    events: Receiver<AiEvent>,
    stop: Arc<AtomicBool>,
}

impl AiController {
    pub fn new(backend: Box<dyn ChatBackend>, executor: ToolExecutor) -> Self {
        let (command_tx, command_rx) = unbounded::<Command>();
        let (event_tx, event_rx) = unbounded::<AiEvent>();

        let mut tool_loop = ToolLoop::new(backend, executor, event_tx);
        let stop = tool_loop.stop_flag();

        thread::Builder::new()
            .name("patchmasta-ai".to_string())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        Command::UserMessage(text) => {
                            // Errors were already surfaced as events.
                            let _ = tool_loop.run_user_turn(text);
                        }
                        Command::MatchSound {
                            wav_path,
                            max_iterations,
                        } => {
                            let _ = tool_loop.match_sound(&wav_path, max_iterations);
                        }
                        Command::ResetHistory => tool_loop.reset_history(),
                        Command::Shutdown => break,
                    }
                }
                debug!("AI worker shut down");
            })
            .expect("failed to spawn AI worker thread");

        Self {
            commands: command_tx,
            events: event_rx,
            stop,
        }
    }

    /// Events stream, consumed by the foreground loop.
    pub fn events(&self) -> &Receiver<AiEvent> {
        &self.events
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.commands
            .send(Command::UserMessage(text.into()))
            .map_err(|_| Error::WorkerGone)
    }

    /// Start the iterative sound-matching loop against a target WAV.
    pub fn match_sound(&self, wav_path: PathBuf, max_iterations: usize) -> Result<()> {
        self.commands
            .send(Command::MatchSound {
                wav_path,
                max_iterations,
            })
            .map_err(|_| Error::WorkerGone)
    }

    pub fn reset_history(&self) -> Result<()> {
        self.commands
            .send(Command::ResetHistory)
            .map_err(|_| Error::WorkerGone)
    }

    /// Ask the running loop to stop at the next turn boundary. Partial
    /// tool results already applied stay applied.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl Drop for AiController {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}
