//! The multi-turn tool-use loop and the sound-matching orchestrator.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::backend::ChatBackend;
use crate::error::Result;
use crate::executor::ToolExecutor;
use crate::message::Message;
use crate::tools::{tool_definitions, ToolRequest};

pub const SYSTEM_PROMPT: &str = "\
You are an AI sound designer for the Korg RK-100S 2 keytar synthesizer.
You can control synth parameters in real-time via MIDI. When the user describes a sound they want,
translate their description into parameter changes.

Available parameter categories:
- Arpeggiator: on/off, latch, type, gate, select
- Voice: mode (single/layer/split/multi)
- Virtual Patches: modulation routings (source -> destination)
- Vocoder: on/off, filter settings
- Master Effects: two slots with 17 selectable algorithms and ribbon assignment

When matching a sound from a WAV file:
1. First analyze the WAV to understand its spectral characteristics
2. Set initial parameters based on your analysis
3. Trigger a note, record the output, and compare
4. Iteratively adjust parameters to minimize the spectral difference

Think step-by-step about which parameters affect which sonic qualities.";

/// Default cap on backend turns for a free-form conversation.
const DEFAULT_MAX_TURNS: usize = 50;

/// Events emitted to the foreground while the loop runs.
#[derive(Debug, Clone)]
pub enum AiEvent {
    AssistantText(String),
    ToolExecuted { name: String, result: String },
    Error(String),
    Finished,
}

/// Iterative tool-use loop over an abstract chat backend.
///
/// One instance owns the conversation history. The loop itself is plain
/// and synchronous - callers run it on a worker thread (see
/// [`crate::AiController`]) and observe progress through the event
/// channel. A shared stop flag is honored between backend turns; an
/// in-flight backend call is never interrupted, its result is discarded.
pub struct ToolLoop {
    backend: Box<dyn ChatBackend>,
    executor: ToolExecutor,
    history: Vec<Message>,
    events: Sender<AiEvent>,
    stop: Arc<AtomicBool>,
    max_turns: usize,
}

impl ToolLoop {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        executor: ToolExecutor,
        events: Sender<AiEvent>,
    ) -> Self {
        Self {
            backend,
            executor,
            history: Vec::new(),
            events,
            stop: Arc::new(AtomicBool::new(false)),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Flag shared with the foreground; setting it ends the loop at the
    /// next turn boundary.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Explicit user action; never done implicitly.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Append a user message and run the tool-use cycle until the model
    /// stops calling tools, the turn cap is hit, or the user stops it.
    pub fn run_user_turn(&mut self, user_text: impl Into<String>) -> Result<()> {
        self.history.push(Message::user(user_text));
        self.stop.store(false, Ordering::Release);
        let result = self.run_cycle(self.max_turns);
        if let Err(e) = &result {
            warn!("tool loop failed: {e}");
            let _ = self.events.send(AiEvent::Error(e.to_string()));
        }
        result
    }

    /// Seed the conversation with a local analysis of `wav_path` and drive
    /// the match loop for at most `max_iterations` backend turns.
    ///
    /// Convergence is the model's responsibility; the cap is the only
    /// termination the orchestrator enforces beyond the usual ones.
    pub fn match_sound(&mut self, wav_path: &Path, max_iterations: usize) -> Result<()> {
        // Analyzed locally, not through the model - the seed must not cost
        // a tool round-trip.
        let analysis = self
            .executor
            .execute(ToolRequest::AnalyzeAudio {
                wav_path: wav_path.to_path_buf(),
            });
        let seed = format!(
            "I want to recreate the sound in {}. Spectral analysis of the target:\n{analysis}\n\
             Make an initial best-guess parameter setup for this sound, then iterate: \
             trigger a note, record it, compare against the target, and adjust parameters \
             to reduce the spectral distance. Stop when you cannot improve further.",
            wav_path.display()
        );

        self.history.push(Message::user(seed));
        self.stop.store(false, Ordering::Release);
        let result = self.run_cycle(max_iterations);
        if let Err(e) = &result {
            let _ = self.events.send(AiEvent::Error(e.to_string()));
        }
        result
    }

    /// The iterative state machine; counts whole backend turns.
    fn run_cycle(&mut self, max_turns: usize) -> Result<()> {
        for turn_index in 0..max_turns {
            if self.stopped("before turn") {
                return Ok(());
            }

            let turn = self
                .backend
                .chat(&self.history, SYSTEM_PROMPT, &tool_definitions())?;

            // The call may have raced a stop request; honor it and drop
            // the result without recording or executing anything.
            if self.stopped("after backend call") {
                return Ok(());
            }

            if !turn.text.is_empty() {
                let _ = self.events.send(AiEvent::AssistantText(turn.text.clone()));
            }

            if turn.tool_calls.is_empty() {
                self.history.push(turn.into_message());
                debug!("loop settled after {} turn(s)", turn_index + 1);
                let _ = self.events.send(AiEvent::Finished);
                return Ok(());
            }

            let calls = turn.tool_calls.clone();
            self.history.push(turn.into_message());
            for call in calls {
                let result = match ToolRequest::parse(&call.name, &call.input) {
                    Ok(request) => self.executor.execute(request),
                    Err(text) => text,
                };
                let _ = self.events.send(AiEvent::ToolExecuted {
                    name: call.name.clone(),
                    result: result.clone(),
                });
                self.history
                    .push(Message::user(format!("Tool result for {}: {result}", call.name)));
            }
        }

        debug!("turn cap reached");
        let _ = self.events.send(AiEvent::Finished);
        Ok(())
    }

    fn stopped(&self, at: &str) -> bool {
        if self.stop.load(Ordering::Acquire) {
            debug!("stop requested {at}");
            let _ = self
                .events
                .send(AiEvent::AssistantText("Stopped by user.".to_string()));
            let _ = self.events.send(AiEvent::Finished);
            true
        } else {
            false
        }
    }
}
