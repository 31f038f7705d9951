//! The chat backend seam.

use serde_json::Value;

use crate::error::Result;
use crate::message::{AssistantTurn, Message};

/// A stateless conversational backend.
///
/// Implementations translate the shared history/tool shapes to their wire
/// protocol and coalesce the response into an [`AssistantTurn`]. Calls
/// block on network I/O, so the driver only invokes them from worker
/// threads.
pub trait ChatBackend: Send {
    fn chat(&self, history: &[Message], system: &str, tools: &[Value]) -> Result<AssistantTurn>;
}
