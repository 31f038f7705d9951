//! AI sound-designer loop.
//!
//! A backend-agnostic conversational driver that exposes the synth
//! parameters and the audio analysis pipeline as callable tools, runs the
//! multi-turn tool-use cycle, and orchestrates iterative sound matching.
//! Backends are stateless `chat` functions; everything stateful lives in
//! the driver.

pub mod error;
pub use error::{Error, Result};

mod message;
pub use message::{AssistantTurn, Message, Role, ToolCall};

mod backend;
pub use backend::ChatBackend;

mod anthropic;
pub use anthropic::AnthropicBackend;

mod openai;
pub use openai::OpenAiBackend;

mod tools;
pub use tools::{tool_definitions, ToolRequest};

mod executor;
pub use executor::ToolExecutor;

mod driver;
pub use driver::{AiEvent, ToolLoop, SYSTEM_PROMPT};

mod controller;
pub use controller::AiController;
