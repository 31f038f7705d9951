//! Anthropic Messages API backend.

use serde_json::{json, Value};
use tracing::debug;

use crate::backend::ChatBackend;
use crate::error::{Error, Result};
use crate::message::{AssistantTurn, Message, Role, ToolCall};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 4096;

/// Messages-API backend: system prompt top-level, tools passed natively,
/// `tool_use` content blocks parsed from the response.
pub struct AnthropicBackend {
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body(&self, history: &[Message], system: &str, tools: &[Value]) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                        _ => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
        }
        body
    }

    fn parse_response(response: &Value) -> AssistantTurn {
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in response["content"].as_array().into_iter().flatten() {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(t) = block["text"].as_str() {
                        text_parts.push(t.to_string());
                    }
                }
                Some("tool_use") => {
                    tool_calls.push(ToolCall {
                        id: block["id"].as_str().unwrap_or_default().to_string(),
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                        input: block["input"].clone(),
                    });
                }
                _ => {}
            }
        }

        AssistantTurn {
            text: text_parts.join("\n"),
            tool_calls,
        }
    }
}

impl ChatBackend for AnthropicBackend {
    fn chat(&self, history: &[Message], system: &str, tools: &[Value]) -> Result<AssistantTurn> {
        let body = self.request_body(history, system, tools);
        debug!("anthropic request: {} messages", history.len());

        let response: Value = ureq::post(API_URL)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", API_VERSION)
            .set("content-type", "application/json")
            .send_json(body)
            .map_err(|e| Error::Backend(e.to_string()))?
            .into_json()?;

        Ok(Self::parse_response(&response))
    }
}
