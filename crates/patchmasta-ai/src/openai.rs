//! OpenAI-compatible Chat Completions backend (Groq and friends).

use serde_json::{json, Value};
use tracing::debug;

use crate::backend::ChatBackend;
use crate::error::{Error, Result};
use crate::message::{AssistantTurn, Message, Role, ToolCall};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const MAX_TOKENS: u32 = 4096;

/// Chat Completions backend: system prompt as leading message, tools
/// wrapped in `{"type": "function", ...}`, arguments arriving as JSON
/// strings.
pub struct OpenAiBackend {
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn request_body(&self, history: &[Message], system: &str, tools: &[Value]) -> Value {
        let mut messages = vec![json!({"role": "system", "content": system})];
        messages.extend(history.iter().filter(|m| m.role != Role::System).map(|m| {
            json!({
                "role": match m.role {
                    Role::User => "user",
                    _ => "assistant",
                },
                "content": m.content,
            })
        }));

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": messages,
        });
        if !tools.is_empty() {
            let wrapped: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t["name"],
                            "description": t["description"],
                            "parameters": t["input_schema"],
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(wrapped);
        }
        body
    }

    fn parse_response(response: &Value) -> AssistantTurn {
        let message = &response["choices"][0]["message"];
        let mut tool_calls = Vec::new();

        for tc in message["tool_calls"].as_array().into_iter().flatten() {
            let arguments = tc["function"]["arguments"].as_str().unwrap_or("{}");
            let input =
                serde_json::from_str(arguments).unwrap_or_else(|_| json!({ "raw": arguments }));
            tool_calls.push(ToolCall {
                id: tc["id"].as_str().unwrap_or_default().to_string(),
                name: tc["function"]["name"].as_str().unwrap_or_default().to_string(),
                input,
            });
        }

        AssistantTurn {
            text: message["content"].as_str().unwrap_or_default().to_string(),
            tool_calls,
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn chat(&self, history: &[Message], system: &str, tools: &[Value]) -> Result<AssistantTurn> {
        let body = self.request_body(history, system, tools);
        debug!("chat-completions request: {} messages", history.len());

        let response: Value = ureq::post(&self.url)
            .set("authorization", &format!("Bearer {}", self.api_key))
            .set("content-type", "application/json")
            .send_json(body)
            .map_err(|e| Error::Backend(e.to_string()))?
            .into_json()?;

        Ok(Self::parse_response(&response))
    }
}
