//! Chat-service client
//!
//! Talks to an OpenAI-compatible chat endpoint (LM Studio and friends).
//! Reasoning-capable models think for minutes before the first byte, so
//! requests carry a long timeout, and responses are scrubbed of
//! chain-of-thought wrappers before anyone tries to parse them.

use std::sync::OnceLock;
use std::time::Duration;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::arbiter::GpuOccupant;
use crate::error::{MaestroError, Result};

/// Request timeout. Reasoning models emit nothing while they think.
const CHAT_TIMEOUT: Duration = Duration::from_secs(600);

/// Model id used when the concrete id can't be resolved.
const GENERIC_MODEL_ID: &str = "local-model";

/// Seam for the language-model exchange: one synchronous request/response
/// carrying a system prompt, user content and a temperature.
pub trait ChatService {
    /// Send a chat request and return the scrubbed plain-text response.
    fn chat(&self, system_prompt: &str, user_content: &str, temperature: f32) -> Result<String>;

    /// Verify the service is reachable. Returns the active model id.
    fn check_connection(&self) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
    max_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Blocking HTTP client for the chat service.
pub struct ChatClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch the id of the currently loaded model, falling back to the
    /// generic id when the endpoint is unavailable.
    pub fn active_model(&self) -> String {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(3))
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| r.json::<ModelsResponse>().ok());

        match response {
            Some(models) if !models.data.is_empty() => models.data[0].id.clone(),
            _ => GENERIC_MODEL_ID.to_string(),
        }
    }

    /// Best-effort request to release the model's GPU allocation.
    ///
    /// Not every host exposes an unload endpoint; absence is a warning
    /// condition, not an error; the arbiter's cleanup pass follows anyway.
    pub fn unload_model(&self) -> bool {
        let url = format!("{}/models/unload", self.base_url);
        match self
            .http
            .post(&url)
            .timeout(Duration::from_secs(10))
            .send()
        {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                debug!("Model unload endpoint answered HTTP {}", r.status());
                false
            }
            Err(e) => {
                debug!("Model unload unavailable: {e}");
                false
            }
        }
    }

    fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        self.http
            .post(&url)
            .timeout(CHAT_TIMEOUT)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    MaestroError::ChatTimeout {
                        timeout_secs: CHAT_TIMEOUT.as_secs(),
                    }
                } else {
                    MaestroError::ChatUnreachable {
                        reason: e.to_string(),
                    }
                }
            })
    }
}

impl ChatService for ChatClient {
    fn chat(&self, system_prompt: &str, user_content: &str, temperature: f32) -> Result<String> {
        let model_id = self.active_model();
        let mut request = ChatRequest {
            model: &model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature,
            stream: false,
            max_tokens: -1,
        };

        let mut response = self.post_chat(&request)?;

        // Some hosts reject a stale concrete id; retry once generically.
        if response.status().as_u16() == 400 {
            warn!("Chat rejected model id '{model_id}', retrying with '{GENERIC_MODEL_ID}'");
            request.model = GENERIC_MODEL_ID;
            response = self.post_chat(&request)?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MaestroError::ChatStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| MaestroError::ChatUnreachable {
                reason: format!("unreadable chat response: {e}"),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(MaestroError::EmptyChatResponse)?;

        Ok(scrub_reasoning(content.trim()))
    }

    fn check_connection(&self) -> Result<String> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(3))
            .send()
            .map_err(|e| MaestroError::ChatUnreachable {
                reason: if e.is_connect() {
                    "Connection refused (is the chat server on?)".to_string()
                } else {
                    e.to_string()
                },
            })?;

        if !response.status().is_success() {
            return Err(MaestroError::ChatStatus {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }
        Ok(self.active_model())
    }
}

impl GpuOccupant for ChatClient {
    fn occupant_name(&self) -> &str {
        "language-model"
    }

    fn offload(&self) -> Result<bool> {
        Ok(self.unload_model())
    }
}

/// Strip chain-of-thought wrappers, boxed-answer markers and code fences
/// from a model response, leaving only the usable output.
pub fn scrub_reasoning(content: &str) -> String {
    static THINK: OnceLock<Regex> = OnceLock::new();
    let think = THINK
        .get_or_init(|| Regex::new(r"(?si)<think>.*?</think>|<thought>.*?</thought>").unwrap());

    let original_len = content.len();
    let mut text = think.replace_all(content, "").into_owned();

    // Boxed output: keep only what's inside the markers.
    if let Some(idx) = text.find("<|begin_of_box|>") {
        text = text[idx + "<|begin_of_box|>".len()..].to_string();
    }
    if let Some(idx) = text.find("<|end_of_box|>") {
        text.truncate(idx);
    }

    text = text
        .replace("```json", "")
        .replace("```lyrics", "")
        .replace("```", "")
        .trim()
        .to_string();

    if text.len() < original_len {
        debug!(
            "Scrubbed {} chars of reasoning/formatting tokens",
            original_len - text.len()
        );
    }

    text
}
