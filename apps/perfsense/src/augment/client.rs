//! OpenAI-compatible chat-completions client.

use super::{build_prompt, parse_reply, InsightProvider, RemoteInsight, ReplyFormat};
use crate::error::RemoteError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub format: ReplyFormat,
    /// `None` waits for the service indefinitely.
    pub timeout: Option<Duration>,
}

pub struct ChatInsightProvider {
    client: Client,
    settings: ChatSettings,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatInsightProvider {
    pub fn new(settings: ChatSettings) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }

    fn request(&self, source: &str) -> Result<String, RemoteError> {
        let prompt = build_prompt(source, self.settings.format);
        let body = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };
        let url = self.completions_url();
        debug!(url = %url, model = %self.settings.model, "requesting remote insight");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                service: "model",
                status: status.as_u16(),
                body: text,
            });
        }
        extract_content(&text)
    }
}

impl InsightProvider for ChatInsightProvider {
    fn insights(&self, source: &str) -> RemoteInsight {
        match self.request(source) {
            Ok(reply) => parse_reply(&reply, self.settings.format),
            Err(e) => {
                warn!(error = %e, "remote insight unavailable; using local analysis only");
                RemoteInsight::default()
            }
        }
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
fn extract_content(body: &str) -> Result<String, RemoteError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::MalformedReply(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| RemoteError::MalformedReply("reply has no message content".into()))
}
