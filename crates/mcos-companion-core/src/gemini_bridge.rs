//! Gemini bridge: forwards one chat message to the Generative Language API.
//!
//! Stateless: every call sends the persona instruction plus the single user message.
//! No history, no retries. The HTTP client carries a bounded timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Placeholder shipped in `.env.example`; treated the same as a missing key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

const PERSONA_PROMPT: &str = "You are the MinecraftOS assistant, built into a Minecraft-themed desktop. \
Answer briefly and in a friendly tone. Help with the desktop, the store, launchers, mods and Minecraft itself. \
Do not use markdown unless the user asks for it.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Gemini request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gemini {0}: {1}")]
    Api(u16, String),
    #[error("Gemini response parse: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Gemini returned no text")]
    EmptyReply,
}

/// External text-generation collaborator behind `/chat`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, message: &str) -> Result<String, ChatError>;
}

/// `None` for an empty or placeholder key.
pub fn usable_api_key(raw: Option<&str>) -> Option<String> {
    let key = raw?.trim();
    if key.is_empty() || key == API_KEY_PLACEHOLDER {
        None
    } else {
        Some(key.to_string())
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn build_request(message: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part { text: PERSONA_PROMPT }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: message }],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_reply(body: &str) -> Result<String, ChatError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ChatError::EmptyReply);
    }
    Ok(text)
}

pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            client,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, message: &str) -> Result<String, ChatError> {
        tracing::info!("Gemini request ({} chars) to model {}", message.len(), self.model);

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(message))
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(ChatError::Api(status.as_u16(), text));
        }
        parse_reply(&text)
    }
}
