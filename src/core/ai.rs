// llm integration - the opaque text completion service everything else calls

use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error as ThisError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_TOKENS: u32 = 2048;

#[derive(ThisError, Debug)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One system prompt plus one user message in, plain text out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Runs one generation call, treating expiry of `limit` as a failure.
pub async fn generate_within(
    generator: &dyn Generator,
    limit: Duration,
    system: &str,
    user: &str,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(limit, generator.generate(system, user)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(limit)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Claude,
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAI,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Claude => "claude-sonnet-4-20250514",
            Provider::OpenAI => "gpt-4-turbo",
        }
    }

    // env vars checked, in order, when no key is passed explicitly
    fn key_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Claude => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "CLAUDE_KEY"],
            Provider::OpenAI => &["OPENAI_API_KEY"],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Claude => f.write_str("claude"),
            Provider::OpenAI => f.write_str("openai"),
        }
    }
}

pub struct Ai {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
    model: String,
    timeout: Duration,
}

// anthropic messages api
#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

// openai chat completions
#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl Ai {
    pub fn new(provider: Provider, api_key: Option<String>) -> Result<Self, Error> {
        let api_key = match api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => provider
                .key_vars()
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
                .ok_or(Error::MissingApiKey(provider))?,
        };

        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            provider,
            api_key,
            model: provider.default_model().to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.client = build_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn claude(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let response: ClaudeResponse = self.decode(response).await?;
        response
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| GenerationError::Malformed("no text content in reply".to_string()))
    }

    async fn openai(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let request = OpenAIRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let response: OpenAIResponse = self.decode(response).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Malformed("no choices in reply".to_string()))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.transport(e))?;
        serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    fn transport(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(e)
        }
    }
}

#[async_trait]
impl Generator for Ai {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let text = match self.provider {
            Provider::Claude => self.claude(system, user).await?,
            Provider::OpenAI => self.openai(system, user).await?,
        };
        Ok(text.trim().to_string())
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
