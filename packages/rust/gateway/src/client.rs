//! reqwest-backed chat completions client.

use std::time::Duration;

use draftdeck_shared::{DraftDeckError, GatewayConfig, Result, gateway_api_key};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{CompletionRequest, TextGenerator};

/// User-Agent string for gateway requests.
const USER_AGENT: &str = concat!("DraftDeck/", env!("CARGO_PKG_VERSION"));

/// Longest upstream error body echoed back into an error message.
const MAX_ERROR_BODY: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection settings for [`GatewayClient`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// API root, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: Url,
    /// Bearer token.
    pub api_key: String,
    /// Model id sent with every request.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl GatewayOptions {
    /// Resolve options from config, reading the key from its env var.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url()?,
            api_key: gateway_api_key(config)?,
            model: config.default_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

/// Chat completions client for an OpenAI-compatible gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GatewayClient {
    pub fn new(opts: GatewayOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| DraftDeckError::Network(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/chat/completions",
            opts.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            http,
            endpoint,
            api_key: opts.api_key,
            model: opts.model,
        })
    }

    /// Model id this client sends.
    pub fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn chat(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DraftDeckError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "gateway returned an error");
            return Err(status_error(status, &text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            DraftDeckError::Gateway(format!("malformed AI response: {e}"))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "completion finished"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| DraftDeckError::Gateway("malformed AI response: no content".into()))
    }
}

impl TextGenerator for GatewayClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.chat(request).await
    }
}

/// Turn a non-2xx gateway status into an error message callers can show.
fn status_error(status: StatusCode, body: &str) -> DraftDeckError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            DraftDeckError::Gateway("rate limit exceeded, please try again later".into())
        }
        StatusCode::PAYMENT_REQUIRED => {
            DraftDeckError::Gateway("AI credits exhausted, please add funds".into())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DraftDeckError::Gateway(format!("gateway rejected the API key (HTTP {status})"))
        }
        _ => {
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            DraftDeckError::Gateway(format!("HTTP {status}: {snippet}"))
        }
    }
}
