//! Blocking HTTPS transport for OpenAI-compatible `/chat/completions`.

use std::fmt;
use std::io::BufReader;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use medcompanion_config::{CompanionConfig, ProviderSettings};
use medcompanion_contracts::{
    call::{CallGuard, CallOptions},
    chat::{ChatCompletion, ChatCompletionChunk, ChatRequest},
    error::{CompanionError, CompanionResult},
};
use medcompanion_core::traits::ChatTransport;

use crate::sse::{SseEvent, SseReader};

/// Longest slice of an error body kept in `HttpStatus`.
const MAX_ERROR_BODY: usize = 512;

/// Chat transport over a pooled `reqwest` blocking client.
///
/// Holds only read-only state, so one instance is built at startup and shared
/// behind an `Arc` by every service.
pub struct HttpChatTransport {
    completions_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    default_timeout: Duration,
}

impl fmt::Debug for HttpChatTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpChatTransport")
            .field("completions_url", &self.completions_url)
            .field("api_key", &"<redacted>")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl HttpChatTransport {
    pub fn new(provider: &ProviderSettings, api_key: impl Into<String>) -> CompanionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(provider.connect_timeout())
            .timeout(provider.timeout())
            .build()
            .map_err(|e| CompanionError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let completions_url = format!(
            "{}/chat/completions",
            provider.endpoint.trim().trim_end_matches('/')
        );
        debug!(url = %completions_url, "chat transport ready");

        Ok(Self {
            completions_url,
            api_key: api_key.into(),
            client,
            default_timeout: provider.timeout(),
        })
    }

    /// Build from a loaded config, resolving the API key from the environment.
    pub fn from_config(config: &CompanionConfig) -> CompanionResult<Self> {
        let api_key = config.resolve_api_key()?;
        Self::new(&config.provider, api_key)
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    fn post(
        &self,
        request: &ChatRequest,
        guard: &CallGuard<'_>,
    ) -> CompanionResult<reqwest::blocking::Response> {
        guard.check()?;
        let timeout = guard.remaining().unwrap_or(self.default_timeout);

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CompanionError::Timeout {
                        elapsed_ms: guard.elapsed().as_millis() as u64,
                    }
                } else {
                    CompanionError::Transport {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(status = status.as_u16(), "provider returned an error status");
            return Err(CompanionError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl ChatTransport for HttpChatTransport {
    fn complete(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
    ) -> CompanionResult<ChatCompletion> {
        if request.stream {
            return Err(CompanionError::InvalidInput {
                reason: "complete() called with stream = true".to_string(),
            });
        }

        let guard = options.start();
        let response = self.post(request, &guard)?;
        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                CompanionError::Timeout {
                    elapsed_ms: guard.elapsed().as_millis() as u64,
                }
            } else {
                CompanionError::Transport {
                    reason: format!("failed to read response body: {e}"),
                }
            }
        })?;

        serde_json::from_str(&text).map_err(|e| CompanionError::MalformedJson {
            reason: format!("response body is not a chat completion: {e}"),
        })
    }

    fn stream(
        &self,
        request: &ChatRequest,
        options: &CallOptions,
        on_delta: &mut dyn FnMut(&str) -> CompanionResult<()>,
    ) -> CompanionResult<()> {
        if !request.stream {
            return Err(CompanionError::InvalidInput {
                reason: "stream() called with stream = false".to_string(),
            });
        }

        let guard = options.start();
        let response = self.post(request, &guard)?;
        let mut events = SseReader::new(BufReader::new(response));

        loop {
            let event = match events.next_event() {
                Ok(event) => event,
                Err(e) => {
                    // A read cut short by the deadline reports as a timeout.
                    guard.check()?;
                    return Err(e);
                }
            };

            match event {
                None => {
                    debug!("event stream closed without [DONE]");
                    return Ok(());
                }
                Some(SseEvent::Done) => return Ok(()),
                Some(SseEvent::Data(payload)) => {
                    let value: Value =
                        serde_json::from_str(&payload).map_err(|e| CompanionError::Stream {
                            reason: format!("undecodable stream event: {e}"),
                        })?;

                    if let Some(error) = value.get("error") {
                        let message = error
                            .get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| error.to_string());
                        return Err(CompanionError::Stream { reason: message });
                    }

                    let chunk: ChatCompletionChunk =
                        serde_json::from_value(value).map_err(|e| CompanionError::Stream {
                            reason: format!("unexpected stream chunk shape: {e}"),
                        })?;
                    if let Some(text) = chunk.delta_text() {
                        on_delta(text)?;
                    }
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
