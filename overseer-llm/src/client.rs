//! LLM client — unified interface over Ollama and OpenAI-compatible backends.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama {
        /// Base URL, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// OpenAI-compatible API (also works with Anthropic, Together, etc.).
    OpenAiCompatible {
        /// Base URL of the API.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No LLM available — all calls return an error, triggering the
    /// engine's deterministic fallbacks.
    None,
}

/// The LLM client that routes requests to the configured backend.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no backend (all calls fail → fallbacks).
    #[must_use]
    pub fn none() -> Self {
        Self {
            provider: LlmProvider::None,
            http: Client::new(),
            model: String::new(),
            max_retries: 0,
        }
    }

    /// Whether a real backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no provider is configured or all retries fail.
    /// Callers must fall back to a deterministic value on error.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => self.generate_ollama(base_url, request).await,
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                self.generate_openai(base_url, api_key, request).await
            }
        }
    }

    async fn generate_ollama(
        &self,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/api/generate");
        let body = json!({
            "model": self.model,
            "prompt": format!("{}\n\n{}", request.system, request.user),
            "stream": false,
            "format": "json",
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    "Retrying LLM call (attempt {}/{})",
                    attempt + 1,
                    self.max_retries + 1
                );
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .json(&body)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;

            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let json: serde_json::Value = resp
                            .json()
                            .await
                            .map_err(|e| LlmError::ParseError(e.to_string()))?;

                        let text = json["response"].as_str().unwrap_or("").to_string();

                        return Ok(LlmResponse {
                            text,
                            latency_ms,
                            model: self.model.clone(),
                        });
                    }
                    last_error = format!(
                        "HTTP {}: {}",
                        resp.status(),
                        resp.text().await.unwrap_or_default()
                    );
                    warn!("Ollama returned error: {}", last_error);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!("Ollama request timed out after {}ms", request.timeout_ms);
                    } else {
                        warn!("Ollama request failed: {}", last_error);
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    async fn generate_openai(
        &self,
        base_url: &str,
        api_key: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{base_url}/v1/chat/completions");
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "response_format": { "type": "json_object" },
        });

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    "Retrying OpenAI call (attempt {}/{})",
                    attempt + 1,
                    self.max_retries + 1
                );
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&body)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await;

            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let json: serde_json::Value = resp
                            .json()
                            .await
                            .map_err(|e| LlmError::ParseError(e.to_string()))?;

                        let text = json["choices"][0]["message"]["content"]
                            .as_str()
                            .unwrap_or("")
                            .to_string();

                        return Ok(LlmResponse {
                            text,
                            latency_ms,
                            model: self.model.clone(),
                        });
                    }
                    last_error = format!("HTTP {}", resp.status());
                    warn!("OpenAI API returned error: {}", last_error);
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!("OpenAI API request failed: {}", last_error);
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    /// Parse a raw response as structured JSON.
    ///
    /// Models sometimes wrap JSON in prose or code fences; anything outside
    /// the outermost braces is discarded before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ParseError`] if no JSON object can be decoded.
    pub fn parse_structured<T: serde::de::DeserializeOwned>(
        response: &LlmResponse,
    ) -> Result<T, LlmError> {
        let text = extract_json_object(&response.text).unwrap_or(&response.text);
        serde_json::from_str(text).map_err(|e| {
            LlmError::ParseError(format!(
                "JSON parse error: {e} — raw text: '{}'",
                response.text
            ))
        })
    }
}

/// Slice `text` down to its outermost `{ … }` object, if braces are present.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start { Some(&text[start..=end]) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Shape {
        speech: String,
    }

    fn response(text: &str) -> LlmResponse {
        LlmResponse {
            text: text.to_string(),
            latency_ms: 0,
            model: "test".to_string(),
        }
    }

    #[test]
    fn parses_clean_json() {
        let parsed: Shape =
            LlmClient::parse_structured(&response(r#"{"speech": "Back to work."}"#))
                .expect("parse");
        assert_eq!(parsed.speech, "Back to work.");
    }

    #[test]
    fn strips_code_fences_and_prose() {
        let text = "Here you go:\n```json\n{\"speech\": \"Hm.\"}\n```\n";
        let parsed: Shape = LlmClient::parse_structured(&response(text)).expect("parse");
        assert_eq!(parsed.speech, "Hm.");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result: Result<Shape, _> = LlmClient::parse_structured(&response("no json here"));
        assert!(matches!(result, Err(LlmError::ParseError(_))));
    }

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LlmClient::none();
        assert!(!client.is_available());
        let result = client.generate(&LlmRequest::new("sys", "user")).await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
    }
}
