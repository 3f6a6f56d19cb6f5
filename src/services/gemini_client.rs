use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Produces raw itinerary text for a prompt.
///
/// Implementations return the response body untouched; envelope unwrapping and
/// validation happen in the planner. One call, one request: no streaming and
/// no conversation state.
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Transport-level retries for rate limiting and server errors.
///
/// Parse and validation failures are never retried here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
    retry: RetryPolicy,
    temperature: Option<f32>,
    json_response: bool,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
            retry: RetryPolicy::default(),
            temperature: None,
            json_response: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// `None` leaves the transport default in place.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask the API for an `application/json` response body part.
    pub fn with_json_response(mut self, json_response: bool) -> Self {
        self.json_response = json_response;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| PlannerError::Config(format!("Failed to build HTTP client: {err}")))
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut request = GenerateContentRequest::new(prompt);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if self.json_response {
            request = request.with_response_mime_type("application/json");
        }
        request.into_value()
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        let client = self.http_client()?;
        let request_url = build_generate_url(&self.base_url, &self.model);
        let body = self.request_body(prompt);

        let mut attempt = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            debug!(target: "itinerary::generator", model = %self.model, attempt, "sending generateContent request");

            let response = client
                .post(&request_url)
                .header("x-goog-api-key", self.api_key.as_str())
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response.text().await.map_err(transport_error)?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < self.retry.max_retries {
                    warn!(target: "itinerary::generator", attempt, "rate limited, backing off");
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(PlannerError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < self.retry.max_retries {
                warn!(target: "itinerary::generator", attempt, %status, "server error, backing off");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            if !status.is_success() {
                let api_message = serde_json::from_str::<Value>(&response_text)
                    .ok()
                    .and_then(|json| {
                        json.pointer("/error/message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or(response_text);

                return Err(PlannerError::Generator(format!(
                    "HTTP {} error: {}",
                    status, api_message
                )));
            }

            return Ok(response_text);
        }
    }
}

#[async_trait]
impl ItineraryGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_content(prompt).await
    }
}

fn transport_error(err: reqwest::Error) -> PlannerError {
    if err.is_timeout() {
        PlannerError::Timeout(format!("Gemini request timed out: {err}"))
    } else {
        PlannerError::Generator(format!("HTTP request failed: {err}"))
    }
}

fn build_generate_url(base_url: &str, model: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(":generateContent") {
        trimmed.to_string()
    } else {
        format!("{}/models/{}:generateContent", trimmed, model)
    }
}

/// Body of a single-turn `generateContent` call.
#[derive(Clone, Debug)]
pub struct GenerateContentRequest {
    prompt: String,
    temperature: Option<f32>,
    response_mime_type: Option<String>,
}

impl GenerateContentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            response_mime_type: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.response_mime_type = Some(mime_type.into());
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": self.prompt }] }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(mime_type) = self.response_mime_type {
            generation_config.insert("responseMimeType".to_string(), json!(mime_type));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }
}
