use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::{detect_mime_type, BoxFuture, LookModel, LookRequest};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_model_timing;

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

const GEMINI_RETRY_BASE_DELAY_MS: u64 = 400;
const GEMINI_IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

#[derive(Debug, Clone)]
pub struct GeminiLookModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: i32,
    safety_profile: String,
    max_retry_attempts: usize,
    request_timeout: Duration,
}

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn gemini_retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(GEMINI_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "permissive" => "OFF",
        _ => "BLOCK_MEDIUM_AND_ABOVE",
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
    ]
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn build_parts(request: &LookRequest) -> Vec<Value> {
    let mut parts = Vec::new();

    if let Some(image) = request.image.as_deref().filter(|bytes| !bytes.is_empty()) {
        match detect_mime_type(image) {
            Some(mime_type) if GEMINI_IMAGE_MIME_TYPES.contains(&mime_type.as_str()) => {
                parts.push(json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": general_purpose::STANDARD.encode(image)
                    }
                }));
            }
            other => {
                warn!(
                    "Skipping face image with unsupported mime type {:?}; sending text only",
                    other
                );
            }
        }
    }

    parts.push(json!({ "text": request.user_content }));
    parts
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut text_parts = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        let Some(parts) = candidate.content.and_then(|content| content.parts) else {
            continue;
        };
        for part in parts {
            if let Some(text) = part.text {
                if !text.trim().is_empty() {
                    text_parts.push(text);
                }
            }
        }
    }
    text_parts.join("\n")
}

impl GeminiLookModel {
    pub fn from_config(config: &Config) -> Self {
        GeminiLookModel {
            client: get_http_client().clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            temperature: config.gemini_temperature,
            top_k: config.gemini_top_k,
            top_p: config.gemini_top_p,
            max_output_tokens: config.gemini_max_output_tokens,
            safety_profile: config.gemini_safety_settings.clone(),
            max_retry_attempts: config.model_max_retry_attempts.max(1),
            request_timeout: Duration::from_secs(config.model_timeout_seconds.max(1)),
        }
    }

    fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "[redacted]")
    }

    fn build_payload(&self, request: &LookRequest) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": [{ "role": "user", "parts": build_parts(request) }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": self.top_k,
                "topP": self.top_p,
                "maxOutputTokens": self.max_output_tokens,
                "responseMimeType": "application/json",
            },
            "safetySettings": build_safety_settings(&self.safety_profile),
        })
    }

    async fn call_gemini_api(&self, payload: &Value) -> Result<GeminiResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.request_timeout)
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let err_text = self.redact(&err.to_string());
                    let should_retry =
                        gemini_should_retry_error(&err) && attempt < self.max_retry_attempts;
                    warn!(
                        "Gemini request failed to send: {} (timeout={}, connect={}, retrying={})",
                        err_text,
                        err.is_timeout(),
                        err.is_connect(),
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(gemini_retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("Gemini request failed: {}", err_text));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&body);
                let should_retry =
                    gemini_should_retry_status(status) && attempt < self.max_retry_attempts;
                warn!(
                    "Gemini API error: status={}, body={}, retrying={}",
                    status,
                    self.redact(&body_summary),
                    should_retry
                );
                if should_retry {
                    tokio::time::sleep(gemini_retry_delay(attempt)).await;
                    continue;
                }
                let detail = self.redact(&message.unwrap_or(body_summary));
                return Err(anyhow!(
                    "Gemini request failed with status {}: {}",
                    status,
                    detail
                ));
            }

            let value = response.json::<GeminiResponse>().await?;
            debug!(
                target: "llm.gemini",
                model = %self.model,
                candidates = value.candidates.as_ref().map(Vec::len).unwrap_or(0),
                "Gemini response received"
            );
            return Ok(value);
        }
    }

    async fn generate_text(&self, request: &LookRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("GEMINI_API_KEY is not configured"));
        }

        let payload = self.build_payload(request);
        let metadata = json!({ "with_image": request.image.is_some() });
        log_model_timing("gemini", &self.model, "look_request", Some(metadata), || async {
            let response = self.call_gemini_api(&payload).await?;
            let text = extract_text_from_response(response);
            if text.trim().is_empty() {
                return Err(anyhow!("Gemini returned no text (model: {})", self.model));
            }
            Ok(text)
        })
        .await
    }
}

impl LookModel for GeminiLookModel {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate<'a>(&'a self, request: &'a LookRequest) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.generate_text(request))
    }
}
