use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, LOOK_SYSTEM_PROMPT};
use crate::error::LookError;
use crate::llm::{LookModel, LookRequest};
use crate::look::cache::{prompt_key, LookCache};
use crate::look::classifier;
use crate::look::normalizer::normalize_look;
use crate::look::types::{CanonicalLook, LookSource, RawFilter, RawLook};
use crate::utils::cancel::CancelToken;

/// Returns the first balanced `{...}` block of `text`, skipping braces inside JSON
/// string literals.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Parses free-form model output into a raw look. The response must contain a JSON
/// object with a non-empty `filters` array.
pub fn parse_model_look(text: &str) -> Result<RawLook, LookError> {
    let block = extract_json_object(text).ok_or_else(|| {
        LookError::MalformedModelResponse("no JSON object in response".to_string())
    })?;
    let value: Value = serde_json::from_str(block)
        .map_err(|err| LookError::MalformedModelResponse(format!("invalid JSON: {err}")))?;

    let filters = value
        .get("filters")
        .and_then(Value::as_array)
        .filter(|filters| !filters.is_empty())
        .ok_or_else(|| {
            LookError::MalformedModelResponse("missing or empty 'filters' array".to_string())
        })?;

    Ok(RawLook {
        filters: filters.iter().filter_map(RawFilter::from_json).collect(),
        style: text_field(&value, "style").unwrap_or_default(),
        description: text_field(&value, "description").unwrap_or_default(),
        occasion: text_field(&value, "occasion"),
    })
}

fn build_user_content(prompt: &str, with_image: bool) -> String {
    let mut content = format!("Styling request: {}", prompt.trim());
    if with_image {
        content.push_str("\n\nThe attached photo shows the face the look will be applied to; pick shades that suit it.");
    }
    content.push_str("\n\nReturn only the JSON object.");
    content
}

/// Turns a styling prompt into a canonical look: cache first, then the model, then the
/// keyword classifier. Never fails except when cancelled.
pub struct PromptInterpreter {
    model: Option<Arc<dyn LookModel>>,
    cache: Arc<LookCache>,
    model_timeout: Duration,
}

impl PromptInterpreter {
    pub fn new(
        model: Option<Arc<dyn LookModel>>,
        cache: Arc<LookCache>,
        model_timeout: Duration,
    ) -> Self {
        PromptInterpreter {
            model,
            cache,
            model_timeout,
        }
    }

    pub fn from_config(
        config: &Config,
        model: Option<Arc<dyn LookModel>>,
        cache: Arc<LookCache>,
    ) -> Self {
        PromptInterpreter::new(
            model,
            cache,
            Duration::from_secs(config.model_timeout_seconds.max(1)),
        )
    }

    pub fn cache(&self) -> &Arc<LookCache> {
        &self.cache
    }

    pub async fn interpret(&self, prompt: &str) -> Arc<CanonicalLook> {
        match self.interpret_request(prompt, None, &CancelToken::new()).await {
            Ok(look) => look,
            Err(_) => Arc::new(normalize_look(
                &classifier::classify(prompt),
                LookSource::Fallback,
            )),
        }
    }

    /// Cancellable form. A cancelled call drops the in-flight model request and returns
    /// `LookError::Superseded`; every other failure degrades to the fallback look.
    /// Requests carrying a face image bypass the cache, whose key is the prompt alone.
    pub async fn interpret_request(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
        cancel: &CancelToken,
    ) -> Result<Arc<CanonicalLook>, LookError> {
        let key = prompt_key(prompt);
        let use_cache = image.is_none();
        if use_cache {
            if let Some(look) = self.cache.get(&key) {
                debug!(target: "look.interpreter", key = %key, style = %look.style, "Cache hit");
                return Ok(look);
            }
        }

        let model_result = match &self.model {
            Some(model) => {
                tokio::select! {
                    result = self.request_model_look(model.as_ref(), prompt, image) => result,
                    _ = cancel.cancelled() => {
                        info!(target: "look.interpreter", key = %key, "Model request cancelled by newer prompt");
                        return Err(LookError::Superseded);
                    }
                }
            }
            None => Err(LookError::ModelUnavailable(
                "no model configured".to_string(),
            )),
        };

        let look = match model_result {
            Ok(look) => look,
            Err(err) => {
                let preset = classifier::classify_preset(prompt);
                warn!(
                    target: "look.interpreter",
                    "Falling back to '{}' look for {:?}: {}",
                    preset.style,
                    key,
                    err
                );
                normalize_look(&preset.to_raw_look(), LookSource::Fallback)
            }
        };

        if cancel.is_cancelled() {
            return Err(LookError::Superseded);
        }

        if use_cache {
            if let Some(existing) = self.cache.insert(key, &look) {
                debug!(target: "look.interpreter", style = %existing.style, "Prompt was cached while interpreting; using cached look");
                return Ok(existing);
            }
        }
        info!(
            target: "look.interpreter",
            style = %look.style,
            source = look.source.as_str(),
            filters = look.filters.len(),
            "Interpreted look"
        );
        Ok(Arc::new(look))
    }

    async fn request_model_look(
        &self,
        model: &dyn LookModel,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> Result<CanonicalLook, LookError> {
        let request = LookRequest {
            system_prompt: LOOK_SYSTEM_PROMPT.to_string(),
            user_content: build_user_content(prompt, image.is_some()),
            image: image.map(<[u8]>::to_vec),
        };

        let text = match tokio::time::timeout(self.model_timeout, model.generate(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => return Err(LookError::ModelUnavailable(err.to_string())),
            Err(_) => {
                return Err(LookError::ModelUnavailable(format!(
                    "{} model timed out after {:?}",
                    model.provider(),
                    self.model_timeout
                )))
            }
        };

        let raw = parse_model_look(&text)?;
        let look = normalize_look(&raw, LookSource::Model);
        if look.filters.is_empty() {
            return Err(LookError::MalformedModelResponse(
                "no usable filters after normalization".to_string(),
            ));
        }
        Ok(look)
    }
}
