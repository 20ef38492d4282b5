use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

/// Times one prompt submission from receipt to its applied look.
#[derive(Debug)]
pub struct SubmissionTimer {
    generation: u64,
    prompt: String,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl SubmissionTimer {
    pub fn start(generation: u64, prompt: &str) -> Self {
        let prompt = prompt.replace('\n', " ");
        let prompt = if prompt.chars().count() > 300 {
            prompt.chars().take(300).collect()
        } else {
            prompt
        };

        let timer = SubmissionTimer {
            generation,
            prompt,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        };
        info!(
            target: "look.timing",
            "event=prompt_received generation={} received_at={} prompt={:?}",
            timer.generation,
            timer.started_at.to_rfc3339(),
            timer.prompt
        );
        timer
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn complete(&mut self, status: &str, detail: Option<String>) {
        self.mark_status(status, detail);
        if self.completed {
            return;
        }
        self.completed = true;
        info!(
            target: "look.timing",
            "event=prompt_completed generation={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.generation,
            self.started_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
            self.started_perf.elapsed().as_secs_f64(),
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub async fn log_model_timing<T, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, anyhow::Error>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: "look.timing",
        "event=model_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let (status, error) = match &result {
        Ok(_) => ("success", String::new()),
        Err(err) => ("error", err.to_string().chars().take(200).collect()),
    };

    info!(
        target: "look.timing",
        "event=model_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} error={:?} metadata={}",
        provider,
        model,
        operation,
        Utc::now().to_rfc3339(),
        started_perf.elapsed().as_secs_f64(),
        status,
        error,
        metadata_text
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn timer_flattens_and_truncates_prompt() {
        let mut timer = SubmissionTimer::start(7, &format!("line one\nline two {}", "é".repeat(400)));
        assert!(!timer.prompt.contains('\n'));
        assert_eq!(timer.prompt.chars().count(), 300);

        timer.complete("success", None);
        timer.complete("superseded", Some("late".to_string()));
        assert!(timer.completed);
        assert_eq!(timer.status, "superseded");
    }

    #[tokio::test]
    async fn model_timing_passes_the_call_result_through() {
        let ok = log_model_timing("scripted", "m", "generate", None, || async { Ok(3) }).await;
        assert_eq!(ok.unwrap(), 3);

        let err: Result<(), anyhow::Error> =
            log_model_timing("scripted", "m", "generate", None, || async {
                Err(anyhow!("boom"))
            })
            .await;
        assert_eq!(err.unwrap_err().to_string(), "boom");
    }
}
