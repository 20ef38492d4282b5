use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::{recommend_for_look, FilterRecommendation, ProductCatalog};
use crate::config::Config;
use crate::error::LookError;
use crate::events::{EventBus, LookEvent};
use crate::llm::LookModel;
use crate::look::{LookCache, PromptInterpreter};
use crate::render::{AppliedLook, EffectApplicator, ReconcileSettings, RenderingContext};
use crate::utils::cancel::CancelToken;
use crate::utils::timing::SubmissionTimer;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub generation: u64,
    pub applied: AppliedLook,
    pub recommendations: Vec<FilterRecommendation>,
}

struct ActiveRun {
    generation: u64,
    cancel: CancelToken,
    reconciliation: Option<JoinHandle<AppliedLook>>,
}

/// Prompt in, applied look and product recommendations out. Each submission gets a new
/// generation; starting one cancels whatever the previous one was still doing.
pub struct LookPipeline {
    interpreter: PromptInterpreter,
    applicator: Arc<EffectApplicator>,
    catalog: Arc<ProductCatalog>,
    events: EventBus,
    recommendations_per_filter: usize,
    generation: AtomicU64,
    active: Mutex<Option<ActiveRun>>,
}

impl LookPipeline {
    pub fn new(
        interpreter: PromptInterpreter,
        applicator: Arc<EffectApplicator>,
        catalog: Arc<ProductCatalog>,
        events: EventBus,
        recommendations_per_filter: usize,
    ) -> Self {
        LookPipeline {
            interpreter,
            applicator,
            catalog,
            events,
            recommendations_per_filter: recommendations_per_filter.max(1),
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    pub fn from_config(
        config: &Config,
        model: Option<Arc<dyn LookModel>>,
        context: Arc<RenderingContext>,
        catalog: Arc<ProductCatalog>,
    ) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        let cache = Arc::new(LookCache::from_config(config));
        let interpreter = PromptInterpreter::from_config(config, model, cache);
        let applicator = Arc::new(EffectApplicator::new(
            context,
            events.clone(),
            ReconcileSettings::from_config(config),
        ));
        LookPipeline::new(
            interpreter,
            applicator,
            catalog,
            events,
            config.recommendations_per_filter,
        )
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn context(&self) -> &Arc<RenderingContext> {
        self.applicator.context()
    }

    fn begin_generation(&self) -> (u64, CancelToken) {
        let cancel = CancelToken::new();
        let mut active = self.active.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = active.take() {
            debug!(
                target: "look.pipeline",
                superseded = previous.generation,
                generation,
                "Cancelling previous submission"
            );
            previous.cancel.cancel();
            if let Some(handle) = previous.reconciliation {
                handle.abort();
            }
        }
        *active = Some(ActiveRun {
            generation,
            cancel: cancel.clone(),
            reconciliation: None,
        });
        (generation, cancel)
    }

    /// Runs one prompt end to end. The only error is `LookError::Superseded`, returned
    /// when a newer submission started before this one applied its look.
    pub async fn submit(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> Result<PipelineResult, LookError> {
        let (generation, cancel) = self.begin_generation();
        let mut timer = SubmissionTimer::start(generation, prompt);

        let look = match self.interpreter.interpret_request(prompt, image, &cancel).await {
            Ok(look) => look,
            Err(err) => {
                timer.complete("superseded", Some(err.to_string()));
                return Err(err);
            }
        };

        let current = self
            .active
            .lock()
            .as_ref()
            .is_some_and(|run| run.generation == generation);
        if !current || cancel.is_cancelled() {
            timer.complete("superseded", None);
            return Err(LookError::Superseded);
        }
        // Collaborators run unlocked; they may call back into the pipeline.
        let applied = self.applicator.apply(look.clone(), generation);

        let recommendations =
            recommend_for_look(&look, &self.catalog, self.recommendations_per_filter);
        for recommendation in &recommendations {
            self.events.publish(LookEvent::ProductsRecommended {
                generation,
                filter_type: recommendation.filter_type,
                matches: recommendation.matches.clone(),
            });
        }

        if applied.needs_reconciliation() {
            let handle = self
                .applicator
                .spawn_reconciliation(applied.clone(), cancel.clone());
            let mut active = self.active.lock();
            match active.as_mut() {
                Some(run) if run.generation == generation => run.reconciliation = Some(handle),
                _ => handle.abort(),
            }
        }

        info!(
            target: "look.pipeline",
            generation,
            style = %look.style,
            source = look.source.as_str(),
            recommended = recommendations
                .iter()
                .map(|recommendation| recommendation.matches.len())
                .sum::<usize>(),
            "Submission completed"
        );
        timer.complete(
            "success",
            Some(format!("style={} source={}", look.style, look.source.as_str())),
        );

        Ok(PipelineResult {
            generation,
            applied,
            recommendations,
        })
    }

    /// Cancels the in-flight submission or reconciliation, if any.
    pub fn cancel_active(&self) {
        if let Some(run) = self.active.lock().take() {
            run.cancel.cancel();
            if let Some(handle) = run.reconciliation {
                handle.abort();
            }
        }
    }

    /// Waits for the current generation's reconciliation loop to settle. Returns `None`
    /// when nothing is reconciling or the loop was aborted.
    pub async fn wait_for_reconciliation(&self) -> Option<AppliedLook> {
        let handle = self
            .active
            .lock()
            .as_mut()
            .and_then(|run| run.reconciliation.take())?;
        handle.await.ok()
    }
}
