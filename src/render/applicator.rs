use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LookError;
use crate::events::{EventBus, LookEvent};
use crate::look::types::{CanonicalLook, Filter, FilterType};
use crate::render::context::RenderingContext;
use crate::render::strategies::{default_strategies, ApplyStrategy, StrategyOutcome};
use crate::utils::cancel::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterState {
    Pending,
    Applying,
    Applied,
    Approximated,
    Failed,
}

impl FilterState {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterState::Pending => "pending",
            FilterState::Applying => "applying",
            FilterState::Applied => "applied",
            FilterState::Approximated => "approximated",
            FilterState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FilterState::Applied | FilterState::Approximated | FilterState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    pub filter_type: FilterType,
    pub state: FilterState,
    pub strategy: Option<&'static str>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedLook {
    pub generation: u64,
    pub look: Arc<CanonicalLook>,
    pub outcomes: Vec<FilterOutcome>,
}

impl AppliedLook {
    pub fn state_of(&self, filter_type: FilterType) -> Option<FilterState> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.filter_type == filter_type)
            .map(|outcome| outcome.state)
    }

    pub fn needs_reconciliation(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.state != FilterState::Applied)
    }

    pub fn all_terminal(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.state.is_terminal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl ReconcileSettings {
    pub const MIN_INTERVAL_MS: u64 = 1000;
    pub const MAX_INTERVAL_MS: u64 = 3000;

    pub fn new(interval_ms: u64, max_attempts: u32) -> Self {
        ReconcileSettings {
            interval: Duration::from_millis(
                interval_ms.clamp(Self::MIN_INTERVAL_MS, Self::MAX_INTERVAL_MS),
            ),
            max_attempts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ReconcileSettings::new(config.reconcile_interval_ms, config.reconcile_max_attempts)
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings::new(2000, 10)
    }
}

/// Makes the rendering engine reflect a canonical look. Each filter walks the ranked
/// strategies; filters that did not reach `Applied` are retried by the reconciliation
/// loop as capabilities come up.
pub struct EffectApplicator {
    context: Arc<RenderingContext>,
    strategies: Vec<Box<dyn ApplyStrategy>>,
    events: EventBus,
    settings: ReconcileSettings,
}

impl EffectApplicator {
    pub fn new(context: Arc<RenderingContext>, events: EventBus, settings: ReconcileSettings) -> Self {
        EffectApplicator::with_strategies(context, events, settings, default_strategies())
    }

    pub fn with_strategies(
        context: Arc<RenderingContext>,
        events: EventBus,
        settings: ReconcileSettings,
        strategies: Vec<Box<dyn ApplyStrategy>>,
    ) -> Self {
        EffectApplicator {
            context,
            strategies,
            events,
            settings,
        }
    }

    pub fn context(&self) -> &Arc<RenderingContext> {
        &self.context
    }

    pub fn settings(&self) -> ReconcileSettings {
        self.settings
    }

    /// One full pass over the look. Never fails; every filter ends in a terminal state.
    pub fn apply(&self, look: Arc<CanonicalLook>, generation: u64) -> AppliedLook {
        if let Some(surface) = self.context.surface() {
            surface.clear_approximations();
        }

        let mut outcomes = Vec::with_capacity(look.filters.len());
        for filter in &look.filters {
            let mut outcome = FilterOutcome {
                filter_type: filter.filter_type,
                state: FilterState::Pending,
                strategy: None,
                attempts: 0,
            };
            self.attempt_filter(generation, filter, &mut outcome);
            outcomes.push(outcome);
        }

        let applied = AppliedLook {
            generation,
            look: look.clone(),
            outcomes,
        };
        info!(
            target: "look.applicator",
            generation,
            style = %look.style,
            applied = count(&applied, FilterState::Applied),
            approximated = count(&applied, FilterState::Approximated),
            failed = count(&applied, FilterState::Failed),
            "Look applied"
        );
        self.events.publish(LookEvent::LookApplied { generation, look });
        applied
    }

    fn attempt_filter(&self, generation: u64, filter: &Filter, outcome: &mut FilterOutcome) {
        let previous = outcome.state;
        outcome.state = FilterState::Applying;
        outcome.attempts += 1;

        let (state, strategy) = self.run_strategies(filter);
        outcome.state = state;
        if strategy.is_some() {
            outcome.strategy = strategy;
        }

        if previous == FilterState::Approximated && state == FilterState::Applied {
            if let Some(surface) = self.context.surface() {
                surface.clear_approximation(filter.filter_type);
            }
        }

        if state != previous {
            debug!(
                target: "look.applicator",
                generation,
                filter_type = filter.filter_type.as_str(),
                from = previous.as_str(),
                to = state.as_str(),
                strategy = strategy.unwrap_or("none"),
                "Filter state changed"
            );
            self.events.publish(LookEvent::FilterApplied {
                generation,
                filter_type: filter.filter_type,
                state,
                color_hex: filter.color_hex.clone(),
                intensity: filter.intensity,
            });
        }
    }

    fn run_strategies(&self, filter: &Filter) -> (FilterState, Option<&'static str>) {
        if !self.context.surface_available() {
            warn!(
                target: "look.applicator",
                filter_type = filter.filter_type.as_str(),
                "{}",
                LookError::NoRenderableSurface
            );
            return (FilterState::Failed, None);
        }

        for strategy in &self.strategies {
            match strategy.attempt(&self.context, filter) {
                StrategyOutcome::Applied => return (FilterState::Applied, Some(strategy.name())),
                StrategyOutcome::Approximated => {
                    return (FilterState::Approximated, Some(strategy.name()))
                }
                StrategyOutcome::Unavailable | StrategyOutcome::Rejected => {}
            }
        }
        (FilterState::Failed, None)
    }

    /// Re-attempts every filter not yet `Applied` once per interval until all are
    /// applied, the attempt budget is spent, or `cancel` fires.
    pub async fn reconcile(&self, applied: &mut AppliedLook, cancel: &CancelToken) {
        let look = applied.look.clone();
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut rounds = 0u32;
        while applied.needs_reconciliation() && rounds < self.settings.max_attempts {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    debug!(target: "look.applicator", generation = applied.generation, "Reconciliation cancelled");
                    return;
                }
            }
            if cancel.is_cancelled() {
                return;
            }
            rounds += 1;

            for (filter, outcome) in look.filters.iter().zip(applied.outcomes.iter_mut()) {
                if outcome.state != FilterState::Applied {
                    self.attempt_filter(applied.generation, filter, outcome);
                }
            }
        }

        if applied.needs_reconciliation() {
            info!(
                target: "look.applicator",
                generation = applied.generation,
                rounds,
                "Reconciliation budget spent; keeping best-effort states"
            );
        } else {
            info!(
                target: "look.applicator",
                generation = applied.generation,
                rounds,
                "All filters applied"
            );
        }
    }

    pub fn spawn_reconciliation(
        self: &Arc<Self>,
        mut applied: AppliedLook,
        cancel: CancelToken,
    ) -> JoinHandle<AppliedLook> {
        let applicator = Arc::clone(self);
        tokio::spawn(async move {
            applicator.reconcile(&mut applied, &cancel).await;
            applied
        })
    }
}

fn count(applied: &AppliedLook, state: FilterState) -> usize {
    applied
        .outcomes
        .iter()
        .filter(|outcome| outcome.state == state)
        .count()
}
