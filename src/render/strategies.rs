use tracing::debug;

use crate::look::types::{Filter, FilterType};
use crate::render::approximation::ApproximationChain;
use crate::render::context::{EffectParams, RenderingContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    Applied,
    Approximated,
    /// The capability this strategy needs is not registered.
    Unavailable,
    /// The capability is present but did not take the filter.
    Rejected,
}

/// One way of making the rendering engine reflect a filter. Strategies are tried in rank
/// order until one applies or approximates the filter.
pub trait ApplyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, context: &RenderingContext, filter: &Filter) -> StrategyOutcome;
}

pub struct DirectEngineStrategy;

impl ApplyStrategy for DirectEngineStrategy {
    fn name(&self) -> &'static str {
        "direct_engine"
    }

    fn attempt(&self, context: &RenderingContext, filter: &Filter) -> StrategyOutcome {
        let Some(engine) = context.engine() else {
            return StrategyOutcome::Unavailable;
        };
        if !engine.supports(filter.filter_type) {
            return StrategyOutcome::Unavailable;
        }
        if engine.apply_filter(filter.filter_type, &EffectParams::from(filter)) {
            StrategyOutcome::Applied
        } else {
            StrategyOutcome::Rejected
        }
    }
}

/// Ranked selectors for the engine UI control that activates each effect.
pub fn ui_selectors(filter_type: FilterType) -> &'static [&'static str] {
    match filter_type {
        FilterType::Foundation => &[
            "[data-effect=\"foundation\"]",
            "button[aria-label*=\"Foundation\" i]",
            ".makeup-tab-foundation",
            "#foundation-tab",
        ],
        FilterType::Lipstick => &[
            "[data-effect=\"lipstick\"]",
            "button[aria-label*=\"Lipstick\" i]",
            "button[aria-label*=\"Lip\" i]",
            ".makeup-tab-lipstick",
            "#lipstick-tab",
        ],
        FilterType::Eyeliner => &[
            "[data-effect=\"eyeliner\"]",
            "button[aria-label*=\"Eyeliner\" i]",
            ".makeup-tab-eyeliner",
            "#eyeliner-tab",
        ],
        FilterType::Eyeshadow => &[
            "[data-effect=\"eyeshadow\"]",
            "button[aria-label*=\"Eyeshadow\" i]",
            "button[aria-label*=\"Eye Shadow\" i]",
            ".makeup-tab-eyeshadow",
            "#eyeshadow-tab",
        ],
        FilterType::Blush => &[
            "[data-effect=\"blush\"]",
            "button[aria-label*=\"Blush\" i]",
            ".makeup-tab-blush",
            "#blush-tab",
        ],
        FilterType::Contour => &[
            "[data-effect=\"contour\"]",
            "button[aria-label*=\"Contour\" i]",
            ".makeup-tab-contour",
            "#contour-tab",
        ],
        FilterType::Highlighter => &[
            "[data-effect=\"highlighter\"]",
            "button[aria-label*=\"Highlight\" i]",
            ".makeup-tab-highlighter",
            "#highlighter-tab",
        ],
    }
}

pub struct UiSimulationStrategy;

impl ApplyStrategy for UiSimulationStrategy {
    fn name(&self) -> &'static str {
        "ui_simulation"
    }

    fn attempt(&self, context: &RenderingContext, filter: &Filter) -> StrategyOutcome {
        let Some(driver) = context.ui_driver() else {
            return StrategyOutcome::Unavailable;
        };
        for selector in ui_selectors(filter.filter_type) {
            if driver.activate(selector) {
                debug!(
                    target: "look.render",
                    filter_type = filter.filter_type.as_str(),
                    selector = *selector,
                    "Activated engine control"
                );
                return StrategyOutcome::Applied;
            }
        }
        StrategyOutcome::Rejected
    }
}

pub struct VisualApproximationStrategy;

impl ApplyStrategy for VisualApproximationStrategy {
    fn name(&self) -> &'static str {
        "visual_approximation"
    }

    fn attempt(&self, context: &RenderingContext, filter: &Filter) -> StrategyOutcome {
        let Some(surface) = context.surface() else {
            return StrategyOutcome::Unavailable;
        };
        let Some(chain) = ApproximationChain::for_filter(filter) else {
            return StrategyOutcome::Rejected;
        };
        if surface.apply_approximation(filter.filter_type, &chain) {
            StrategyOutcome::Approximated
        } else {
            StrategyOutcome::Rejected
        }
    }
}

pub fn default_strategies() -> Vec<Box<dyn ApplyStrategy>> {
    vec![
        Box::new(DirectEngineStrategy),
        Box::new(UiSimulationStrategy),
        Box::new(VisualApproximationStrategy),
    ]
}
