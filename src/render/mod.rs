pub mod applicator;
pub mod approximation;
pub mod context;
pub mod image_surface;
pub mod strategies;

pub use applicator::{AppliedLook, EffectApplicator, FilterOutcome, FilterState, ReconcileSettings};
pub use approximation::ApproximationChain;
pub use context::{EffectParams, FaceSurface, FilterEngine, FrameBuffer, RenderingContext, UiDriver};
pub use image_surface::ImageSurface;
pub use strategies::{default_strategies, ApplyStrategy, StrategyOutcome};
