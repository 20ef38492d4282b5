pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod look;
pub mod pipeline;
pub mod render;
pub mod utils;

pub use error::LookError;
pub use pipeline::{LookPipeline, PipelineResult};
