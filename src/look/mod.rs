pub mod cache;
pub mod classifier;
pub mod interpreter;
pub mod normalizer;
pub mod types;

pub use cache::LookCache;
pub use interpreter::PromptInterpreter;
pub use normalizer::{normalize, normalize_look};
pub use types::{CanonicalLook, ExtraValue, Filter, FilterType, LookSource, RawFilter, RawLook};
