use thiserror::Error;

/// Failure taxonomy of the look pipeline.
///
/// Only `Superseded` ever reaches a caller of the pipeline; the other variants are
/// recovered locally (fallback look, dropped filter, `Failed` filter state) and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("malformed model response: {0}")]
    MalformedModelResponse(String),
    #[error("unknown filter type '{0}'")]
    UnknownFilterType(String),
    #[error("no renderable surface is available")]
    NoRenderableSurface,
    #[error("superseded by a newer prompt")]
    Superseded,
}
