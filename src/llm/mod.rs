use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

pub mod gemini;

pub use gemini::GeminiLookModel;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One single-turn content-generation request.
#[derive(Debug, Clone, Default)]
pub struct LookRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub image: Option<Vec<u8>>,
}

/// A language model able to answer a styling request with free text.
pub trait LookModel: Send + Sync {
    fn provider(&self) -> &str;

    fn model_name(&self) -> &str;

    fn generate<'a>(&'a self, request: &'a LookRequest) -> BoxFuture<'a, Result<String>>;
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}
