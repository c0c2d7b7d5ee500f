use crate::chunk::ModelDelta;
use crate::error::Result;
use crate::llm::models::LlmMessage;
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Configuration for LLM completion
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub temperature: f32,
    pub num_ctx: usize,
    pub num_predict: Option<i32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            num_ctx: 32768,
            num_predict: None,
        }
    }
}

/// A stream of raw model deltas from a provider.
pub type DeltaStream<'a> = Pin<Box<dyn Stream<Item = Result<ModelDelta>> + Send + 'a>>;

/// Abstract interface for LLM providers
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Complete an LLM request with a structured JSON response constrained
    /// by the given schema
    async fn complete_json(
        &self,
        model: &str,
        messages: &[LlmMessage],
        schema: Value,
        config: &CompletionConfig,
    ) -> Result<Value>;

    /// Stream raw model deltas for an LLM request. When a schema is given,
    /// the provider constrains generation to it while still streaming the
    /// text as it is produced.
    fn complete_stream<'a>(
        &'a self,
        model: &'a str,
        messages: &'a [LlmMessage],
        schema: Option<&'a Value>,
        config: &'a CompletionConfig,
    ) -> DeltaStream<'a>;
}
