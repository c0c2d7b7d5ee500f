//! Drives a gateway against a signature and relays what it produces.
//!
//! [`Predictor`] is the main entry point for generation. `predict` collects
//! the structured result in one call; `stream` returns a [`ChunkStream`]
//! that yields raw deltas while the model generates, then the structured
//! field-sets the final JSON contains, then the final [`Prediction`].
//!
//! # Examples
//!
//! ```ignore
//! use futures::stream::StreamExt;
//!
//! let predictor = Predictor::new("qwen3:32b", gateway, signature);
//! let mut inputs = HashMap::new();
//! inputs.insert("question".to_string(), "why?".to_string());
//!
//! let mut stream = predictor.stream(&inputs)?;
//! while let Some(chunk) = stream.next().await {
//!     println!("{:?}", chunk?);
//! }
//! ```

use crate::chunk::{ChunkStream, Prediction, StreamChunk};
use crate::error::{Result, TrickleError};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::LlmMessage;
use crate::signature::Signature;
use futures_util::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Generates structured output for one signature.
pub struct Predictor {
    model: String,
    gateway: Arc<dyn LlmGateway>,
    signature: Signature,
    config: CompletionConfig,
}

impl Predictor {
    /// Create a new predictor
    pub fn new(
        model: impl Into<String>,
        gateway: Arc<dyn LlmGateway>,
        signature: Signature,
    ) -> Self {
        Self {
            model: model.into(),
            gateway,
            signature,
            config: CompletionConfig::default(),
        }
    }

    /// Override the completion configuration
    pub fn with_config(mut self, config: CompletionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    fn build_messages(&self, inputs: &HashMap<String, String>) -> Result<Vec<LlmMessage>> {
        let user = self.signature.render_user_message(inputs)?;
        Ok(vec![
            LlmMessage::system(self.signature.system_prompt()),
            LlmMessage::user(user),
        ])
    }

    /// Generate the final aggregate result without streaming.
    pub async fn predict(&self, inputs: &HashMap<String, String>) -> Result<Prediction> {
        let messages = self.build_messages(inputs)?;
        let schema = self.signature.json_schema();

        info!("Predicting against model {}", self.model);
        let value = self
            .gateway
            .complete_json(&self.model, &messages, schema, &self.config)
            .await?;

        Ok(self.signature.collect_prediction(&value))
    }

    /// Start a streaming generation.
    ///
    /// Input validation happens here, before anything is produced; an
    /// invalid input shape fails fast and no stream is constructed. The
    /// returned stream owns everything it needs, so it can outlive the
    /// predictor and be parked in a registry.
    pub fn stream(&self, inputs: &HashMap<String, String>) -> Result<ChunkStream> {
        let messages = self.build_messages(inputs)?;
        let schema = self.signature.json_schema();
        let model = self.model.clone();
        let gateway = self.gateway.clone();
        let signature = self.signature.clone();
        let config = self.config.clone();

        Ok(Box::pin(async_stream::stream! {
            let mut buffer = String::new();

            {
                let mut deltas =
                    gateway.complete_stream(&model, &messages, Some(&schema), &config);

                while let Some(item) = deltas.next().await {
                    match item {
                        Ok(delta) => {
                            if let Some(text) = &delta.content {
                                buffer.push_str(text);
                            }
                            yield Ok(StreamChunk::Delta(delta));
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            debug!("model finished, {} bytes of accumulated output", buffer.len());

            let value: Value = match serde_json::from_str(buffer.trim()) {
                Ok(value) => value,
                Err(e) => {
                    yield Err(TrickleError::MalformedOutput(format!(
                        "final output is not valid JSON: {}",
                        e
                    )));
                    return;
                }
            };

            for fieldset in signature.collect_fieldsets(&value) {
                yield Ok(StreamChunk::Fields(fieldset));
            }

            yield Ok(StreamChunk::Prediction(signature.collect_prediction(&value)));
        }))
    }
}
