use crate::chunk::ModelDelta;
use crate::error::{Result, TrickleError};
use crate::llm::gateway::{CompletionConfig, DeltaStream, LlmGateway};
use crate::llm::models::LlmMessage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Configuration for connecting to Ollama server
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub host: String,
    pub timeout: Option<std::time::Duration>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            timeout: None,
        }
    }
}

/// Gateway for Ollama local LLM service
///
/// Supports schema-constrained structured output, both collected in one
/// response and streamed as raw deltas while the model generates.
pub struct OllamaGateway {
    client: Client,
    config: OllamaConfig,
}

impl OllamaGateway {
    /// Create a new Ollama gateway with default configuration
    pub fn new() -> Self {
        Self::with_config(OllamaConfig::default())
    }

    /// Create a new Ollama gateway with custom configuration
    pub fn with_config(config: OllamaConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build().unwrap();

        Self { client, config }
    }

    /// Create gateway with custom host
    pub fn with_host(host: impl Into<String>) -> Self {
        Self::with_config(OllamaConfig {
            host: host.into(),
            ..Default::default()
        })
    }
}

impl Default for OllamaGateway {
    fn default() -> Self {
        Self::new()
    }
}

// One newline-delimited JSON line of an Ollama chat stream.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

impl StreamLine {
    fn into_delta(self) -> ModelDelta {
        let content = self
            .message
            .map(|message| message.content)
            .filter(|content| !content.is_empty());
        ModelDelta {
            model: self.model,
            created_at: self.created_at,
            content,
            done: Some(self.done),
        }
    }
}

fn adapt_messages(messages: &[LlmMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            serde_json::json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

fn extract_options(config: &CompletionConfig) -> Value {
    let mut options = serde_json::json!({
        "temperature": config.temperature,
        "num_ctx": config.num_ctx,
    });

    if let Some(num_predict) = config.num_predict {
        if num_predict > 0 {
            options["num_predict"] = serde_json::json!(num_predict);
        }
    }

    options
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn complete_json(
        &self,
        model: &str,
        messages: &[LlmMessage],
        schema: Value,
        config: &CompletionConfig,
    ) -> Result<Value> {
        info!("Requesting structured output from Ollama");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let body = serde_json::json!({
            "model": model,
            "messages": adapt_messages(messages),
            "options": extract_options(config),
            "format": schema,
            "stream": false
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.host))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TrickleError::GatewayError(format!(
                "Ollama API error: {}",
                response.status()
            )));
        }

        let response_body: Value = response.json().await?;
        let content = response_body["message"]["content"]
            .as_str()
            .ok_or_else(|| TrickleError::GatewayError("No content in response".to_string()))?;

        let json_value: Value = serde_json::from_str(content)?;

        Ok(json_value)
    }

    fn complete_stream<'a>(
        &'a self,
        model: &'a str,
        messages: &'a [LlmMessage],
        schema: Option<&'a Value>,
        config: &'a CompletionConfig,
    ) -> DeltaStream<'a> {
        Box::pin(async_stream::stream! {
            info!("Starting Ollama streaming completion");
            debug!("Model: {}, Message count: {}", model, messages.len());

            let mut body = serde_json::json!({
                "model": model,
                "messages": adapt_messages(messages),
                "options": extract_options(config),
                "stream": true
            });

            if let Some(schema) = schema {
                body["format"] = schema.clone();
            }

            let response = match self
                .client
                .post(format!("{}/api/chat", self.config.host))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(TrickleError::GatewayError(format!(
                    "Ollama API error: {}",
                    response.status()
                )));
                return;
            }

            // Process the newline-delimited JSON byte stream
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        if let Ok(text) = std::str::from_utf8(&bytes) {
                            buffer.push_str(text);

                            while let Some(newline_pos) = buffer.find('\n') {
                                let line = buffer[..newline_pos].trim().to_string();
                                buffer = buffer[newline_pos + 1..].to_string();

                                if line.is_empty() {
                                    continue;
                                }

                                match serde_json::from_str::<StreamLine>(&line) {
                                    Ok(parsed) => {
                                        yield Ok(parsed.into_delta());
                                    }
                                    Err(e) => {
                                        warn!("Failed to parse streaming chunk: {}", e);
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e.into());
                        return;
                    }
                }
            }

            // Whatever remains in the buffer is one unterminated line
            let line = buffer.trim();
            if !line.is_empty() {
                match serde_json::from_str::<StreamLine>(line) {
                    Ok(parsed) => yield Ok(parsed.into_delta()),
                    Err(e) => warn!("Failed to parse trailing chunk: {}", e),
                }
            }
        })
    }
}
