pub mod gateway;
pub mod gateways;
pub mod models;
pub mod predictor;

pub use gateway::{CompletionConfig, DeltaStream, LlmGateway};
pub use models::{LlmMessage, MessageRole};
pub use predictor::Predictor;
