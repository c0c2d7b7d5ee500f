pub mod chunk;
pub mod error;
pub mod frame;
pub mod llm;
pub mod normalize;
pub mod registry;
pub mod server;
pub mod signature;

pub use error::{Result, TrickleError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::chunk::{ChunkStream, FieldSet, FieldValue, ModelDelta, Prediction, StreamChunk};
    pub use crate::error::{Result, TrickleError};
    pub use crate::frame::{event_frames, EventFrame};
    pub use crate::llm::gateways::OllamaGateway;
    pub use crate::llm::{CompletionConfig, LlmGateway, LlmMessage, MessageRole, Predictor};
    pub use crate::registry::StreamRegistry;
    pub use crate::server::AppState;
    pub use crate::signature::{FieldKind, FieldSpec, Signature};
}
