//! The HTTP surface: a dispatcher endpoint, a stream endpoint, and an
//! embedded debug client.
//!
//! `POST /ask` constructs one generation job, parks it in the registry, and
//! returns `{"stream_url": "/stream/<id>"}` without waiting for any model
//! output. `GET /stream/<id>` claims the job and relays it as a
//! `text/event-stream` response, one `data:` frame per chunk. If a client
//! disconnects mid-stream the response body is dropped and generation stops
//! with it.

pub mod handlers;

use crate::error::Result;
use crate::llm::Predictor;
use crate::registry::StreamRegistry;
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub use handlers::{AskRequest, AskResponse};

/// Shared state: the predictor jobs are built from, the registry that
/// correlates dispatches with stream requests, and the input bindings.
pub struct AppState {
    pub registry: StreamRegistry,
    predictor: Predictor,
    question_input: String,
    fixed_inputs: HashMap<String, String>,
}

impl AppState {
    /// Create server state. `question_input` names the signature input the
    /// request's free-text question binds to.
    pub fn new(predictor: Predictor, question_input: impl Into<String>) -> Self {
        Self {
            registry: StreamRegistry::new(),
            predictor,
            question_input: question_input.into(),
            fixed_inputs: HashMap::new(),
        }
    }

    /// Bind a fixed server-side input value (e.g. a standing context
    /// preamble). Request-supplied context overrides a fixed `context`.
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fixed_inputs.insert(name.into(), value.into());
        self
    }

    /// The dispatcher: build exactly one generation job for this question,
    /// register it, and return its identifier. Fails fast on invalid input;
    /// nothing is registered in that case.
    pub fn dispatch(&self, question: String, context: Option<String>) -> Result<String> {
        let mut inputs = self.fixed_inputs.clone();
        inputs.insert(self.question_input.clone(), question);
        if let Some(context) = context {
            inputs.insert("context".to_string(), context);
        }

        let job = self.predictor.stream(&inputs)?;
        Ok(self.registry.register(job))
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ask", post(handlers::ask))
        .route("/stream/{id}", get(handlers::stream))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
