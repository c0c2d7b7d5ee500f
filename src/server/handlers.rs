//! HTTP handlers: the dispatcher and emitter endpoints.

use crate::frame::event_frames;
use crate::server::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

/// Body of `POST /ask`: the free-text question plus optional auxiliary
/// context overriding whatever the server was configured with.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub stream_url: String,
}

/// Dispatch one generation job and return the path to attach to it.
/// Returns immediately; no generation output is awaited here.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    match state.dispatch(request.question, request.context) {
        Ok(id) => {
            info!("dispatched generation job {}", id);
            Ok(Json(AskResponse {
                stream_url: format!("/stream/{}", id),
            }))
        }
        Err(e) => {
            warn!("dispatch rejected: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

/// Attach to a dispatched job and relay it as a `text/event-stream`
/// response. Unknown, already-claimed, or pre-restart identifiers get a 404
/// and no stream.
pub async fn stream(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let Some(job) = state.registry.claim(&id) else {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    };

    let frames = event_frames(job).map(|frame| Ok::<_, Infallible>(frame.into_string()));

    match Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(frames))
    {
        Ok(response) => response,
        Err(e) => {
            warn!("failed to build stream response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the embedded debug client.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/stream_json.html"))
}
