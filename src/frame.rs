//! Text event-stream framing and the emitter.
//!
//! An [`EventFrame`] is one `data: <payload>\n\n` block, the unit a
//! `text/event-stream` client consumes. [`event_frames`] is the emitter:
//! it pulls chunks from a generation job one at a time, normalizes each,
//! and yields one frame per chunk in arrival order. Frames are written out
//! as they are produced; nothing is batched.

use crate::chunk::ChunkStream;
use crate::normalize::{normalize, Normalized, Payload};
use futures::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use tracing::{debug, warn};

/// One wire-ready `data: <payload>\n\n` block.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFrame(String);

impl EventFrame {
    /// Encode a normalized chunk. Serialization of an already-normalized
    /// JSON payload cannot reasonably fail; if it somehow does, the frame
    /// falls back to the payload's debug form rather than erroring.
    pub fn encode(normalized: &Normalized) -> Self {
        let body = match &normalized.payload {
            Payload::Json(value) => match serde_json::to_string(value) {
                Ok(text) => text,
                Err(_) => format!("{value:?}"),
            },
            Payload::Raw(text) => text.clone(),
        };
        EventFrame(format!("data: {body}\n\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Relay a generation job as event frames, preserving arrival order.
///
/// Exactly one frame is produced per chunk. The stream ends when the job is
/// exhausted, after the terminal aggregate frame, or when chunk production
/// fails; a production failure ends the stream without an error frame.
pub fn event_frames(job: ChunkStream) -> Pin<Box<dyn Stream<Item = EventFrame> + Send>> {
    Box::pin(async_stream::stream! {
        let mut job = job;
        while let Some(item) = job.next().await {
            match item {
                Ok(chunk) => {
                    let normalized = normalize(&chunk);
                    let terminal = normalized.terminal;
                    yield EventFrame::encode(&normalized);
                    if terminal {
                        debug!("terminal frame emitted, closing stream");
                        break;
                    }
                }
                Err(e) => {
                    // Chunk production failed; the stream just ends.
                    warn!("generation aborted mid-stream: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ModelDelta, Prediction, StreamChunk};
    use crate::error::TrickleError;
    use crate::normalize::Payload;
    use futures::stream;
    use serde_json::{json, Map};

    fn prediction(field: &str, value: &str) -> StreamChunk {
        let mut values = Map::new();
        values.insert(field.to_string(), json!(value));
        StreamChunk::Prediction(Prediction { values })
    }

    async fn collect(job: ChunkStream) -> Vec<String> {
        event_frames(job).map(EventFrame::into_string).collect().await
    }

    #[test]
    fn test_encode_json_payload() {
        let normalized = Normalized {
            payload: Payload::Json(json!({"a": "answer"})),
            terminal: true,
        };
        assert_eq!(EventFrame::encode(&normalized).as_str(), "data: {\"a\":\"answer\"}\n\n");
    }

    #[test]
    fn test_encode_raw_payload() {
        let normalized = Normalized {
            payload: Payload::Raw("<odd value>".to_string()),
            terminal: false,
        };
        assert_eq!(EventFrame::encode(&normalized).as_str(), "data: <odd value>\n\n");
    }

    #[tokio::test]
    async fn test_empty_job_emits_no_frames() {
        let job: ChunkStream = Box::pin(stream::iter(vec![]));
        assert!(collect(job).await.is_empty());
    }

    #[tokio::test]
    async fn test_one_frame_per_chunk_in_order() {
        let job: ChunkStream = Box::pin(stream::iter(vec![
            Ok(StreamChunk::Delta(ModelDelta::content("one"))),
            Ok(StreamChunk::Delta(ModelDelta::content("two"))),
            Ok(StreamChunk::Delta(ModelDelta::content("three"))),
        ]));

        let frames = collect(job).await;
        assert_eq!(
            frames,
            vec![
                "data: {\"content\":\"one\"}\n\n",
                "data: {\"content\":\"two\"}\n\n",
                "data: {\"content\":\"three\"}\n\n",
            ]
        );
    }

    #[tokio::test]
    async fn test_three_deltas_then_aggregate() {
        let job: ChunkStream = Box::pin(stream::iter(vec![
            Ok(StreamChunk::Delta(ModelDelta::content("{\"a\":"))),
            Ok(StreamChunk::Delta(ModelDelta::content(" \"ans"))),
            Ok(StreamChunk::Delta(ModelDelta::content("wer\"}"))),
            Ok(prediction("a", "answer")),
        ]));

        let frames = collect(job).await;
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[3], "data: {\"a\":\"answer\"}\n\n");
    }

    #[tokio::test]
    async fn test_terminal_frame_ends_stream_early() {
        let job: ChunkStream = Box::pin(stream::iter(vec![
            Ok(prediction("a", "answer")),
            Ok(StreamChunk::Delta(ModelDelta::content("late"))),
        ]));

        let frames = collect(job).await;
        assert_eq!(frames, vec!["data: {\"a\":\"answer\"}\n\n"]);
    }

    #[tokio::test]
    async fn test_production_failure_ends_stream_without_error_frame() {
        let job: ChunkStream = Box::pin(stream::iter(vec![
            Ok(StreamChunk::Delta(ModelDelta::content("ok"))),
            Err(TrickleError::GatewayError("connection reset".to_string())),
            Ok(StreamChunk::Delta(ModelDelta::content("never seen"))),
        ]));

        let frames = collect(job).await;
        assert_eq!(frames, vec!["data: {\"content\":\"ok\"}\n\n"]);
    }

    #[test]
    fn test_blocking_consumption_with_tokio_test() {
        let job: ChunkStream =
            Box::pin(stream::iter(vec![Ok(StreamChunk::opaque(json!({"k": 1})))]));

        let frames = tokio_test::block_on(collect(job));
        assert_eq!(frames, vec!["data: {\"k\":1}\n\n"]);
    }
}
