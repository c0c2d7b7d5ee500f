//! Chunk normalization: every yielded value becomes exactly one payload.
//!
//! Normalization is a total match over [`StreamChunk`]; there is no error
//! path. Structured shapes are matched before generic serialization so a
//! field-set is never flattened into whatever its generic JSON form happens
//! to be, and the string fallback guarantees a malformed value still
//! produces a frame instead of aborting the sequence.

use crate::chunk::StreamChunk;
use serde_json::Value;

/// The normalized form of one chunk: a JSON payload, or the string fallback
/// for values that refused serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

/// One chunk, normalized. `terminal` marks the final aggregate result.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub payload: Payload,
    pub terminal: bool,
}

/// Convert one stream chunk into its canonical event payload.
///
/// Dispatch order is significant: the final aggregate first, then structured
/// field-sets, then raw deltas, then direct serialization of anything else,
/// with the string conversion as the arm of last resort.
pub fn normalize(chunk: &StreamChunk) -> Normalized {
    match chunk {
        StreamChunk::Prediction(prediction) => Normalized {
            payload: Payload::Json(prediction.to_json()),
            terminal: true,
        },
        StreamChunk::Fields(set) => Normalized {
            payload: Payload::Json(set.to_json()),
            terminal: false,
        },
        StreamChunk::Delta(delta) => {
            let payload = match serde_json::to_value(delta) {
                Ok(value) => Payload::Json(value),
                Err(_) => Payload::Raw(format!("{delta:?}")),
            };
            Normalized {
                payload,
                terminal: false,
            }
        }
        StreamChunk::Opaque(value) => {
            let payload = match value.to_json() {
                Ok(json) => Payload::Json(json),
                Err(_) => Payload::Raw(format!("{value:?}")),
            };
            Normalized {
                payload,
                terminal: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{FieldSet, FieldValue, ModelDelta, Prediction};
    use serde_json::{json, Map};
    use std::fmt;

    #[test]
    fn test_prediction_is_terminal_and_flat() {
        let mut values = Map::new();
        values.insert("a".to_string(), json!("answer"));
        let normalized = normalize(&StreamChunk::Prediction(Prediction { values }));

        assert!(normalized.terminal);
        assert_eq!(normalized.payload, Payload::Json(json!({"a": "answer"})));
    }

    #[test]
    fn test_fieldset_keeps_declared_shape() {
        let set = FieldSet {
            group: "relevance".to_string(),
            values: vec![
                ("is_it_relevant".to_string(), FieldValue::Bool(false)),
                ("justification".to_string(), FieldValue::Empty),
            ],
        };
        let normalized = normalize(&StreamChunk::Fields(set));

        assert!(!normalized.terminal);
        assert_eq!(
            normalized.payload,
            Payload::Json(json!({"is_it_relevant": false, "justification": null}))
        );
    }

    #[test]
    fn test_delta_excludes_unset_fields() {
        let normalized = normalize(&StreamChunk::Delta(ModelDelta::content("tok")));

        assert!(!normalized.terminal);
        assert_eq!(normalized.payload, Payload::Json(json!({"content": "tok"})));
    }

    #[test]
    fn test_opaque_serializes_directly() {
        let normalized = normalize(&StreamChunk::opaque(json!([1, 2, 3])));

        assert!(!normalized.terminal);
        assert_eq!(normalized.payload, Payload::Json(json!([1, 2, 3])));
    }

    struct Unserializable;

    impl fmt::Debug for Unserializable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "<unserializable value>")
        }
    }

    impl serde::Serialize for Unserializable {
        fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(serde::ser::Error::custom("refuses serialization"))
        }
    }

    #[test]
    fn test_fallback_never_fails() {
        let normalized = normalize(&StreamChunk::opaque(Unserializable));

        assert!(!normalized.terminal);
        assert_eq!(normalized.payload, Payload::Raw("<unserializable value>".to_string()));
    }
}
