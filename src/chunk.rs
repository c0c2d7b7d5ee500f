//! The values a generation job can yield.
//!
//! A running generation produces a heterogeneous sequence: raw model deltas
//! while tokens arrive, structured field-sets once declared output groups can
//! be assembled, and a final [`Prediction`] carrying every requested output
//! field. Anything else a gateway hands us travels through the [`Opaque`]
//! arm so a single odd value never takes the whole sequence down.
//!
//! [`Opaque`]: StreamChunk::Opaque

use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::pin::Pin;

/// An in-progress production of stream chunks, terminated by a final
/// [`Prediction`]. Owned by whoever pulls it; dropping it stops generation.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// One raw incremental event from the model, before any mapping onto
/// declared output fields. Fields the gateway left unset are excluded from
/// serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl ModelDelta {
    /// Create a delta carrying only partial textual content
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A single declared-field value in its JSON-compatible shapes.
///
/// `Empty` is a field the model explicitly left unset; it renders as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    TextList(Vec<String>),
    Empty,
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::TextList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Empty => Value::Null,
        }
    }
}

/// A named partial result matching one declared output group.
#[derive(Debug, Clone)]
pub struct FieldSet {
    pub group: String,
    pub values: Vec<(String, FieldValue)>,
}

impl FieldSet {
    /// Render as a plain object of the declared fields. The group name is
    /// carried implicitly by the object's shape, not as a tag.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.values {
            object.insert(name.clone(), value.to_json());
        }
        Value::Object(object)
    }
}

/// The final aggregate result of a generation: every declared output field,
/// with unset optional fields as `null`.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub values: Map<String, Value>,
}

impl Prediction {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Render as a flat field-to-value object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// A value a gateway yielded that maps onto none of the recognized shapes.
///
/// Serialization is attempted when the chunk is normalized; implementors
/// whose serialization fails are rendered through their `Debug` form instead.
pub trait OpaqueValue: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T> OpaqueValue for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// One item yielded by a generation job.
#[derive(Debug)]
pub enum StreamChunk {
    /// Raw incremental model-output event
    Delta(ModelDelta),
    /// Partially populated structured field group
    Fields(FieldSet),
    /// Final aggregate result, ends the sequence
    Prediction(Prediction),
    /// Unrecognized value, forwarded best-effort
    Opaque(Box<dyn OpaqueValue>),
}

impl StreamChunk {
    /// Wrap an arbitrary value in the opaque arm
    pub fn opaque(value: impl OpaqueValue + 'static) -> Self {
        StreamChunk::Opaque(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delta_serialization_excludes_unset_fields() {
        let delta = ModelDelta::content("partial");
        let value = serde_json::to_value(&delta).unwrap();

        assert_eq!(value, json!({"content": "partial"}));
    }

    #[test]
    fn test_delta_serialization_keeps_set_fields() {
        let delta = ModelDelta {
            model: Some("qwen3:32b".to_string()),
            content: Some("hi".to_string()),
            done: Some(false),
            ..Default::default()
        };
        let value = serde_json::to_value(&delta).unwrap();

        assert_eq!(value, json!({"model": "qwen3:32b", "content": "hi", "done": false}));
    }

    #[test]
    fn test_field_value_to_json() {
        assert_eq!(FieldValue::Bool(true).to_json(), json!(true));
        assert_eq!(FieldValue::Text("yes".to_string()).to_json(), json!("yes"));
        assert_eq!(
            FieldValue::TextList(vec!["a".to_string(), "b".to_string()]).to_json(),
            json!(["a", "b"])
        );
        assert_eq!(FieldValue::Empty.to_json(), Value::Null);
    }

    #[test]
    fn test_field_set_to_json_is_untagged_object() {
        let set = FieldSet {
            group: "relevance".to_string(),
            values: vec![
                ("is_it_relevant".to_string(), FieldValue::Bool(true)),
                ("justification".to_string(), FieldValue::Text("on topic".to_string())),
            ],
        };

        let value = set.to_json();
        assert_eq!(value, json!({"is_it_relevant": true, "justification": "on topic"}));
        assert!(value.get("relevance").is_none());
    }

    #[test]
    fn test_prediction_to_json_is_flat() {
        let mut values = Map::new();
        values.insert("a".to_string(), json!("answer"));
        values.insert("maybe".to_string(), Value::Null);

        let prediction = Prediction { values };
        assert_eq!(prediction.to_json(), json!({"a": "answer", "maybe": null}));
        assert_eq!(prediction.get("a"), Some(&json!("answer")));
        assert_eq!(prediction.get("missing"), None);
    }

    #[test]
    fn test_opaque_value_serializes_serde_types() {
        let chunk = StreamChunk::opaque(json!({"k": 1}));
        match chunk {
            StreamChunk::Opaque(value) => {
                assert_eq!(value.to_json().unwrap(), json!({"k": 1}));
            }
            _ => panic!("Expected Opaque"),
        }
    }
}
