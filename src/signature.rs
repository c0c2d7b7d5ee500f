//! Runtime-declared generation signatures.
//!
//! A [`Signature`] names the inputs a generation takes and the outputs it
//! must produce: scalar fields (booleans, text, optional text, optional text
//! lists) and named groups of such fields. It renders itself to a JSON
//! schema for schema-constrained generation, and coerces the model's final
//! JSON back into the declared shapes.
//!
//! # Examples
//!
//! ```
//! use trickle::signature::{FieldSpec, Signature};
//!
//! let signature = Signature::new("Analyze the sentiment of the given text.")
//!     .input("text", "the text to analyze")
//!     .output(FieldSpec::text("label", "positive, negative or neutral"))
//!     .output(FieldSpec::text("reasoning", "why the label fits"));
//!
//! let schema = signature.json_schema();
//! assert_eq!(schema["type"], "object");
//! ```

use crate::chunk::{FieldSet, FieldValue, Prediction};
use crate::error::{Result, TrickleError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// The JSON-compatible shapes a declared output field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Text,
    OptionalText,
    OptionalTextList,
}

impl FieldKind {
    fn schema(&self) -> Value {
        match self {
            FieldKind::Bool => json!({"type": "boolean"}),
            FieldKind::Text => json!({"type": "string"}),
            FieldKind::OptionalText => json!({"type": ["string", "null"]}),
            FieldKind::OptionalTextList => {
                json!({"type": ["array", "null"], "items": {"type": "string"}})
            }
        }
    }

    /// Coerce a model-produced value into this kind, best-effort. Missing or
    /// mismatched values become [`FieldValue::Empty`] rather than errors;
    /// non-string scalars are carried through their textual form.
    pub fn coerce(&self, value: Option<&Value>) -> FieldValue {
        match self {
            FieldKind::Bool => match value {
                Some(Value::Bool(b)) => FieldValue::Bool(*b),
                _ => FieldValue::Empty,
            },
            FieldKind::Text | FieldKind::OptionalText => match value {
                Some(Value::String(s)) => FieldValue::Text(s.clone()),
                Some(Value::Null) | None => FieldValue::Empty,
                Some(other) => FieldValue::Text(other.to_string()),
            },
            FieldKind::OptionalTextList => match value {
                Some(Value::Array(items)) => FieldValue::TextList(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                ),
                Some(Value::String(s)) => FieldValue::TextList(vec![s.clone()]),
                _ => FieldValue::Empty,
            },
        }
    }
}

/// One declared output field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
        }
    }

    pub fn bool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool, description)
    }

    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text, description)
    }

    pub fn optional_text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::OptionalText, description)
    }

    pub fn optional_text_list(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::OptionalTextList, description)
    }

    fn schema(&self) -> Value {
        let mut schema = self.kind.schema();
        schema["description"] = Value::String(self.description.clone());
        schema
    }
}

/// A declared input field.
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub name: String,
    pub description: String,
}

/// One declared output: a scalar field or a named group of fields.
#[derive(Debug, Clone)]
pub enum OutputSpec {
    Field(FieldSpec),
    Group {
        name: String,
        description: String,
        fields: Vec<FieldSpec>,
    },
}

impl OutputSpec {
    pub fn name(&self) -> &str {
        match self {
            OutputSpec::Field(spec) => &spec.name,
            OutputSpec::Group { name, .. } => name,
        }
    }
}

/// Declares what a generation takes and what it must produce.
#[derive(Debug, Clone)]
pub struct Signature {
    instructions: String,
    inputs: Vec<InputSpec>,
    outputs: Vec<OutputSpec>,
}

impl Signature {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declare an input field
    pub fn input(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// Declare a scalar output field
    pub fn output(mut self, field: FieldSpec) -> Self {
        self.outputs.push(OutputSpec::Field(field));
        self
    }

    /// Declare a named output group of fields
    pub fn group(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        self.outputs.push(OutputSpec::Group {
            name: name.into(),
            description: description.into(),
            fields,
        });
        self
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    /// Render the declared outputs as a JSON schema object.
    ///
    /// Every output appears in `required` so the model emits all of them;
    /// optional-ness is expressed through nullable types.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for output in &self.outputs {
            required.push(Value::String(output.name().to_string()));
            match output {
                OutputSpec::Field(spec) => {
                    properties.insert(spec.name.clone(), spec.schema());
                }
                OutputSpec::Group {
                    name,
                    description,
                    fields,
                } => {
                    let mut group_properties = Map::new();
                    let mut group_required = Vec::new();
                    for field in fields {
                        group_required.push(Value::String(field.name.clone()));
                        group_properties.insert(field.name.clone(), field.schema());
                    }
                    properties.insert(
                        name.clone(),
                        json!({
                            "type": "object",
                            "description": description,
                            "properties": group_properties,
                            "required": group_required,
                        }),
                    );
                }
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The system message for this signature.
    pub fn system_prompt(&self) -> String {
        self.instructions.clone()
    }

    /// Render the user message from the supplied input values.
    ///
    /// Fails when a declared input is missing; undeclared keys are ignored.
    pub fn render_user_message(&self, inputs: &HashMap<String, String>) -> Result<String> {
        let mut lines = Vec::with_capacity(self.inputs.len());
        for spec in &self.inputs {
            let value = inputs.get(&spec.name).ok_or_else(|| {
                TrickleError::InputError(format!("missing input field '{}'", spec.name))
            })?;
            lines.push(format!("{}: {}", spec.name, value));
        }
        Ok(lines.join("\n"))
    }

    /// Extract every declared group present in the model's final JSON as a
    /// [`FieldSet`], in declaration order.
    pub fn collect_fieldsets(&self, value: &Value) -> Vec<FieldSet> {
        let mut sets = Vec::new();
        for output in &self.outputs {
            if let OutputSpec::Group { name, fields, .. } = output {
                if let Some(Value::Object(object)) = value.get(name) {
                    let values = fields
                        .iter()
                        .map(|field| (field.name.clone(), field.kind.coerce(object.get(&field.name))))
                        .collect();
                    sets.push(FieldSet {
                        group: name.clone(),
                        values,
                    });
                }
            }
        }
        sets
    }

    /// Build the final aggregate from the model's final JSON: exactly the
    /// declared output fields, with unset ones as `null`.
    pub fn collect_prediction(&self, value: &Value) -> Prediction {
        let mut values = Map::new();
        for output in &self.outputs {
            match output {
                OutputSpec::Field(spec) => {
                    values.insert(spec.name.clone(), spec.kind.coerce(value.get(&spec.name)).to_json());
                }
                OutputSpec::Group { name, fields, .. } => {
                    let group_value = match value.get(name) {
                        Some(Value::Object(object)) => {
                            let mut group = Map::new();
                            for field in fields {
                                group.insert(
                                    field.name.clone(),
                                    field.kind.coerce(object.get(&field.name)).to_json(),
                                );
                            }
                            Value::Object(group)
                        }
                        _ => Value::Null,
                    };
                    values.insert(name.clone(), group_value);
                }
            }
        }
        Prediction { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator_signature() -> Signature {
        Signature::new("Validate the problem statement.")
            .input("context", "facts here are assumed to be true")
            .input("problem_statement", "the problem statement to validate")
            .group(
                "relevance",
                "how relevant the problem is",
                vec![
                    FieldSpec::bool("is_it_relevant", "whether the problem is relevant"),
                    FieldSpec::text("justification", "why it is or is not relevant"),
                ],
            )
            .output(FieldSpec::bool("is_personas_mentioned", "whether personas are mentioned"))
            .output(FieldSpec::optional_text_list("mentioned_personas", "the personas, if any"))
            .output(FieldSpec::optional_text("urgency_level", "Low, Medium or High"))
    }

    #[test]
    fn test_builder_declaration_order() {
        let signature = validator_signature();

        assert_eq!(signature.inputs().len(), 2);
        assert_eq!(signature.inputs()[0].name, "context");
        assert_eq!(signature.outputs().len(), 4);
        assert_eq!(signature.outputs()[0].name(), "relevance");
        assert_eq!(signature.outputs()[3].name(), "urgency_level");
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = validator_signature().json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["relevance"]["type"], "object");
        assert_eq!(
            schema["properties"]["relevance"]["properties"]["is_it_relevant"]["type"],
            "boolean"
        );
        assert_eq!(schema["properties"]["urgency_level"]["type"], json!(["string", "null"]));
        assert_eq!(
            schema["properties"]["mentioned_personas"]["items"]["type"],
            "string"
        );

        let required: Vec<&str> =
            schema["required"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(
            required,
            vec!["relevance", "is_personas_mentioned", "mentioned_personas", "urgency_level"]
        );
    }

    #[test]
    fn test_render_user_message() {
        let signature = validator_signature();
        let mut inputs = HashMap::new();
        inputs.insert("context".to_string(), "pharma background".to_string());
        inputs.insert("problem_statement".to_string(), "data entry is slow".to_string());

        let message = signature.render_user_message(&inputs).unwrap();
        assert_eq!(message, "context: pharma background\nproblem_statement: data entry is slow");
    }

    #[test]
    fn test_render_user_message_missing_input() {
        let signature = validator_signature();
        let inputs = HashMap::new();

        let err = signature.render_user_message(&inputs).unwrap_err();
        assert!(err.to_string().contains("missing input field 'context'"));
    }

    #[test]
    fn test_collect_fieldsets_only_present_groups() {
        let signature = validator_signature();

        let sets = signature.collect_fieldsets(&json!({
            "relevance": {"is_it_relevant": true, "justification": "on topic"},
            "is_personas_mentioned": false,
        }));

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].group, "relevance");
        assert_eq!(sets[0].values[0], ("is_it_relevant".to_string(), FieldValue::Bool(true)));

        let none = signature.collect_fieldsets(&json!({"is_personas_mentioned": true}));
        assert!(none.is_empty());
    }

    #[test]
    fn test_collect_prediction_has_exactly_declared_fields() {
        let signature = validator_signature();

        let prediction = signature.collect_prediction(&json!({
            "relevance": {"is_it_relevant": true, "justification": "on topic"},
            "is_personas_mentioned": false,
            "undeclared": "dropped",
        }));

        let object = prediction.to_json();
        let keys: Vec<&String> = object.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert!(object.get("undeclared").is_none());
        assert_eq!(object["relevance"]["is_it_relevant"], json!(true));
        // unset optionals come back as explicit nulls
        assert_eq!(object["mentioned_personas"], Value::Null);
        assert_eq!(object["urgency_level"], Value::Null);
    }

    #[test]
    fn test_coerce_tolerates_mismatched_scalars() {
        assert_eq!(FieldKind::Text.coerce(Some(&json!(3))), FieldValue::Text("3".to_string()));
        assert_eq!(
            FieldKind::OptionalTextList.coerce(Some(&json!("solo"))),
            FieldValue::TextList(vec!["solo".to_string()])
        );
        assert_eq!(FieldKind::Bool.coerce(Some(&json!("yes"))), FieldValue::Empty);
        assert_eq!(FieldKind::OptionalText.coerce(None), FieldValue::Empty);
    }
}
