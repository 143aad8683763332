//! Declarative response schemas for structured completions.
//!
//! A [`SchemaDescriptor`] is sent to the completion service as its
//! structured-output constraint and is checked again against the returned
//! JSON before any field reaches a view.

use serde_json::{Map, Value, json};

/// The kind of value a field must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// Homogeneous list of records of the given shape.
    Array(Box<SchemaDescriptor>),
    /// Nested record.
    Object(Box<SchemaDescriptor>),
}

impl FieldKind {
    /// List of records shaped like `items`.
    #[must_use]
    pub fn array_of(items: SchemaDescriptor) -> Self {
        Self::Array(Box::new(items))
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Array(_) => "ARRAY",
            Self::Object(_) => "OBJECT",
        }
    }
}

/// One named field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Generation guidance for the model. Never used for validation.
    pub description: Option<&'static str>,
    pub required: bool,
}

/// Why a value failed [`SchemaDescriptor::check`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected a JSON object at `{0}`")]
    NotAnObject(String),
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("field `{path}` should be {expected}")]
    WrongKind { path: String, expected: &'static str },
}

/// Object-shaped response schema.
///
/// # Example
///
/// ```rust
/// use dev_toolbox::completion::schema::{FieldKind, SchemaDescriptor};
///
/// let schema = SchemaDescriptor::object()
///     .field("score", FieldKind::Number, "A risk score from 0 to 100.")
///     .field("analysis", FieldKind::String, "A brief analysis.");
///
/// assert!(schema.check(&serde_json::json!({"score": 12, "analysis": "ok"})).is_ok());
/// assert!(schema.check(&serde_json::json!({"score": "high"})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDescriptor {
    fields: Vec<Field>,
}

impl SchemaDescriptor {
    /// Empty object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    /// Add a required field with a description.
    #[must_use]
    pub fn field(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(Field {
            name,
            kind,
            description: Some(description),
            required: true,
        });
        self
    }

    /// Add a required field without a description.
    #[must_use]
    pub fn bare_field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(Field {
            name,
            kind,
            description: None,
            required: true,
        });
        self
    }

    /// Add a field the model may omit.
    #[must_use]
    pub fn optional_field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(Field {
            name,
            kind,
            description: None,
            required: false,
        });
        self
    }

    /// Render as the service's `responseSchema` (OpenAPI subset).
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(field.kind.type_name()));
            if let Some(desc) = field.description {
                prop.insert("description".into(), json!(desc));
            }
            match &field.kind {
                FieldKind::Array(items) => {
                    prop.insert("items".into(), items.to_wire());
                }
                FieldKind::Object(inner) => {
                    let inner = inner.to_wire();
                    if let Value::Object(inner) = inner {
                        prop.extend(inner.into_iter().filter(|(k, _)| k != "type"));
                    }
                }
                _ => {}
            }
            properties.insert(field.name.to_string(), Value::Object(prop));
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = json!({
            "type": "OBJECT",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Verify the top-level shape of a parsed response.
    ///
    /// Required fields must be present, present fields must have the
    /// declared kind, and array items are checked recursively. Extra fields
    /// are ignored.
    pub fn check(&self, value: &Value) -> Result<(), ShapeError> {
        self.check_at(value, "$")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), ShapeError> {
        let Some(obj) = value.as_object() else {
            return Err(ShapeError::NotAnObject(path.to_string()));
        };

        for field in &self.fields {
            let field_path = format!("{path}.{}", field.name);
            match obj.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(ShapeError::MissingField(field_path));
                    }
                }
                Some(v) => check_kind(&field.kind, v, &field_path)?,
            }
        }
        Ok(())
    }
}

fn check_kind(kind: &FieldKind, value: &Value, path: &str) -> Result<(), ShapeError> {
    let wrong = |expected| ShapeError::WrongKind {
        path: path.to_string(),
        expected,
    };

    match kind {
        FieldKind::String => value.is_string().then_some(()).ok_or_else(|| wrong("a string")),
        FieldKind::Number => value.is_number().then_some(()).ok_or_else(|| wrong("a number")),
        FieldKind::Boolean => value.is_boolean().then_some(()).ok_or_else(|| wrong("a boolean")),
        FieldKind::Object(inner) => inner.check_at(value, path),
        FieldKind::Array(items) => {
            let arr = value.as_array().ok_or_else(|| wrong("an array"))?;
            for (idx, item) in arr.iter().enumerate() {
                items.check_at(item, &format!("{path}[{idx}]"))?;
            }
            Ok(())
        }
    }
}
