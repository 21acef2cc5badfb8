use chrono::{DateTime, NaiveDate, NaiveTime};
use conduit_types::ValidationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declarative description of a data shape consumed or produced by a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<SchemaField>,
    /// Schemas referenced by composite fields, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested_schemas: BTreeMap<String, SchemaDefinition>,
}

impl SchemaDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            fields: Vec::new(),
            nested_schemas: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_nested(mut self, name: impl Into<String>, schema: SchemaDefinition) -> Self {
        self.nested_schemas.insert(name.into(), schema);
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields flagged as keys, in declaration order.
    pub fn key_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|f| f.is_key)
    }

    /// Checks `data` against this schema, collecting every violation.
    ///
    /// An object is validated as one record; an array is validated
    /// element-wise, each element being a record.
    pub fn validate(&self, data: &Value) -> ValidationResult {
        let mut result = ValidationResult::success();
        match data {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.validate_record(self, &format!("[{i}]"), item, &mut result);
                }
            }
            _ => self.validate_record(self, "", data, &mut result),
        }
        result
    }

    fn validate_record(
        &self,
        root: &SchemaDefinition,
        path: &str,
        record: &Value,
        result: &mut ValidationResult,
    ) {
        let Some(object) = record.as_object() else {
            let property = if path.is_empty() { "$" } else { path };
            result.add(
                property,
                format!("expected an object for schema '{}'", self.name),
            );
            return;
        };

        for field in &self.fields {
            let property = join_path(path, &field.name);
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        result.add(property, "required field is missing");
                    }
                }
                Some(value) => {
                    if !field.field_type.accepts(value) {
                        result.add(
                            property.clone(),
                            format!("expected {}", field.field_type.label()),
                        );
                        continue;
                    }
                    if let Some(nested_name) = &field.nested_schema {
                        self.validate_nested(root, nested_name, &property, value, result);
                    }
                }
            }
        }
    }

    fn validate_nested(
        &self,
        root: &SchemaDefinition,
        nested_name: &str,
        property: &str,
        value: &Value,
        result: &mut ValidationResult,
    ) {
        let nested = self
            .nested_schemas
            .get(nested_name)
            .or_else(|| root.nested_schemas.get(nested_name));
        let Some(nested) = nested else {
            result.add(
                property,
                format!("references unknown nested schema '{nested_name}'"),
            );
            return;
        };
        match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    nested.validate_record(root, &format!("{property}[{i}]"), item, result);
                }
            }
            _ => nested.validate_record(root, property, value, result),
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// One field of a [`SchemaDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_key: bool,
    /// Name of the nested schema describing this field's elements.
    /// Only meaningful for `Object` and `Array` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            is_key: false,
            nested_schema: None,
            description: None,
        }
    }

    /// Shorthand for a text field.
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn decimal(name: &str) -> Self {
        Self::new(name, FieldType::Decimal)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn datetime(name: &str) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    pub fn time(name: &str) -> Self {
        Self::new(name, FieldType::Time)
    }

    pub fn binary(name: &str) -> Self {
        Self::new(name, FieldType::Binary)
    }

    /// An object field whose shape is described by the named nested schema.
    pub fn object(name: &str, nested_schema: &str) -> Self {
        Self {
            nested_schema: Some(nested_schema.into()),
            ..Self::new(name, FieldType::Object)
        }
    }

    /// An array field; with `nested_schema` every element must match it.
    pub fn array(name: &str, nested_schema: Option<&str>) -> Self {
        Self {
            nested_schema: nested_schema.map(Into::into),
            ..Self::new(name, FieldType::Array)
        }
    }

    pub fn custom(name: &str) -> Self {
        Self::new(name, FieldType::Custom)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as (part of) the record key. Key fields are required.
    #[must_use]
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The data type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Boolean,
    /// `YYYY-MM-DD` text.
    Date,
    /// RFC 3339 text.
    DateTime,
    /// `HH:MM:SS` text, optional fractional seconds.
    Time,
    /// Text (e.g. base64) or an array of byte values.
    Binary,
    Array,
    Object,
    /// Binding-defined; any value is accepted.
    Custom,
}

impl FieldType {
    /// Whether a (non-null) JSON value conforms to this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Decimal => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            Self::DateTime => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            Self::Time => value
                .as_str()
                .is_some_and(|s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok()),
            Self::Binary => match value {
                Value::String(_) => true,
                Value::Array(items) => items
                    .iter()
                    .all(|b| b.as_u64().is_some_and(|n| n <= u64::from(u8::MAX))),
                _ => false,
            },
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Custom => true,
        }
    }

    /// Lower-case name used in validation messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Time => "time",
            Self::Binary => "binary",
            Self::Array => "array",
            Self::Object => "object",
            Self::Custom => "custom value",
        }
    }
}
