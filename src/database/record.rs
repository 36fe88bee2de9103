// Validation of incoming record bodies against a resource's columns.
//
// POST bodies are flat JSON objects whose keys map directly to attribute
// column names. Everything is checked up front so the repository only
// ever sees well-typed bind values.

use serde_json::Value;
use thiserror::Error;

use crate::resource::{ColumnType, ResourceDef};

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("field '{0}' is server-generated and cannot be set")]
    ProtectedField(String),

    #[error("unknown field '{field}' for resource {resource}")]
    UnknownField { resource: &'static str, field: String },

    #[error("missing required field '{0}'")]
    MissingRequiredField(String),

    #[error("field '{field}' must be {expected}")]
    InvalidFieldType { field: String, expected: &'static str },
}

/// A value ready to bind into an INSERT statement.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Integer(i64),
    Text(String),
}

/// A validated new record: attribute columns paired with typed values.
#[derive(Debug)]
pub struct NewRecord {
    columns: Vec<&'static str>,
    values: Vec<BindValue>,
}

impl NewRecord {
    /// Validate a JSON body against the resource's attribute columns.
    ///
    /// Rules: the body must be an object; `id` may not be set; keys must
    /// name declared attribute columns; required columns must be present
    /// and non-null; values must match the column type.
    pub fn from_json(resource: &ResourceDef, payload: Value) -> Result<Self, RecordError> {
        let map = match payload {
            Value::Object(map) => map,
            _ => return Err(RecordError::NotAnObject),
        };

        for key in map.keys() {
            if key == "id" {
                return Err(RecordError::ProtectedField(key.clone()));
            }
            if !resource.attribute_columns().iter().any(|c| c.name == key) {
                return Err(RecordError::UnknownField {
                    resource: resource.name,
                    field: key.clone(),
                });
            }
        }

        let mut columns = Vec::with_capacity(map.len());
        let mut values = Vec::with_capacity(map.len());

        for col in resource.attribute_columns() {
            match map.get(col.name) {
                None | Some(Value::Null) if col.required => {
                    return Err(RecordError::MissingRequiredField(col.name.to_string()));
                }
                None => {}
                Some(Value::Null) => {
                    columns.push(col.name);
                    values.push(BindValue::Null);
                }
                Some(value) => {
                    columns.push(col.name);
                    values.push(coerce(col.name, col.ty, value)?);
                }
            }
        }

        Ok(Self { columns, values })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn values(&self) -> &[BindValue] {
        &self.values
    }
}

fn coerce(field: &str, ty: ColumnType, value: &Value) -> Result<BindValue, RecordError> {
    match ty {
        ColumnType::Text => match value {
            Value::String(s) => Ok(BindValue::Text(s.clone())),
            _ => Err(RecordError::InvalidFieldType { field: field.to_string(), expected: "a string" }),
        },
        ColumnType::Integer => match value.as_i64() {
            Some(n) => Ok(BindValue::Integer(n)),
            None => Err(RecordError::InvalidFieldType { field: field.to_string(), expected: "an integer" }),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::Registry;

    fn stories() -> crate::resource::ResourceDef {
        Registry::builtin().unwrap().get("stories").unwrap().clone()
    }

    fn bookmarks() -> crate::resource::ResourceDef {
        Registry::builtin().unwrap().get("bookmarks").unwrap().clone()
    }

    #[test]
    fn accepts_full_payload() {
        let record = NewRecord::from_json(&stories(), json!({"title": "Launch Day", "content": "body"})).unwrap();
        assert_eq!(record.columns(), &["title", "content"]);
        assert_eq!(
            record.values(),
            &[BindValue::Text("Launch Day".to_string()), BindValue::Text("body".to_string())]
        );
    }

    #[test]
    fn optional_column_may_be_omitted() {
        let record = NewRecord::from_json(&stories(), json!({"title": "Launch Day"})).unwrap();
        assert_eq!(record.columns(), &["title"]);
    }

    #[test]
    fn optional_column_may_be_null() {
        let record = NewRecord::from_json(&stories(), json!({"title": "t", "content": null})).unwrap();
        assert_eq!(record.columns(), &["title", "content"]);
        assert_eq!(record.values()[1], BindValue::Null);
    }

    #[test]
    fn empty_body_for_attribute_less_resource() {
        let record = NewRecord::from_json(&bookmarks(), json!({})).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(NewRecord::from_json(&stories(), json!(["title"])).unwrap_err(), RecordError::NotAnObject);
    }

    #[test]
    fn rejects_client_supplied_id() {
        assert_eq!(
            NewRecord::from_json(&stories(), json!({"id": 9, "title": "t"})).unwrap_err(),
            RecordError::ProtectedField("id".to_string())
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let err = NewRecord::from_json(&stories(), json!({"title": "t", "author": "x"})).unwrap_err();
        assert_eq!(err, RecordError::UnknownField { resource: "Stories", field: "author".to_string() });
    }

    #[test]
    fn rejects_missing_required_field() {
        assert_eq!(
            NewRecord::from_json(&stories(), json!({})).unwrap_err(),
            RecordError::MissingRequiredField("title".to_string())
        );
    }

    #[test]
    fn rejects_null_required_field() {
        assert_eq!(
            NewRecord::from_json(&stories(), json!({"title": null})).unwrap_err(),
            RecordError::MissingRequiredField("title".to_string())
        );
    }

    #[test]
    fn rejects_wrong_type() {
        let err = NewRecord::from_json(&stories(), json!({"title": 5})).unwrap_err();
        assert_eq!(err, RecordError::InvalidFieldType { field: "title".to_string(), expected: "a string" });
    }
}
