// Per-resource serializers. A Schema projects a stored record into its
// JSON wire form, optionally restricted to a client-selected field subset.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use super::ColumnDef;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("fields parameter must name at least one column")]
    EmptySelection,

    #[error("unknown field '{field}' for resource {resource}")]
    UnknownField { resource: &'static str, field: String },
}

/// Serializer for one resource. Emits columns in declaration order and
/// fills absent values with null so every record carries the full shape.
#[derive(Clone, Debug)]
pub struct Schema {
    columns: Vec<&'static str>,
}

impl Schema {
    pub(crate) fn for_columns(columns: &'static [ColumnDef]) -> Self {
        Self { columns: columns.iter().map(|c| c.name).collect() }
    }

    pub fn column_names(&self) -> &[&'static str] {
        &self.columns
    }

    /// Serialize a single record.
    pub fn project(&self, record: &Map<String, Value>, fields: Option<&FieldSelection>) -> Value {
        let mut out = Map::new();
        for &column in &self.columns {
            if let Some(selection) = fields {
                if !selection.contains(column) {
                    continue;
                }
            }
            out.insert(column.to_string(), record.get(column).cloned().unwrap_or(Value::Null));
        }
        Value::Object(out)
    }

    /// Serialize a list of records as a JSON array.
    pub fn project_all(&self, records: &[Map<String, Value>], fields: Option<&FieldSelection>) -> Value {
        Value::Array(records.iter().map(|r| self.project(r, fields)).collect())
    }
}

/// Parsed `?fields=a,b` query parameter, validated against a schema.
#[derive(Clone, Debug)]
pub struct FieldSelection {
    names: HashSet<String>,
}

impl FieldSelection {
    /// Parse a comma-separated field list. Blank entries are skipped;
    /// an entirely blank parameter or an unknown column is an error.
    pub fn parse(raw: &str, resource: &'static str, schema: &Schema) -> Result<Self, SchemaError> {
        let mut names = HashSet::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !schema.column_names().iter().any(|&c| c == part) {
                return Err(SchemaError::UnknownField { resource, field: part.to_string() });
            }
            names.insert(part.to_string());
        }
        if names.is_empty() {
            return Err(SchemaError::EmptySelection);
        }
        Ok(Self { names })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.names.contains(column)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::Registry;

    fn stories_schema() -> Schema {
        let registry = Registry::builtin().unwrap();
        registry.get("stories").unwrap().schema.clone()
    }

    fn record(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn projects_all_columns_with_null_fill() {
        let schema = stories_schema();
        let rec = record(&[("id", json!(1)), ("title", json!("Launch Day"))]);

        let out = schema.project(&rec, None);
        assert_eq!(out, json!({"id": 1, "title": "Launch Day", "content": null}));
    }

    #[test]
    fn projects_selected_subset_only() {
        let schema = stories_schema();
        let rec = record(&[("id", json!(1)), ("title", json!("Launch Day")), ("content", json!("body"))]);

        let selection = FieldSelection::parse("title", "Stories", &schema).unwrap();
        let out = schema.project(&rec, Some(&selection));
        assert_eq!(out, json!({"title": "Launch Day"}));
    }

    #[test]
    fn selection_handles_whitespace_and_duplicates() {
        let schema = stories_schema();
        let selection = FieldSelection::parse(" title , content ,title", "Stories", &schema).unwrap();
        assert!(selection.contains("title"));
        assert!(selection.contains("content"));
        assert!(!selection.contains("id"));
    }

    #[test]
    fn rejects_unknown_field() {
        let schema = stories_schema();
        let err = FieldSelection::parse("title,author", "Stories", &schema).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { field, .. } if field == "author"));
    }

    #[test]
    fn rejects_blank_selection() {
        let schema = stories_schema();
        assert!(matches!(
            FieldSelection::parse(" , ", "Stories", &schema),
            Err(SchemaError::EmptySelection)
        ));
    }

    #[test]
    fn projects_list() {
        let schema = stories_schema();
        let rows = vec![
            record(&[("id", json!(1)), ("title", json!("a"))]),
            record(&[("id", json!(2)), ("title", json!("b")), ("content", json!("c"))]),
        ];
        let out = schema.project_all(&rows, None);
        assert_eq!(
            out,
            json!([
                {"id": 1, "title": "a", "content": null},
                {"id": 2, "title": "b", "content": "c"},
            ])
        );
    }
}
