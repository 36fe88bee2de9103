use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::database::manager::DatabaseError;
use crate::database::record::{BindValue, NewRecord};
use crate::resource::{ColumnType, ResourceDef};

/// Generic data access for one resource. SQL identifiers come from the
/// validated static registry; all request-supplied values are bound.
pub struct Repository<'a> {
    resource: &'a ResourceDef,
    pool: &'a SqlitePool,
}

impl<'a> Repository<'a> {
    pub fn new(resource: &'a ResourceDef, pool: &'a SqlitePool) -> Self {
        Self { resource, pool }
    }

    /// Fetch every record, ordered by id.
    pub async fn select_all(&self) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" ORDER BY \"id\"",
            self.column_list(),
            self.resource.table
        );
        let rows = sqlx::query(&sql).fetch_all(self.pool).await?;
        rows.iter().map(|row| self.row_to_record(row)).collect()
    }

    /// Fetch one record by primary key.
    pub async fn select_by_id(&self, id: i64) -> Result<Option<Map<String, Value>>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE \"id\" = ?",
            self.column_list(),
            self.resource.table
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool).await?;
        row.map(|r| self.row_to_record(&r)).transpose()
    }

    /// Insert a validated record and return the stored row.
    pub async fn insert(&self, record: NewRecord) -> Result<Map<String, Value>, DatabaseError> {
        let result = if record.is_empty() {
            let sql = format!("INSERT INTO \"{}\" DEFAULT VALUES", self.resource.table);
            sqlx::query(&sql).execute(self.pool).await?
        } else {
            let columns: Vec<String> =
                record.columns().iter().map(|c| format!("\"{}\"", c)).collect();
            let placeholders = vec!["?"; record.columns().len()].join(", ");
            let sql = format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                self.resource.table,
                columns.join(", "),
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for value in record.values() {
                query = match value {
                    BindValue::Null => query.bind(None::<String>),
                    BindValue::Integer(n) => query.bind(*n),
                    BindValue::Text(s) => query.bind(s.clone()),
                };
            }
            query.execute(self.pool).await?
        };

        let id = result.last_insert_rowid();
        self.select_by_id(id).await?.ok_or_else(|| {
            DatabaseError::QueryError(format!(
                "inserted row {} missing from {}",
                id, self.resource.table
            ))
        })
    }

    /// Delete one record by primary key. Returns whether a row existed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = ?", self.resource.table);
        let result = sqlx::query(&sql).bind(id).execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    fn column_list(&self) -> String {
        self.resource
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Decode a row into a JSON map according to declared column types.
    fn row_to_record(&self, row: &SqliteRow) -> Result<Map<String, Value>, DatabaseError> {
        let mut record = Map::with_capacity(self.resource.columns.len());
        for col in self.resource.columns {
            let value = match col.ty {
                ColumnType::Integer => row
                    .try_get::<Option<i64>, _>(col.name)?
                    .map(|n| Value::Number(Number::from(n)))
                    .unwrap_or(Value::Null),
                ColumnType::Text => row
                    .try_get::<Option<String>, _>(col.name)?
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            };
            record.insert(col.name.to_string(), value);
        }
        Ok(record)
    }
}
