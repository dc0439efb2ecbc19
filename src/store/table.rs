//! Typed handle to one logical table.

use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::{Database, Record, StoreError};

/// Upsert/get/delete/list/query over one record type.
///
/// Cloning is cheap: clones share the same database connection.
pub struct Table<T> {
    db: Arc<Database>,
    name: Arc<str>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            name: Arc::clone(&self.name),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl<T: Record> Table<T> {
    pub(super) fn new(db: Arc<Database>, name: &str) -> Self {
        Self {
            db,
            name: Arc::from(name),
            _record: PhantomData,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database this table lives in
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Insert or fully replace the record with the same id
    pub fn put(&self, record: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)?;

        self.db.connection()?.execute(
            &format!(
                "INSERT INTO {} (id, body) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                self.name
            ),
            params![record.id(), body],
        )?;

        Ok(())
    }

    /// Get a record by id
    pub fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let body: Option<String> = self
            .db
            .connection()?
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?1", self.name),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
            .transpose()
    }

    /// Remove a record; returns whether one existed
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.db.connection()?.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.name),
            params![id],
        )?;

        Ok(removed > 0)
    }

    /// All records, ordered by id
    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        self.select(&format!("SELECT body FROM {} ORDER BY id", self.name), &[])
    }

    /// Records whose top-level `field` equals `value`
    pub fn query(&self, field: &str, value: impl Into<Value>) -> Result<Vec<T>, StoreError> {
        let path = SqlValue::Text(format!("$.{}", field));
        let value = to_sql_value(value.into());

        self.select(
            &format!(
                "SELECT body FROM {} WHERE json_extract(body, ?1) = ?2 ORDER BY id",
                self.name
            ),
            &[path, value],
        )
    }

    fn select(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<T>, StoreError> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(sql)?;

        let bodies = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(StoreError::from))
            .collect()
    }
}

/// `json_extract` yields SQL scalars, with JSON booleans as 0/1
fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}
