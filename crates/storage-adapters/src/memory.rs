//! # MemoryGateway
//!
//! An in-process stand-in for the hosted backend. Tables are vectors of JSON
//! rows keyed by name; objects are kept whole. Used by the integration tests
//! and by the CLI's offline mode.
//!
//! Filter, order and window semantics follow the REST adapter: equality and
//! `IN` filters, a single order column, offset then limit.

use std::cmp::Ordering;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use domains::{AppError, Filter, MediaStore, Query, Result, RowStore};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

/// A stored object and its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

pub struct MemoryGateway {
    tables: DashMap<String, Vec<Value>>,
    objects: DashMap<(String, String), StoredObject>,
    /// Tables (or buckets) that answer every request with a gateway error.
    failing: DashMap<String, String>,
    public_base: String,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

impl MemoryGateway {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            tables: DashMap::new(),
            objects: DashMap::new(),
            failing: DashMap::new(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Appends rows to `table` as-is.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.get(table).map(|t| t.clone()).unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects.get(&(bucket.to_string(), path.to_string())).map(|o| o.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Makes every request against `table` (or a bucket of that name) fail with `message` until
    /// [`heal`](Self::heal) is called.
    pub fn fail_table(&self, table: &str, message: &str) {
        self.failing.insert(table.to_string(), message.to_string());
    }

    pub fn heal(&self, table: &str) {
        self.failing.remove(table);
    }

    fn check(&self, table: &str) -> Result<()> {
        match self.failing.get(table) {
            Some(message) => Err(AppError::Gateway { status: 503, message: message.clone() }),
            None => Ok(()),
        }
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| match f {
        Filter::Eq(column, value) => row.get(column) == Some(value),
        Filter::In(column, values) => row.get(column).is_some_and(|v| values.contains(v)),
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().unwrap_or_default().total_cmp(&y.as_f64().unwrap_or_default())
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        // Missing and null sort last, as the REST dialect does by default.
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Greater,
        (_, Some(Value::Null) | None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns {
        if let Some(v) = row.get(column) {
            out.insert(column.clone(), v.clone());
        }
    }
    Value::Object(out)
}

#[async_trait]
impl RowStore for MemoryGateway {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.check(&query.table)?;
        let mut rows: Vec<Value> = self
            .tables
            .get(&query.table)
            .map(|t| t.iter().filter(|r| matches(r, &query.filters)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }

        let (offset, limit) = query.range.map_or((0, usize::MAX), |r| (r.offset, r.limit));
        let rows: Vec<Value> = rows
            .iter()
            .skip(offset)
            .take(limit)
            .map(|r| project(r, &query.columns))
            .collect();
        debug!(table = %query.table, count = rows.len(), "memory select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.check(table)?;
        let Value::Object(mut fields) = row else {
            return Err(AppError::ValidationError("row must be a JSON object".into()));
        };
        fields.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields.entry("created_at").or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        let row = Value::Object(fields);
        self.tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        self.check(table)?;
        if filters.is_empty() {
            return Err(AppError::ValidationError("refusing to update without a filter".into()));
        }
        let Value::Object(patch) = patch else {
            return Err(AppError::ValidationError("patch must be a JSON object".into()));
        };
        let mut updated = Vec::new();
        if let Some(mut rows) = self.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches(r, filters)) {
                if let Value::Object(fields) = row {
                    for (k, v) in &patch {
                        fields.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        self.check(table)?;
        if filters.is_empty() {
            return Err(AppError::ValidationError("refusing to delete without a filter".into()));
        }
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches(r, filters));
        Ok(before - rows.len())
    }
}

#[async_trait]
impl MediaStore for MemoryGateway {
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.check(bucket)?;
        let key = (bucket.to_string(), path.to_string());
        if self.objects.contains_key(&key) {
            return Err(AppError::Gateway { status: 409, message: "The resource already exists".into() });
        }
        self.objects.insert(key, StoredObject { body, content_type: content_type.to_string() });
        Ok(())
    }

    async fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(format!("{}/{bucket}/{path}", self.public_base))
    }
}
