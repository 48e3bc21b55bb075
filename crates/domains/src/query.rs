//! # Row Queries
//!
//! A backend-neutral description of a row query: filters, ordering and an
//! offset/limit window. Adapters translate it into their own dialect.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::In(column, _) => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Offset/limit window. Page N of size L is `Range { offset: N * L, limit: L }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Column list; `*` when empty.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub range: Option<Range>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self { table: table.into(), columns: Vec::new(), filters: Vec::new(), order: None, range: None }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(column.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.range = Some(Range { offset, limit });
        self
    }

    /// Comma-joined column list as the REST dialect expects it.
    pub fn column_list(&self) -> String {
        if self.columns.is_empty() { "*".to_string() } else { self.columns.join(",") }
    }
}
