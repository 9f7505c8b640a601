//! Parameterized read/write requests understood by the data-access actor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row as a JSON object keyed by column name (plus any embedded relations).
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// SQL `LIKE`; the value carries its own `%` wildcards.
    Like,
    IsNull,
    NotNull,
    /// Value must be a JSON array.
    In,
}

impl FilterOp {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Neq => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Like => "LIKE",
            FilterOp::IsNull => "IS NULL",
            FilterOp::NotNull => "IS NOT NULL",
            FilterOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub column: String,
    pub descending: bool,
}

/// Read request: table, column filters (AND-ed), one ordering column and
/// shallow embeds across declared foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order: Option<Ordering>,
    /// Relation aliases (e.g. `customer`) to embed into each row.
    #[serde(default)]
    pub embeds: Vec<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
            embeds: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Eq, value))
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Neq, value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gte, value))
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lt, value))
    }

    pub fn like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::new(column, FilterOp::Like, pattern.into()))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::new(column, FilterOp::IsNull, Value::Null))
    }

    pub fn in_list<V: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(Filter::new(column, FilterOp::In, Value::Array(values)))
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Ordering {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn embed(mut self, alias: &str) -> Self {
        self.embeds.push(alias.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Write request. Every variant returns the affected rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Write {
    /// Insert one row. `id`, timestamps and any code sequence are filled in
    /// by the backend when absent.
    Insert { table: String, row: Row },
    /// Insert, or return the existing row matching `on_conflict` unchanged.
    Upsert {
        table: String,
        row: Row,
        on_conflict: Vec<String>,
    },
    /// Patch every row matching `filters`. At least one filter is required.
    /// With `must_match`, zero matched rows is an error, which rolls back the
    /// enclosing batch.
    Update {
        table: String,
        filters: Vec<Filter>,
        patch: Row,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        must_match: bool,
    },
    /// Delete every row matching `filters`. At least one filter is required.
    Delete { table: String, filters: Vec<Filter> },
}

impl Write {
    pub fn insert(table: &str, row: Row) -> Self {
        Write::Insert {
            table: table.to_string(),
            row,
        }
    }

    pub fn upsert(table: &str, row: Row, on_conflict: &[&str]) -> Self {
        Write::Upsert {
            table: table.to_string(),
            row,
            on_conflict: on_conflict.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn update_by_id(table: &str, id: &str, patch: Row) -> Self {
        Self::update_where(table, vec![Filter::eq("id", id)], patch)
    }

    pub fn update_where(table: &str, filters: Vec<Filter>, patch: Row) -> Self {
        Write::Update {
            table: table.to_string(),
            filters,
            patch,
            must_match: false,
        }
    }

    /// Turn an update into a guarded one: matching no row fails the write.
    pub fn must_match(self) -> Self {
        match self {
            Write::Update {
                table,
                filters,
                patch,
                ..
            } => Write::Update {
                table,
                filters,
                patch,
                must_match: true,
            },
            other => other,
        }
    }

    pub fn delete_by_id(table: &str, id: &str) -> Self {
        Write::Delete {
            table: table.to_string(),
            filters: vec![Filter::eq("id", id)],
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Write::Insert { table, .. }
            | Write::Upsert { table, .. }
            | Write::Update { table, .. }
            | Write::Delete { table, .. } => table,
        }
    }
}
