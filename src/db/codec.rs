//! JSON <-> SQLite value conversion, driven by the declared column kinds.

use super::query::Row;
use super::schema::{Column, ColumnKind, TableDef};
use crate::error::OpsError;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};
use sqlx::Row as _;
use sqlx::Sqlite;
use sqlx::sqlite::{SqliteArguments, SqliteRow};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub(crate) fn bind(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn encode(
    table: &TableDef,
    column: &Column,
    value: &Value,
) -> Result<SqlValue, OpsError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    let invalid = |reason: &str| OpsError::InvalidValue {
        table: table.name.to_string(),
        column: column.name.to_string(),
        reason: reason.to_string(),
    };

    match column.kind {
        ColumnKind::Text => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
            Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
            _ => Err(invalid("expected a string")),
        },
        ColumnKind::Integer => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| invalid("expected an integer")),
        ColumnKind::Real => value
            .as_f64()
            .map(SqlValue::Real)
            .ok_or_else(|| invalid("expected a number")),
        ColumnKind::Bool => match value {
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) if matches!(n.as_i64(), Some(0 | 1)) => {
                Ok(SqlValue::Integer(n.as_i64().unwrap_or_default()))
            }
            _ => Err(invalid("expected a boolean")),
        },
        ColumnKind::Timestamp => {
            let raw = value
                .as_str()
                .ok_or_else(|| invalid("expected an RFC3339 timestamp"))?;
            let ts = DateTime::parse_from_rfc3339(raw).map_err(|e| invalid(&e.to_string()))?;
            Ok(SqlValue::Text(
                ts.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ))
        }
        ColumnKind::Date => {
            let raw = value
                .as_str()
                .ok_or_else(|| invalid("expected a YYYY-MM-DD date"))?;
            let date =
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| invalid(&e.to_string()))?;
            Ok(SqlValue::Text(date.format("%Y-%m-%d").to_string()))
        }
    }
}

pub(crate) fn decode_row(table: &TableDef, row: &SqliteRow) -> Result<Row, OpsError> {
    let mut out = Row::new();
    for column in table.columns {
        let name = column.name;
        let value = match column.kind {
            ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Date => row
                .try_get::<Option<String>, _>(name)?
                .map_or(Value::Null, Value::String),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(name)?
                .map_or(Value::Null, Value::from),
            ColumnKind::Real => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            ColumnKind::Bool => row
                .try_get::<Option<bool>, _>(name)?
                .map_or(Value::Null, Value::Bool),
        };
        out.insert(name.to_string(), value);
    }
    Ok(out)
}
