//! Column values and query result rows.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};
use crate::schema::{DataValueType, EntitySchema};

/// A typed column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnValue {
    #[default]
    Null,
    Text(String),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl ColumnValue {
    /// Short name of the stored kind, used in type errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Guid(_) => "guid",
            Self::DateTime(_) => "date_time",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a JSON value into a value of the given column type.
    ///
    /// Lookup columns take the referenced row's identifier.
    pub fn from_json(
        column: &str,
        value: &serde_json::Value,
        data_value_type: DataValueType,
    ) -> ReportResult<Self> {
        use serde_json::Value;

        let invalid = |expected: &str| {
            ReportError::invalid_value(column, format!("expected {expected}, got {value}"))
        };

        if value.is_null() {
            return Ok(Self::Null);
        }

        match data_value_type {
            DataValueType::Guid | DataValueType::Lookup => {
                let s = value.as_str().ok_or_else(|| invalid("uuid string"))?;
                Uuid::parse_str(s)
                    .map(Self::Guid)
                    .map_err(|e| ReportError::invalid_value(column, e.to_string()))
            }
            DataValueType::Text => match value {
                Value::String(s) => Ok(Self::Text(s.clone())),
                Value::Number(n) => Ok(Self::Text(n.to_string())),
                Value::Bool(b) => Ok(Self::Text(b.to_string())),
                _ => Err(invalid("string")),
            },
            DataValueType::Integer => value
                .as_i64()
                .map(Self::Integer)
                .ok_or_else(|| invalid("integer")),
            DataValueType::Float => value
                .as_f64()
                .map(Self::Float)
                .ok_or_else(|| invalid("number")),
            DataValueType::Boolean => value
                .as_bool()
                .map(Self::Boolean)
                .ok_or_else(|| invalid("boolean")),
            DataValueType::DateTime => {
                let s = value.as_str().ok_or_else(|| invalid("RFC 3339 string"))?;
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|e| ReportError::invalid_value(column, e.to_string()))
            }
        }
    }

    /// Compare two values of compatible kinds.
    ///
    /// Returns `None` when either side is null or the kinds differ.
    /// Integers and floats compare numerically.
    pub fn compare(&self, other: &ColumnValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Guid(a), Self::Guid(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Guid(g) => write!(f, "{g}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Uuid> for ColumnValue {
    fn from(g: Uuid) -> Self {
        Self::Guid(g)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<i64> for ColumnValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for ColumnValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for ColumnValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

// =============================================================================
// Typed reads
// =============================================================================

/// Conversion from a stored column value into a Rust type.
///
/// Null maps to the type's zero value so raw nulls never reach a record:
/// empty string, nil uuid, Unix epoch, `0`, `false`.
pub trait FromColumnValue: Sized {
    const EXPECTED: DataValueType;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self>;
}

fn type_error(column: &str, expected: DataValueType, value: &ColumnValue) -> ReportError {
    ReportError::ColumnType {
        column: column.to_string(),
        expected,
        found: value.kind_name(),
    }
}

impl FromColumnValue for String {
    const EXPECTED: DataValueType = DataValueType::Text;

    /// Any scalar renders through its display form.
    fn from_column_value(_column: &str, value: &ColumnValue) -> ReportResult<Self> {
        Ok(value.to_string())
    }
}

impl FromColumnValue for Uuid {
    const EXPECTED: DataValueType = DataValueType::Guid;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self> {
        match value {
            ColumnValue::Null => Ok(Uuid::nil()),
            ColumnValue::Guid(g) => Ok(*g),
            other => Err(type_error(column, Self::EXPECTED, other)),
        }
    }
}

impl FromColumnValue for DateTime<Utc> {
    const EXPECTED: DataValueType = DataValueType::DateTime;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self> {
        match value {
            ColumnValue::Null => Ok(DateTime::<Utc>::default()),
            ColumnValue::DateTime(dt) => Ok(*dt),
            other => Err(type_error(column, Self::EXPECTED, other)),
        }
    }
}

impl FromColumnValue for i64 {
    const EXPECTED: DataValueType = DataValueType::Integer;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self> {
        match value {
            ColumnValue::Null => Ok(0),
            ColumnValue::Integer(n) => Ok(*n),
            other => Err(type_error(column, Self::EXPECTED, other)),
        }
    }
}

impl FromColumnValue for f64 {
    const EXPECTED: DataValueType = DataValueType::Float;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self> {
        match value {
            ColumnValue::Null => Ok(0.0),
            ColumnValue::Float(n) => Ok(*n),
            ColumnValue::Integer(n) => Ok(*n as f64),
            other => Err(type_error(column, Self::EXPECTED, other)),
        }
    }
}

impl FromColumnValue for bool {
    const EXPECTED: DataValueType = DataValueType::Boolean;

    fn from_column_value(column: &str, value: &ColumnValue) -> ReportResult<Self> {
        match value {
            ColumnValue::Null => Ok(false),
            ColumnValue::Boolean(b) => Ok(*b),
            other => Err(type_error(column, Self::EXPECTED, other)),
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One row returned by a query, keyed by column value name.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    values: HashMap<String, ColumnValue>,
}

impl Entity {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
        }
    }

    /// Schema of the query's root entity.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn set_column_value(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with_column_value(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.set_column_value(name, value);
        self
    }

    /// Raw value of a column the query produced.
    pub fn get_column_value(&self, name: &str) -> ReportResult<&ColumnValue> {
        self.values
            .get(name)
            .ok_or_else(|| ReportError::column_not_found(&self.schema.name, name))
    }

    /// Typed value of a column the query produced.
    pub fn get_typed_column_value<T: FromColumnValue>(&self, name: &str) -> ReportResult<T> {
        T::from_column_value(name, self.get_column_value(name)?)
    }
}

/// Ordered rows returned by one query.
#[derive(Debug, Clone, Default)]
pub struct EntityCollection(Vec<Entity>);

impl EntityCollection {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self(entities)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for EntityCollection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
