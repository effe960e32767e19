//! Filter AST - predicates attached to entity schema queries.
//!
//! Filters reference columns by dotted path relative to the query's root
//! schema (`Name`, `Owner.Id`, `Country.Name`).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::query::SubQueryExpression;
use super::value::ColumnValue;

// =============================================================================
// Filter AST
// =============================================================================

/// A query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column path compared to a value: `[Country.Name] = 'Kenya'`
    Compare {
        column: String,
        comparison: ComparisonType,
        value: ColumnValue,
    },

    /// Membership: `[Id] IN (...)`
    In {
        column: String,
        values: Vec<ColumnValue>,
        negated: bool,
    },

    /// `[Phone] IS NULL` / `IS NOT NULL`
    IsNull { column: String, negated: bool },

    /// Logical group of filters
    Group(FilterGroup),

    /// Negation
    Not(Box<Filter>),

    /// Correlated existence test against a referenced schema.
    ///
    /// Holds when at least one row of the sub-query's schema is referenced
    /// by the outer row and passes the sub-query's filters.
    Exists {
        expression: Box<SubQueryExpression>,
        negated: bool,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    #[default]
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    // Text only
    Contain,
    StartWith,
    EndWith,
}

impl ComparisonType {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Contain => "CONTAINS",
            Self::StartWith => "STARTS WITH",
            Self::EndWith => "ENDS WITH",
        }
    }
}

/// Logical operator of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperation {
    #[default]
    And,
    Or,
}

/// A list of filters joined by one logical operator.
///
/// An empty group matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct FilterGroup {
    pub logical: LogicalOperation,
    pub items: Vec<Filter>,
}

impl FilterGroup {
    pub fn new(logical: LogicalOperation) -> Self {
        Self {
            logical,
            items: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(LogicalOperation::And)
    }

    pub fn or() -> Self {
        Self::new(LogicalOperation::Or)
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.items.push(filter);
        self
    }

    pub fn add(&mut self, filter: Filter) {
        self.items.push(filter);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Filter {
    /// Existence sub-filter over a sub-query expression.
    pub fn exists(expression: SubQueryExpression) -> Self {
        Filter::Exists {
            expression: Box::new(expression),
            negated: false,
        }
    }

    pub fn not_exists(expression: SubQueryExpression) -> Self {
        Filter::Exists {
            expression: Box::new(expression),
            negated: true,
        }
    }

    /// Column paths this filter reads from its own query's schema.
    ///
    /// Paths inside existence sub-queries belong to the sub-query schema
    /// and are not included; the correlating path is.
    pub fn column_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::Compare { column, .. }
            | Filter::In { column, .. }
            | Filter::IsNull { column, .. } => out.push(column),
            Filter::Group(group) => group.iter().for_each(|f| f.collect_paths(out)),
            Filter::Not(inner) => inner.collect_paths(out),
            Filter::Exists { expression, .. } => out.push(&expression.column_path),
        }
    }
}

// =============================================================================
// Builder DSL
// =============================================================================

/// A column path awaiting a comparison.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct FilterColumn {
    path: String,
}

/// Start a filter on a column path.
pub fn column(path: &str) -> FilterColumn {
    FilterColumn { path: path.into() }
}

impl FilterColumn {
    fn compare(self, comparison: ComparisonType, value: impl Into<ColumnValue>) -> Filter {
        Filter::Compare {
            column: self.path,
            comparison,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::Equal, value)
    }

    pub fn ne(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::NotEqual, value)
    }

    pub fn lt(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::Less, value)
    }

    pub fn lte(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::LessOrEqual, value)
    }

    pub fn gt(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::Greater, value)
    }

    pub fn gte(self, value: impl Into<ColumnValue>) -> Filter {
        self.compare(ComparisonType::GreaterOrEqual, value)
    }

    pub fn contains(self, value: &str) -> Filter {
        self.compare(ComparisonType::Contain, value)
    }

    pub fn starts_with(self, value: &str) -> Filter {
        self.compare(ComparisonType::StartWith, value)
    }

    pub fn ends_with(self, value: &str) -> Filter {
        self.compare(ComparisonType::EndWith, value)
    }

    pub fn is_in<V: Into<ColumnValue>>(self, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::In {
            column: self.path,
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<V: Into<ColumnValue>>(self, values: impl IntoIterator<Item = V>) -> Filter {
        Filter::In {
            column: self.path,
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    pub fn is_null(self) -> Filter {
        Filter::IsNull {
            column: self.path,
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Filter {
        Filter::IsNull {
            column: self.path,
            negated: true,
        }
    }
}

/// Combinators for filters.
pub trait FilterExt: Sized {
    fn and(self, other: Filter) -> Filter;
    fn or(self, other: Filter) -> Filter;
    fn not(self) -> Filter;
}

impl FilterExt for Filter {
    /// Joins into an existing AND group instead of nesting.
    fn and(self, other: Filter) -> Filter {
        match self {
            Filter::Group(group) if group.logical == LogicalOperation::And => {
                Filter::Group(group.with(other))
            }
            first => Filter::Group(FilterGroup::and().with(first).with(other)),
        }
    }

    fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Group(group) if group.logical == LogicalOperation::Or => {
                Filter::Group(group.with(other))
            }
            first => Filter::Group(FilterGroup::or().with(first).with(other)),
        }
    }

    fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }
}

impl From<FilterGroup> for Filter {
    fn from(group: FilterGroup) -> Self {
        Filter::Group(group)
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn fmt_literal(f: &mut fmt::Formatter<'_>, value: &ColumnValue) -> fmt::Result {
    match value {
        ColumnValue::Null => f.write_str("NULL"),
        ColumnValue::Integer(_) | ColumnValue::Float(_) | ColumnValue::Boolean(_) => {
            write!(f, "{value}")
        }
        ColumnValue::Text(_) | ColumnValue::Guid(_) | ColumnValue::DateTime(_) => {
            write!(f, "'{}'", value.to_string().replace('\'', "''"))
        }
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.as_slice() {
            [] => f.write_str("TRUE"),
            [single] => write!(f, "{single}"),
            items => {
                let sep = match self.logical {
                    LogicalOperation::And => " AND ",
                    LogicalOperation::Or => " OR ",
                };
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare {
                column,
                comparison,
                value,
            } => {
                write!(f, "[{column}] {} ", comparison.symbol())?;
                fmt_literal(f, value)
            }
            Filter::In {
                column,
                values,
                negated,
            } => {
                let op = if *negated { "NOT IN" } else { "IN" };
                write!(f, "[{column}] {op} (")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_literal(f, value)?;
                }
                f.write_str(")")
            }
            Filter::IsNull { column, negated } => {
                let op = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "[{column}] {op}")
            }
            Filter::Group(group) => write!(f, "{group}"),
            Filter::Not(inner) => write!(f, "NOT ({inner})"),
            Filter::Exists {
                expression,
                negated,
            } => {
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(
                    f,
                    "EXISTS({} ON [{}]",
                    expression.schema_name, expression.column_path
                )?;
                if !expression.sub_query.filters.is_empty() {
                    write!(f, " WHERE {}", expression.sub_query.filters)?;
                }
                f.write_str(")")
            }
        }
    }
}
