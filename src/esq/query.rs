//! Entity schema query - a declarative, schema-bound query.
//!
//! A query is scoped to one root schema, selects column paths, and carries
//! a filter group. Executing it is the host's job (see [`QueryExecutor`]).
//!
//! [`QueryExecutor`]: super::QueryExecutor

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::filter::FilterGroup;
use super::value::EntityCollection;
use crate::error::{ReportError, ReportResult};
use crate::host::UserConnection;
use crate::schema::EntitySchema;

// =============================================================================
// Columns
// =============================================================================

/// A selected column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryColumn {
    /// Dotted path relative to the root schema, e.g. `Owner.Id`.
    pub path: String,
    /// Name under which result rows store the value, e.g. `OwnerId`.
    pub name: String,
}

impl QueryColumn {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.into(),
            name: path.replace('.', ""),
        }
    }

    /// First segment of the path.
    pub fn head(&self) -> &str {
        self.path.split('.').next().unwrap_or(&self.path)
    }

    pub fn is_nested(&self) -> bool {
        self.path.contains('.')
    }
}

// =============================================================================
// Sub-queries
// =============================================================================

/// Filter holder of an existence sub-query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubQuery {
    pub filters: FilterGroup,
}

/// A sub-query over the schema referenced by a lookup path.
///
/// For `Owner.Id` on `Activity` the sub-query runs over `Contact`, and a
/// sub-row correlates with an outer row when its primary column equals the
/// outer row's `Owner` reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQueryExpression {
    /// Correlating path on the outer schema.
    pub column_path: String,
    /// Outer lookup column holding the reference.
    pub reference_column: String,
    /// Schema the sub-query runs over.
    pub schema_name: String,
    pub sub_query: SubQuery,
}

// =============================================================================
// Query
// =============================================================================

/// A query bound to one entity schema.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct EntitySchemaQuery {
    root_schema: Arc<EntitySchema>,
    columns: Vec<QueryColumn>,
    pub filters: FilterGroup,
}

impl EntitySchemaQuery {
    /// Create a query scoped to `schema` with no columns and no filters.
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            root_schema: schema,
            columns: Vec::new(),
            filters: FilterGroup::and(),
        }
    }

    pub fn root_schema(&self) -> &Arc<EntitySchema> {
        &self.root_schema
    }

    pub fn columns(&self) -> &[QueryColumn] {
        &self.columns
    }

    /// Select a column path and return its handle.
    ///
    /// Selecting the same path twice returns the existing column.
    pub fn add_column(&mut self, path: &str) -> QueryColumn {
        if let Some(existing) = self.columns.iter().find(|c| c.path == path) {
            return existing.clone();
        }
        let column = QueryColumn::new(path);
        self.columns.push(column.clone());
        column
    }

    /// Build an existence sub-query correlated through `path`.
    ///
    /// The first segment of `path` must be a lookup column of the root
    /// schema; the sub-query runs over the schema it references.
    pub fn create_sub_query_expression(&self, path: &str) -> ReportResult<SubQueryExpression> {
        let head = path.split('.').next().unwrap_or(path);
        let column = self.root_schema.column(head)?;
        let schema_name = column
            .reference_schema()
            .map(str::to_string)
            .ok_or_else(|| ReportError::NotALookup {
                schema: self.root_schema.name.clone(),
                column: column.name.clone(),
            })?;

        Ok(SubQueryExpression {
            column_path: path.into(),
            reference_column: column.name.clone(),
            schema_name,
            sub_query: SubQuery::default(),
        })
    }

    /// Execute the query through the connection's executor.
    pub async fn get_entity_collection(
        &self,
        connection: &UserConnection,
    ) -> ReportResult<EntityCollection> {
        debug!(schema = %self.root_schema.name, query = %self, "executing entity schema query");
        let collection = connection.query_executor().execute(self).await?;
        debug!(schema = %self.root_schema.name, rows = collection.len(), "query completed");
        Ok(collection)
    }
}

impl fmt::Display for EntitySchemaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.columns.is_empty() {
            f.write_str("*")?;
        }
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "[{}]", column.path)?;
        }
        write!(f, " FROM {}", self.root_schema.name)?;
        if !self.filters.is_empty() {
            write!(f, " WHERE {}", self.filters)?;
        }
        Ok(())
    }
}
