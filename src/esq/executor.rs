//! QueryExecutor trait definition.
//!
//! The host's query engine is consumed as a black box: it receives a
//! declarative [`EntitySchemaQuery`] and returns typed rows. Timeouts and
//! connection pooling are the implementation's concern.

use std::sync::Arc;

use async_trait::async_trait;

use super::query::EntitySchemaQuery;
use super::value::EntityCollection;
use crate::error::ReportResult;

/// Trait for executing entity schema queries against a store.
///
/// Implementations must return every row matching `query.filters` (no
/// paging) and populate each selected column under its
/// [`QueryColumn::name`](super::QueryColumn::name). A selected lookup
/// column is populated twice: the reference id under
/// `value_column_name()` and the referenced row's label under
/// `display_column_value_name()`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a query and materialize all matching rows.
    async fn execute(&self, query: &EntitySchemaQuery) -> ReportResult<EntityCollection>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn execute(&self, query: &EntitySchemaQuery) -> ReportResult<EntityCollection> {
        (**self).execute(query).await
    }
}
