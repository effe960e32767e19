//! Entity schema queries.
//!
//! A small declarative query model over host-owned schemas:
//!
//! ```text
//! EntitySchemaQuery ──► QueryExecutor (host) ──► EntityCollection
//!   ├─ columns: QueryColumn ("Owner.Id" → "OwnerId")
//!   └─ filters: FilterGroup
//!        └─ Filter::Exists(SubQueryExpression) ── correlated sub-filter
//! ```
//!
//! # Example
//!
//! ```ignore
//! use contact_report::esq::{column, EntitySchemaQuery, Filter};
//!
//! let mut query = EntitySchemaQuery::new(activity_schema);
//! query.add_column("Title");
//! let mut owner = query.create_sub_query_expression("Owner.Id")?;
//! owner.sub_query.filters.add(column("Name").eq("Jane Doe"));
//! query.filters.add(Filter::exists(owner));
//!
//! let rows = query.get_entity_collection(&connection).await?;
//! ```

mod executor;
pub mod filter;
pub mod query;
pub mod value;

pub use executor::QueryExecutor;
pub use filter::{
    column, ComparisonType, Filter, FilterColumn, FilterExt, FilterGroup, LogicalOperation,
};
pub use query::{EntitySchemaQuery, QueryColumn, SubQuery, SubQueryExpression};
pub use value::{ColumnValue, Entity, EntityCollection, FromColumnValue};
