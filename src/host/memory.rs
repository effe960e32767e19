//! In-memory host services.
//!
//! [`MemoryHost`] implements [`SchemaManager`] and [`QueryExecutor`] over
//! rows held in memory. It backs the CLI and the test-suite; it evaluates
//! the filter AST row by row and makes no attempt at planning.
//!
//! Dataset format:
//!
//! ```json
//! {
//!   "schemas": [
//!     {"uid": "...", "name": "Country", "primary_display_column": "Name",
//!      "columns": [{"name": "Id", "type": "guid"}, {"name": "Name", "type": "text"}]}
//!   ],
//!   "rows": {
//!     "Country": [{"Id": "...", "Name": "Kenya"}]
//!   }
//! }
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};
use crate::esq::{
    ColumnValue, ComparisonType, Entity, EntityCollection, EntitySchemaQuery, Filter, FilterGroup,
    LogicalOperation, QueryExecutor,
};
use crate::schema::{EntitySchema, SchemaManager, SchemaManagerExt, SchemaManagerItem};

/// Stored row: column name to raw value. Lookups hold the referenced id.
type MemoryRow = HashMap<String, ColumnValue>;

#[derive(Debug, Deserialize)]
struct Dataset {
    schemas: Vec<EntitySchema>,
    #[serde(default)]
    rows: HashMap<String, Vec<serde_json::Map<String, serde_json::Value>>>,
}

/// Schema registry and row store in one.
#[derive(Debug, Default)]
pub struct MemoryHost {
    schemas: HashMap<String, Arc<EntitySchema>>,
    rows: HashMap<String, Vec<MemoryRow>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load schemas and rows from a JSON dataset.
    ///
    /// Schemas are registered before any row is inserted, so rows may
    /// appear in any order.
    pub fn from_json(json: &str) -> ReportResult<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        let mut host = Self::new();

        for schema in dataset.schemas {
            host.add_schema(schema)?;
        }

        let mut total = 0;
        for (schema_name, rows) in &dataset.rows {
            for row in rows {
                host.insert_json_row(schema_name, row)?;
            }
            total += rows.len();
        }

        debug!(schemas = host.schemas.len(), rows = total, "loaded in-memory dataset");
        Ok(host)
    }

    /// Register a schema, replacing one with the same name.
    ///
    /// Fails with [`ReportError::InvalidSchema`] when a lookup column has
    /// no reference or a plain column carries one.
    pub fn add_schema(&mut self, schema: EntitySchema) -> ReportResult<()> {
        schema.validate()?;
        self.rows.entry(schema.name.clone()).or_default();
        self.schemas.insert(schema.name.clone(), Arc::new(schema));
        Ok(())
    }

    /// Insert a row of typed values; unspecified columns are null.
    pub fn insert_row<I, K>(&mut self, schema_name: &str, values: I) -> ReportResult<()>
    where
        I: IntoIterator<Item = (K, ColumnValue)>,
        K: Into<String>,
    {
        let schema = self.get_instance_by_name(schema_name)?;
        let mut row = MemoryRow::new();
        for (name, value) in values {
            let name = name.into();
            schema.column(&name)?;
            row.insert(name, value);
        }
        self.rows.entry(schema.name.clone()).or_default().push(row);
        Ok(())
    }

    /// Insert a row given as JSON, typing each value by its column.
    pub fn insert_json_row(
        &mut self,
        schema_name: &str,
        row: &serde_json::Map<String, serde_json::Value>,
    ) -> ReportResult<()> {
        let schema = self.get_instance_by_name(schema_name)?;
        let values = row
            .iter()
            .map(|(name, raw)| -> ReportResult<(String, ColumnValue)> {
                let column = schema.column(name)?;
                let value = ColumnValue::from_json(name, raw, column.data_value_type)?;
                Ok((name.clone(), value))
            })
            .collect::<ReportResult<Vec<_>>>()?;
        self.insert_row(schema_name, values)
    }

    /// Number of stored rows of a schema.
    pub fn row_count(&self, schema_name: &str) -> usize {
        self.rows.get(schema_name).map_or(0, Vec::len)
    }

    fn rows_of(&self, schema_name: &str) -> &[MemoryRow] {
        self.rows
            .get(schema_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn find_by_primary(&self, schema: &EntitySchema, id: Uuid) -> Option<&MemoryRow> {
        self.rows_of(&schema.name).iter().find(|row| {
            matches!(row.get(&schema.primary_column_name), Some(ColumnValue::Guid(g)) if *g == id)
        })
    }

    /// Follow a column path from `row`, walking lookups row by row.
    ///
    /// A null or dangling reference yields null for the rest of the path.
    fn path_value(
        &self,
        schema: &Arc<EntitySchema>,
        row: &MemoryRow,
        path: &str,
    ) -> ReportResult<ColumnValue> {
        let resolved = self.resolve_path(schema, path)?;
        let mut current = row;

        for (idx, segment) in resolved.segments.iter().enumerate() {
            let value = current
                .get(&segment.column.name)
                .cloned()
                .unwrap_or_default();

            let Some(next) = resolved.segments.get(idx + 1) else {
                return Ok(value);
            };

            current = match value {
                ColumnValue::Guid(id) => match self.find_by_primary(&next.schema, id) {
                    Some(row) => row,
                    None => return Ok(ColumnValue::Null),
                },
                _ => return Ok(ColumnValue::Null),
            };
        }

        Ok(ColumnValue::Null)
    }

    /// Label of the row a lookup value points at.
    fn display_value(
        &self,
        schema_name: &str,
        reference: &ColumnValue,
    ) -> ReportResult<ColumnValue> {
        let ColumnValue::Guid(id) = reference else {
            return Ok(ColumnValue::Null);
        };
        let schema = self.get_instance_by_name(schema_name)?;
        let Some(display_column) = schema.primary_display_column_name.as_deref() else {
            return Ok(ColumnValue::Null);
        };
        Ok(self
            .find_by_primary(&schema, *id)
            .and_then(|row| row.get(display_column).cloned())
            .unwrap_or_default())
    }

    // =========================================================================
    // Filter evaluation
    // =========================================================================

    fn validate_filters(
        &self,
        schema: &Arc<EntitySchema>,
        group: &FilterGroup,
    ) -> ReportResult<()> {
        for filter in group.iter() {
            self.validate_filter(schema, filter)?;
        }
        Ok(())
    }

    fn validate_filter(&self, schema: &Arc<EntitySchema>, filter: &Filter) -> ReportResult<()> {
        match filter {
            Filter::Group(group) => self.validate_filters(schema, group),
            Filter::Not(inner) => self.validate_filter(schema, inner),
            Filter::Exists { expression, .. } => {
                self.resolve_path(schema, &expression.column_path)?;
                let sub_schema = self.get_instance_by_name(&expression.schema_name)?;
                self.validate_filters(&sub_schema, &expression.sub_query.filters)
            }
            other => {
                for path in other.column_paths() {
                    self.resolve_path(schema, path)?;
                }
                Ok(())
            }
        }
    }

    fn matches_group(
        &self,
        schema: &Arc<EntitySchema>,
        row: &MemoryRow,
        group: &FilterGroup,
    ) -> ReportResult<bool> {
        for filter in group.iter() {
            let hit = self.matches(schema, row, filter)?;
            match group.logical {
                LogicalOperation::And if !hit => return Ok(false),
                LogicalOperation::Or if hit => return Ok(true),
                _ => {}
            }
        }
        // all AND items held, or no OR item did; empty groups match
        Ok(group.logical == LogicalOperation::And || group.is_empty())
    }

    fn matches(
        &self,
        schema: &Arc<EntitySchema>,
        row: &MemoryRow,
        filter: &Filter,
    ) -> ReportResult<bool> {
        match filter {
            Filter::Compare {
                column,
                comparison,
                value,
            } => {
                let left = self.path_value(schema, row, column)?;
                Ok(compare(&left, *comparison, value))
            }
            Filter::In {
                column,
                values,
                negated,
            } => {
                let left = self.path_value(schema, row, column)?;
                let hit = values
                    .iter()
                    .any(|v| left.compare(v) == Some(Ordering::Equal));
                Ok(hit != *negated)
            }
            Filter::IsNull { column, negated } => {
                let left = self.path_value(schema, row, column)?;
                Ok(left.is_null() != *negated)
            }
            Filter::Group(group) => self.matches_group(schema, row, group),
            Filter::Not(inner) => Ok(!self.matches(schema, row, inner)?),
            Filter::Exists {
                expression,
                negated,
            } => {
                let outer = self.path_value(schema, row, &expression.column_path)?;
                let sub_schema = self.get_instance_by_name(&expression.schema_name)?;
                let tail = expression
                    .column_path
                    .split_once('.')
                    .map(|(_, tail)| tail)
                    .unwrap_or(sub_schema.primary_column_name.as_str());

                let mut found = false;
                if !outer.is_null() {
                    for sub_row in self.rows_of(&sub_schema.name) {
                        let inner = self.path_value(&sub_schema, sub_row, tail)?;
                        let sub_filters = &expression.sub_query.filters;
                        if inner.compare(&outer) == Some(Ordering::Equal)
                            && self.matches_group(&sub_schema, sub_row, sub_filters)?
                        {
                            found = true;
                            break;
                        }
                    }
                }
                Ok(found != *negated)
            }
        }
    }
}

/// Apply a comparison; nulls and mismatched kinds never match.
///
/// Text containment checks ignore case.
fn compare(left: &ColumnValue, comparison: ComparisonType, right: &ColumnValue) -> bool {
    use ComparisonType::*;

    if let (Contain | StartWith | EndWith, ColumnValue::Text(l), ColumnValue::Text(r)) =
        (comparison, left, right)
    {
        let (l, r) = (l.to_lowercase(), r.to_lowercase());
        return match comparison {
            Contain => l.contains(&r),
            StartWith => l.starts_with(&r),
            _ => l.ends_with(&r),
        };
    }

    let Some(ord) = left.compare(right) else {
        return false;
    };
    match comparison {
        Equal => ord == Ordering::Equal,
        NotEqual => ord != Ordering::Equal,
        Less => ord == Ordering::Less,
        LessOrEqual => ord != Ordering::Greater,
        Greater => ord == Ordering::Greater,
        GreaterOrEqual => ord != Ordering::Less,
        Contain | StartWith | EndWith => false,
    }
}

impl SchemaManager for MemoryHost {
    fn get_item_by_uid(&self, uid: Uuid) -> ReportResult<SchemaManagerItem> {
        Ok(self.get_instance_by_uid(uid)?.item())
    }

    fn get_instance_by_uid(&self, uid: Uuid) -> ReportResult<Arc<EntitySchema>> {
        self.schemas
            .values()
            .find(|s| s.uid == uid)
            .cloned()
            .ok_or_else(|| ReportError::SchemaNotFound(uid.to_string()))
    }

    fn get_instance_by_name(&self, name: &str) -> ReportResult<Arc<EntitySchema>> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::SchemaNotFound(name.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for MemoryHost {
    async fn execute(&self, query: &EntitySchemaQuery) -> ReportResult<EntityCollection> {
        let schema = self.get_instance_by_name(&query.root_schema().name)?;

        let projections = query
            .columns()
            .iter()
            .map(|column| -> ReportResult<_> {
                Ok((column, self.resolve_path(&schema, &column.path)?))
            })
            .collect::<ReportResult<Vec<_>>>()?;
        self.validate_filters(&schema, &query.filters)?;

        let mut entities = Vec::new();
        for row in self.rows_of(&schema.name) {
            if !self.matches_group(&schema, row, &query.filters)? {
                continue;
            }

            let mut entity = Entity::new(Arc::clone(&schema));
            for (column, path) in &projections {
                let value = self.path_value(&schema, row, &column.path)?;
                let target = path.target_column();
                if let Some(reference) = target.reference_schema() {
                    let display = self.display_value(reference, &value)?;
                    entity.set_column_value(format!("{}Id", column.name), value.clone());
                    entity.set_column_value(format!("{}Name", column.name), display);
                }
                entity.set_column_value(column.name.clone(), value);
            }
            entities.push(entity);
        }

        Ok(EntityCollection::new(entities))
    }
}
