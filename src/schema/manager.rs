//! SchemaManager trait definition.
//!
//! The host keeps schema metadata in memory, so lookups are synchronous.
//! Column paths such as `Owner.Id` are resolved on top of the three
//! primitive lookups by [`SchemaManagerExt`].

use std::sync::Arc;

use uuid::Uuid;

use super::types::{EntitySchema, EntitySchemaColumn, SchemaManagerItem};
use crate::error::{ReportError, ReportResult};

/// Trait for resolving entity schema metadata.
pub trait SchemaManager: Send + Sync {
    /// Get the registration entry for a schema without loading it.
    fn get_item_by_uid(&self, uid: Uuid) -> ReportResult<SchemaManagerItem>;

    /// Get a full schema by its unique identifier.
    fn get_instance_by_uid(&self, uid: Uuid) -> ReportResult<Arc<EntitySchema>>;

    /// Get a full schema by name.
    fn get_instance_by_name(&self, name: &str) -> ReportResult<Arc<EntitySchema>>;
}

/// One step of a resolved column path.
#[derive(Debug, Clone)]
pub struct PathSegment {
    /// Schema the column belongs to.
    pub schema: Arc<EntitySchema>,
    pub column: EntitySchemaColumn,
}

/// A column path resolved through lookup references.
///
/// `Owner.Country.Name` on `Activity` resolves to three segments:
/// `Activity.Owner`, `Contact.Country` and `Country.Name`.
#[derive(Debug, Clone)]
pub struct ColumnPath {
    pub segments: Vec<PathSegment>,
}

impl ColumnPath {
    /// Schema owning the final column.
    pub fn target_schema(&self) -> &Arc<EntitySchema> {
        // resolve_path never yields an empty path
        &self.segments[self.segments.len() - 1].schema
    }

    /// Final column of the path.
    pub fn target_column(&self) -> &EntitySchemaColumn {
        &self.segments[self.segments.len() - 1].column
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Extension trait for SchemaManager with path resolution.
pub trait SchemaManagerExt: SchemaManager {
    /// Resolve a dotted column path against `schema`.
    ///
    /// Every segment except the last must be a lookup column.
    fn resolve_path(&self, schema: &Arc<EntitySchema>, path: &str) -> ReportResult<ColumnPath> {
        if path.is_empty() {
            return Err(ReportError::column_not_found(&schema.name, path));
        }

        let parts: Vec<&str> = path.split('.').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut current = Arc::clone(schema);

        for (idx, part) in parts.iter().enumerate() {
            let column = current
                .columns
                .find_by_name(part)
                .cloned()
                .ok_or_else(|| ReportError::column_not_found(&current.name, path))?;

            let next = if idx + 1 < parts.len() {
                let reference = column.reference_schema().ok_or_else(|| {
                    ReportError::NotALookup {
                        schema: current.name.clone(),
                        column: column.name.clone(),
                    }
                })?;
                Some(self.get_instance_by_name(reference)?)
            } else {
                None
            };

            segments.push(PathSegment {
                schema: Arc::clone(&current),
                column,
            });

            if let Some(next) = next {
                current = next;
            }
        }

        Ok(ColumnPath { segments })
    }

    /// Resolve a schema uid to its name.
    fn schema_name(&self, uid: Uuid) -> ReportResult<String> {
        Ok(self.get_item_by_uid(uid)?.name)
    }
}

// Blanket implementation for all SchemaManager implementations
impl<T: SchemaManager + ?Sized> SchemaManagerExt for T {}
