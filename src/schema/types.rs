//! Schema metadata types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};

/// Value type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataValueType {
    Guid,
    Text,
    Integer,
    Float,
    Boolean,
    DateTime,
    /// Reference to a row of another schema.
    Lookup,
}

impl DataValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guid => "guid",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::DateTime => "date_time",
            Self::Lookup => "lookup",
        }
    }
}

impl fmt::Display for DataValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of an entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchemaColumn {
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub data_value_type: DataValueType,
    /// Referenced schema name, set for lookup columns only.
    #[serde(default, rename = "reference")]
    pub reference_schema_name: Option<String>,
}

impl EntitySchemaColumn {
    pub fn new(name: &str, data_value_type: DataValueType) -> Self {
        Self {
            name: name.into(),
            caption: None,
            data_value_type,
            reference_schema_name: None,
        }
    }

    /// Create a lookup column referencing `schema`.
    pub fn lookup(name: &str, schema: &str) -> Self {
        Self {
            name: name.into(),
            caption: None,
            data_value_type: DataValueType::Lookup,
            reference_schema_name: Some(schema.into()),
        }
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn is_lookup(&self) -> bool {
        self.data_value_type == DataValueType::Lookup
    }

    /// Schema a lookup column references; `None` for every other column.
    pub fn reference_schema(&self) -> Option<&str> {
        if self.is_lookup() {
            self.reference_schema_name.as_deref()
        } else {
            None
        }
    }

    /// Name under which a query row stores the column's raw value.
    ///
    /// Lookups store the referenced identifier as `<Name>Id`.
    pub fn value_column_name(&self) -> String {
        if self.is_lookup() {
            format!("{}Id", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Name under which a query row stores the column's display value.
    ///
    /// Lookups store the referenced row's label as `<Name>Name`.
    pub fn display_column_value_name(&self) -> String {
        if self.is_lookup() {
            format!("{}Name", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Ordered column set of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySchemaColumnCollection(Vec<EntitySchemaColumn>);

impl EntitySchemaColumnCollection {
    pub fn new(columns: Vec<EntitySchemaColumn>) -> Self {
        Self(columns)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&EntitySchemaColumn> {
        self.0.iter().find(|c| c.name == name)
    }

    /// Get a column by name, failing with [`ReportError::ColumnNotFound`]
    /// attributed to `schema`.
    pub fn get_by_name(&self, schema: &str, name: &str) -> ReportResult<&EntitySchemaColumn> {
        self.find_by_name(name)
            .ok_or_else(|| ReportError::column_not_found(schema, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchemaColumn> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Full description of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub uid: Uuid,
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default = "default_primary_column")]
    pub primary_column_name: String,
    /// Column whose value labels a row when it is referenced by a lookup.
    #[serde(default, rename = "primary_display_column")]
    pub primary_display_column_name: Option<String>,
    pub columns: EntitySchemaColumnCollection,
}

fn default_primary_column() -> String {
    "Id".to_string()
}

impl EntitySchema {
    pub fn new(uid: Uuid, name: &str, columns: Vec<EntitySchemaColumn>) -> Self {
        Self {
            uid,
            name: name.into(),
            caption: None,
            primary_column_name: default_primary_column(),
            primary_display_column_name: None,
            columns: EntitySchemaColumnCollection::new(columns),
        }
    }

    pub fn with_primary_display_column(mut self, column: &str) -> Self {
        self.primary_display_column_name = Some(column.into());
        self
    }

    pub fn column(&self, name: &str) -> ReportResult<&EntitySchemaColumn> {
        self.columns.get_by_name(&self.name, name)
    }

    /// Check that lookup columns, and only lookup columns, name a
    /// referenced schema.
    pub fn validate(&self) -> ReportResult<()> {
        for column in self.columns.iter() {
            let message = match (column.is_lookup(), &column.reference_schema_name) {
                (true, None) => "is a lookup without a reference",
                (false, Some(_)) => "has a reference but is not a lookup",
                _ => continue,
            };
            return Err(ReportError::InvalidSchema {
                schema: self.name.clone(),
                message: format!("column '{}' {message}", column.name),
            });
        }
        Ok(())
    }

    /// Lightweight manager entry for this schema.
    pub fn item(&self) -> SchemaManagerItem {
        SchemaManagerItem {
            uid: self.uid,
            name: self.name.clone(),
            caption: self.caption.clone(),
        }
    }
}

/// Schema registration entry, resolvable without loading the full schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaManagerItem {
    pub uid: Uuid,
    pub name: String,
    pub caption: Option<String>,
}
