//! Report parameters and their conversion into a query filter.
//!
//! The reporting engine hands providers an opaque parameter map. The keys
//! understood by [`ReportParameterFilterExtractor`]:
//!
//! | Key | Shape | Meaning |
//! |---|---|---|
//! | `EntitySchemaName` | string | must name the target schema when present |
//! | `RecordIds` | array of uuid strings | `[Id] IN (...)` |
//! | `RecordId` | uuid string | `[Id] IN (id)` |
//! | `Filters` | [`FilterConfig`] object | filter tree over the schema's columns |
//!
//! Record ids and `Filters` combine with AND. Parameters carrying neither
//! produce no filter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ReportError, ReportResult};
use crate::esq::{
    column, ColumnValue, ComparisonType, Filter, FilterExt, FilterGroup, LogicalOperation,
};
use crate::host::UserConnection;
use crate::schema::{DataValueType, EntitySchema, SchemaManager, SchemaManagerExt};

pub const ENTITY_SCHEMA_NAME_KEY: &str = "EntitySchemaName";
pub const RECORD_IDS_KEY: &str = "RecordIds";
pub const RECORD_ID_KEY: &str = "RecordId";
pub const FILTERS_KEY: &str = "Filters";

/// Raw parameters of one report request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportParameters(Map<String, Value>);

impl ReportParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameters from a JSON object.
    pub fn from_json(json: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the parameters into a filter on `schema_name` using the
    /// default conversion.
    pub fn extract_esq_filter(
        &self,
        connection: &UserConnection,
        schema_name: &str,
    ) -> Option<Filter> {
        ReportParameterFilterExtractor.extract_filter(connection, schema_name, self)
    }
}

impl From<Map<String, Value>> for ReportParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Conversion of report parameters into a filter bound to a named schema.
///
/// Returning `None` fails the whole report.
pub trait FilterExtractor: Send + Sync {
    fn extract_filter(
        &self,
        connection: &UserConnection,
        schema_name: &str,
        parameters: &ReportParameters,
    ) -> Option<Filter>;
}

impl<F: FilterExtractor + ?Sized> FilterExtractor for Arc<F> {
    fn extract_filter(
        &self,
        connection: &UserConnection,
        schema_name: &str,
        parameters: &ReportParameters,
    ) -> Option<Filter> {
        (**self).extract_filter(connection, schema_name, parameters)
    }
}

// =============================================================================
// Filter config (JSON filter tree)
// =============================================================================

/// Serialized filter tree accepted under the `Filters` key.
///
/// ```json
/// {"type": "group", "logical": "or", "items": [
///   {"type": "compare", "column": "Country.Name", "value": "Kenya"},
///   {"type": "in", "column": "Id", "values": ["..."]},
///   {"type": "is_null", "column": "Email", "negated": true}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    Group {
        #[serde(default)]
        logical: LogicalOperation,
        items: Vec<FilterConfig>,
    },
    Compare {
        column: String,
        #[serde(default)]
        comparison: ComparisonType,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        #[serde(default)]
        negated: bool,
    },
    IsNull {
        column: String,
        #[serde(default)]
        negated: bool,
    },
    Not {
        filter: Box<FilterConfig>,
    },
}

impl FilterConfig {
    /// Lower the config into a filter, typing values by the columns they
    /// are compared with.
    pub fn lower(
        &self,
        manager: &dyn SchemaManager,
        schema: &Arc<EntitySchema>,
    ) -> ReportResult<Filter> {
        match self {
            FilterConfig::Group { logical, items } => {
                let mut group = FilterGroup::new(*logical);
                for item in items {
                    group.add(item.lower(manager, schema)?);
                }
                Ok(Filter::Group(group))
            }
            FilterConfig::Compare {
                column,
                comparison,
                value,
            } => {
                let data_value_type = column_type(manager, schema, column)?;
                let is_text_match = matches!(
                    comparison,
                    ComparisonType::Contain | ComparisonType::StartWith | ComparisonType::EndWith
                );
                if is_text_match && data_value_type != DataValueType::Text {
                    return Err(ReportError::invalid_value(
                        column,
                        format!("{comparison:?} needs a text column, found {data_value_type}"),
                    ));
                }
                Ok(Filter::Compare {
                    column: column.clone(),
                    comparison: *comparison,
                    value: ColumnValue::from_json(column, value, data_value_type)?,
                })
            }
            FilterConfig::In {
                column,
                values,
                negated,
            } => {
                let data_value_type = column_type(manager, schema, column)?;
                let values = values
                    .iter()
                    .map(|v| ColumnValue::from_json(column, v, data_value_type))
                    .collect::<ReportResult<Vec<_>>>()?;
                Ok(Filter::In {
                    column: column.clone(),
                    values,
                    negated: *negated,
                })
            }
            FilterConfig::IsNull { column, negated } => {
                manager.resolve_path(schema, column)?;
                Ok(Filter::IsNull {
                    column: column.clone(),
                    negated: *negated,
                })
            }
            FilterConfig::Not { filter } => Ok(filter.lower(manager, schema)?.not()),
        }
    }
}

fn column_type(
    manager: &dyn SchemaManager,
    schema: &Arc<EntitySchema>,
    path: &str,
) -> ReportResult<DataValueType> {
    Ok(manager.resolve_path(schema, path)?.target_column().data_value_type)
}

// =============================================================================
// Default extractor
// =============================================================================

/// Why a parameter map was rejected. Logged only; callers see
/// [`ReportError::FilterExtraction`].
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("parameters target schema '{found}', expected '{expected}'")]
    SchemaMismatch { expected: String, found: String },

    #[error("parameter '{0}' has an unexpected shape")]
    Shape(&'static str),

    #[error("invalid record id '{0}'")]
    InvalidRecordId(String),

    #[error("invalid filter tree: {0}")]
    InvalidFilters(#[source] serde_json::Error),

    #[error(transparent)]
    Lowering(#[from] ReportError),
}

/// Default conversion of report parameters into a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParameterFilterExtractor;

impl ReportParameterFilterExtractor {
    /// Convert parameters, reporting why they were rejected.
    ///
    /// `Ok(None)` means the parameters carry no filter at all.
    pub fn try_extract(
        &self,
        connection: &UserConnection,
        schema_name: &str,
        parameters: &ReportParameters,
    ) -> Result<Option<Filter>, ParameterError> {
        if let Some(value) = parameters.get(ENTITY_SCHEMA_NAME_KEY) {
            let found = value.as_str().ok_or(ParameterError::Shape(ENTITY_SCHEMA_NAME_KEY))?;
            if found != schema_name {
                return Err(ParameterError::SchemaMismatch {
                    expected: schema_name.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let manager = connection.entity_schema_manager();
        let schema = manager.get_instance_by_name(schema_name)?;
        let mut filters = Vec::new();

        if let Some(ids) = record_ids(parameters)? {
            filters.push(column(&schema.primary_column_name).is_in(ids));
        }

        if let Some(value) = parameters.get(FILTERS_KEY) {
            let config: FilterConfig =
                serde_json::from_value(value.clone()).map_err(ParameterError::InvalidFilters)?;
            filters.push(config.lower(manager, &schema)?);
        }

        Ok(filters.into_iter().reduce(|acc, f| acc.and(f)))
    }
}

fn parse_record_id(value: &Value) -> Result<Uuid, ParameterError> {
    let s = value.as_str().ok_or(ParameterError::Shape(RECORD_IDS_KEY))?;
    Uuid::parse_str(s).map_err(|_| ParameterError::InvalidRecordId(s.to_string()))
}

fn record_ids(parameters: &ReportParameters) -> Result<Option<Vec<Uuid>>, ParameterError> {
    if let Some(value) = parameters.get(RECORD_IDS_KEY) {
        let items = value.as_array().ok_or(ParameterError::Shape(RECORD_IDS_KEY))?;
        return items
            .iter()
            .map(parse_record_id)
            .collect::<Result<Vec<_>, _>>()
            .map(Some);
    }
    if let Some(value) = parameters.get(RECORD_ID_KEY) {
        return parse_record_id(value).map(|id| Some(vec![id]));
    }
    Ok(None)
}

impl FilterExtractor for ReportParameterFilterExtractor {
    fn extract_filter(
        &self,
        connection: &UserConnection,
        schema_name: &str,
        parameters: &ReportParameters,
    ) -> Option<Filter> {
        match self.try_extract(connection, schema_name, parameters) {
            Ok(Some(filter)) => {
                debug!(schema = schema_name, %filter, "extracted report filter");
                Some(filter)
            }
            Ok(None) => {
                warn!(schema = schema_name, "report parameters carry no filter");
                None
            }
            Err(error) => {
                warn!(schema = schema_name, %error, "report parameters rejected");
                None
            }
        }
    }
}
