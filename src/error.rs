//! Report provider error types.

use thiserror::Error;

use crate::config::SettingsError;
use crate::schema::DataValueType;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while assembling report data.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report parameters could not be converted into a filter.
    ///
    /// Carries no detail; the rejection reason is logged by the extractor.
    #[error("failed to extract filter from report parameters")]
    FilterExtraction,

    /// Schema lookup by name or uid failed.
    #[error("entity schema not found: {0}")]
    SchemaNotFound(String),

    /// A column (or column path segment) does not exist.
    #[error("column '{column}' not found in schema '{schema}'")]
    ColumnNotFound {
        /// Schema the lookup ran against.
        schema: String,
        /// Requested column name or path.
        column: String,
    },

    /// A column path walks through a column that is not a reference.
    #[error("column '{column}' of schema '{schema}' is not a lookup")]
    NotALookup {
        /// Schema owning the column.
        schema: String,
        /// Column name.
        column: String,
    },

    /// A typed read found a value of another type.
    #[error("column '{column}' holds {found}, expected {expected}")]
    ColumnType {
        /// Column value name.
        column: String,
        /// Requested type.
        expected: DataValueType,
        /// Name of the stored value kind.
        found: &'static str,
    },

    /// A schema definition is inconsistent.
    #[error("invalid schema '{schema}': {message}")]
    InvalidSchema {
        /// Schema name.
        schema: String,
        /// What is wrong with it.
        message: String,
    },

    /// A raw value cannot be converted to the column's type.
    #[error("invalid value for column '{column}': {message}")]
    InvalidValue {
        /// Column the value was meant for.
        column: String,
        /// Conversion failure description.
        message: String,
    },

    /// The host failed to execute a query.
    #[error("query on '{schema}' failed: {message}")]
    QueryFailed {
        /// Root schema of the failed query.
        schema: String,
        /// Host error message.
        message: String,
    },

    /// A request context could not be built from a URL.
    #[error("invalid request url: {0}")]
    InvalidRequestUrl(String),

    /// No provider is registered under the requested name.
    #[error("report data provider not found: {0}")]
    ProviderNotFound(String),

    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A JSON dataset, parameter document or record failed to (de)serialize.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Create a column-not-found error.
    pub fn column_not_found(schema: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            schema: schema.into(),
            column: column.into(),
        }
    }

    /// Create a query failure from a host error message.
    pub fn query_failed(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-value error.
    pub fn invalid_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from filter extraction.
    pub fn is_filter_extraction(&self) -> bool {
        matches!(self, Self::FilterExtraction)
    }

    /// Check if this error is a schema or column metadata miss.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaNotFound(_)
                | Self::ColumnNotFound { .. }
                | Self::NotALookup { .. }
                | Self::InvalidSchema { .. }
        )
    }
}
