//! # Contact report
//!
//! Report data provider that assembles contact, activity and environment
//! sections from a CRM entity store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        ReportParameters  +  RequestContext               │
//! │        (from the reporting engine, per render)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::FilterExtractor]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Filter (Contact schema)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [esq::EntitySchemaQuery]
//! ┌─────────────────────────────────────────────────────────┐
//! │   UserConnection: SchemaManager + QueryExecutor (host)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::ContactReportDataProvider]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ReportDataDictionary {Contact, Activity, Environment}  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod esq;
pub mod host;
pub mod report;
pub mod schema;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::ReportSettings;
    pub use crate::error::{ReportError, ReportResult};
    pub use crate::esq::{
        column, ColumnValue, EntitySchemaQuery, Filter, FilterExt, FilterGroup, QueryExecutor,
    };
    pub use crate::host::{MemoryHost, RequestContext, UserConnection, UserIdentity};
    pub use crate::report::{
        ContactReport, ContactReportDataProvider, ProviderRegistry, ReportDataDictionary,
        ReportDataProvider, ReportParameters,
    };
    pub use crate::schema::{EntitySchema, SchemaManager, SchemaManagerExt};
}

pub use error::{ReportError, ReportResult};
