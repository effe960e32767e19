//! Report data assembly.
//!
//! ```text
//! ReportParameters ──► FilterExtractor ──► Filter (Contact)
//!                                            │
//!          ┌─────────────────┬───────────────┴───────┐
//!          ▼                 ▼                       ▼
//!   get_contact_data   get_activity_data      get_settings_data
//!   (Contact query)    (Activity query,       (RequestContext +
//!                       EXISTS on Owner.Id)    UserIdentity)
//!          └─────────────────┴───────────────┬───────┘
//!                                            ▼
//!                  ContactReport ──► ReportDataDictionary
//!                  {"Contact": [..], "Activity": [..], "Environment": [..]}
//! ```

pub mod parameters;
mod provider;
pub mod records;
mod registry;

pub use parameters::{
    FilterConfig, FilterExtractor, ParameterError, ReportParameterFilterExtractor,
    ReportParameters,
};
pub use provider::{ContactReportDataProvider, ReportDataProvider};
pub use records::{
    ActivityRecord, ContactRecord, ContactReport, EnvironmentRecord, ReportDataDictionary,
    ReportRow, ACTIVITY_SECTION, CONTACT_SECTION, ENVIRONMENT_SECTION,
};
pub use registry::ProviderRegistry;
