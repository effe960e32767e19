//! Entity schema metadata.
//!
//! Schemas describe the columns of an entity type and the reference
//! (lookup) columns that point at other schemas. The host owns the
//! metadata; this crate reads it through the [`SchemaManager`] trait.
//!
//! # Example
//!
//! ```ignore
//! use contact_report::schema::{SchemaManager, SchemaManagerExt};
//!
//! let activity = manager.get_instance_by_name("Activity")?;
//! let path = manager.resolve_path(&activity, "Owner.Id")?;
//! assert_eq!(path.target_schema().name, "Contact");
//! ```

mod manager;
mod types;

pub use manager::{ColumnPath, PathSegment, SchemaManager, SchemaManagerExt};
pub use types::*;
