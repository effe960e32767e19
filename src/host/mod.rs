//! Host services consumed by report providers.
//!
//! ```text
//! ┌──────────────────────────── UserConnection ───────────────────────────┐
//! │  SchemaManager (metadata)  │  QueryExecutor (rows)  │  UserIdentity   │
//! └───────────────────────────────────────────────────────────────────────┘
//!            RequestContext (per inbound request, passed alongside)
//! ```
//!
//! A real deployment adapts its CRM platform to the two service traits.
//! [`MemoryHost`] implements both over an in-memory dataset.

mod connection;
pub mod memory;
mod request;

pub use connection::{UserConnection, UserIdentity};
pub use memory::MemoryHost;
pub use request::RequestContext;
