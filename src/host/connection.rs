//! Caller-scoped connection to the host services.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::esq::QueryExecutor;
use crate::schema::SchemaManager;

/// Identity of the user a report is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    /// Contact record linked to the user.
    pub contact_id: Uuid,
    /// Display name of the linked contact.
    pub contact_name: String,
}

impl UserIdentity {
    pub fn new(id: Uuid, contact_id: Uuid, contact_name: impl Into<String>) -> Self {
        Self {
            id,
            contact_id,
            contact_name: contact_name.into(),
        }
    }

    /// Identity known only by display name.
    pub fn named(contact_name: impl Into<String>) -> Self {
        Self::new(Uuid::nil(), Uuid::nil(), contact_name)
    }
}

/// Host services plus the identity of the caller.
///
/// Cheap to clone; the services are shared.
#[derive(Clone)]
pub struct UserConnection {
    schema_manager: Arc<dyn SchemaManager>,
    query_executor: Arc<dyn QueryExecutor>,
    current_user: UserIdentity,
}

impl UserConnection {
    pub fn new(
        schema_manager: Arc<dyn SchemaManager>,
        query_executor: Arc<dyn QueryExecutor>,
        current_user: UserIdentity,
    ) -> Self {
        Self {
            schema_manager,
            query_executor,
            current_user,
        }
    }

    /// Create a connection whose schema and query services are one host.
    pub fn with_host<H>(host: Arc<H>, current_user: UserIdentity) -> Self
    where
        H: SchemaManager + QueryExecutor + 'static,
    {
        Self::new(host.clone(), host, current_user)
    }

    pub fn entity_schema_manager(&self) -> &dyn SchemaManager {
        self.schema_manager.as_ref()
    }

    pub fn query_executor(&self) -> &dyn QueryExecutor {
        self.query_executor.as_ref()
    }

    pub fn current_user(&self) -> &UserIdentity {
        &self.current_user
    }
}

impl fmt::Debug for UserConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConnection")
            .field("current_user", &self.current_user)
            .finish_non_exhaustive()
    }
}
