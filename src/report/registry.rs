//! Providers addressable by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::provider::{ContactReportDataProvider, ReportDataProvider};
use crate::config::ReportSettings;
use crate::error::{ReportError, ReportResult};

/// Registered report data providers, keyed by [`ReportDataProvider::name`].
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ReportDataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in provider configured from `settings`.
    pub fn with_defaults(settings: &ReportSettings) -> ReportResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(ContactReportDataProvider::from_settings(settings)?));
        Ok(registry)
    }

    /// Register a provider, replacing any provider with the same name.
    pub fn register(&mut self, provider: Arc<dyn ReportDataProvider>) {
        let name = provider.name().to_string();
        debug!(provider = %name, "registered report data provider");
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> ReportResult<Arc<dyn ReportDataProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ReportError::ProviderNotFound(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
