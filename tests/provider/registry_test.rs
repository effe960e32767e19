//! Provider registry lookups.

use std::sync::Arc;

use async_trait::async_trait;
use contact_report::prelude::*;
use contact_report::report::ReportDataDictionary;

const CRM: &str = include_str!("../../demos/crm.json");

struct EmptyProvider;

#[async_trait]
impl ReportDataProvider for EmptyProvider {
    fn name(&self) -> &str {
        "EmptyProvider"
    }

    async fn get_data(
        &self,
        _connection: &UserConnection,
        _request: &RequestContext,
        _parameters: &ReportParameters,
    ) -> ReportResult<ReportDataDictionary> {
        Ok(ReportDataDictionary::new())
    }
}

#[test]
fn test_defaults_register_contact_provider() {
    let registry = ProviderRegistry::with_defaults(&ReportSettings::default()).unwrap();
    assert_eq!(registry.names(), vec!["ContactReportDataProvider"]);
    assert_eq!(
        registry.get(ContactReportDataProvider::NAME).unwrap().name(),
        "ContactReportDataProvider"
    );
}

#[test]
fn test_unknown_provider() {
    let registry = ProviderRegistry::new();
    assert!(registry.is_empty());
    let err = registry.get("Missing").err().unwrap();
    assert!(matches!(err, ReportError::ProviderNotFound(ref name) if name == "Missing"));
    assert_eq!(err.to_string(), "report data provider not found: Missing");
}

#[test]
fn test_register_replaces_same_name() {
    let mut registry = ProviderRegistry::with_defaults(&ReportSettings::default()).unwrap();
    registry.register(Arc::new(EmptyProvider));
    registry.register(Arc::new(EmptyProvider));
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.names(),
        vec!["ContactReportDataProvider", "EmptyProvider"]
    );
}

#[test]
fn test_defaults_fail_on_unset_url_variable() {
    let settings = ReportSettings::from_toml(
        "[environment]\napplication_url = \"${CONTACT_REPORT_UNSET_URL_VAR}\"\n",
    )
    .unwrap();
    let err = ProviderRegistry::with_defaults(&settings).err().unwrap();
    assert!(matches!(err, ReportError::Settings(_)));
}

#[tokio::test]
async fn test_dispatch_by_name() {
    let mut registry = ProviderRegistry::with_defaults(&ReportSettings::default()).unwrap();
    registry.register(Arc::new(EmptyProvider));

    let connection = UserConnection::with_host(
        Arc::new(MemoryHost::from_json(CRM).unwrap()),
        UserIdentity::named("Supervisor"),
    );
    let request = RequestContext::parse("https://crm.example.com").unwrap();
    let params = ReportParameters::new().with("RecordId", "7f3b5a52-1c3e-4d8a-9a51-2a1e8c0d0001");

    let empty = registry
        .get("EmptyProvider")
        .unwrap()
        .get_data(&connection, &request, &params)
        .await
        .unwrap();
    assert!(empty.is_empty());

    let contact = registry
        .get("ContactReportDataProvider")
        .unwrap()
        .get_data(&connection, &request, &params)
        .await
        .unwrap();
    assert_eq!(contact.section("Contact").unwrap().len(), 1);
    assert_eq!(contact.section("Activity").unwrap().len(), 2);
}
