//! ContactReportDataProvider against the demo CRM dataset.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use contact_report::esq::EntityCollection;
use contact_report::prelude::*;
use contact_report::report::{FilterExtractor, CONTACT_SECTION};
use serde_json::{json, Value};
use uuid::Uuid;

const CRM: &str = include_str!("../../demos/crm.json");
const JANE: &str = "7f3b5a52-1c3e-4d8a-9a51-2a1e8c0d0001";
const JOHN: &str = "7f3b5a52-1c3e-4d8a-9a51-2a1e8c0d0002";

fn host() -> Arc<MemoryHost> {
    Arc::new(MemoryHost::from_json(CRM).unwrap())
}

fn connection() -> UserConnection {
    UserConnection::with_host(host(), UserIdentity::named("Supervisor"))
}

fn request() -> RequestContext {
    RequestContext::parse("https://crm.example.com/app").unwrap()
}

fn jane_params() -> ReportParameters {
    ReportParameters::new()
        .with("EntitySchemaName", "Contact")
        .with("RecordIds", json!([JANE]))
}

fn column_of(rows: &[contact_report::report::ReportRow], key: &str) -> Vec<Value> {
    rows.iter().map(|row| row[key].clone()).collect()
}

/// Executor wrapper that counts the queries it runs.
struct CountingExecutor {
    inner: Arc<MemoryHost>,
    queries: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for CountingExecutor {
    async fn execute(&self, query: &EntitySchemaQuery) -> ReportResult<EntityCollection> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(query).await
    }
}

/// Executor that fails every query rooted at `schema` and delegates the rest.
struct FailingExecutor {
    inner: Arc<MemoryHost>,
    schema: &'static str,
}

#[async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute(&self, query: &EntitySchemaQuery) -> ReportResult<EntityCollection> {
        if query.root_schema().name == self.schema {
            return Err(ReportError::query_failed(self.schema, "timeout"));
        }
        self.inner.execute(query).await
    }
}

#[tokio::test]
async fn test_jane_doe_scenario() {
    let provider = ContactReportDataProvider::new();
    let data = provider
        .get_data(&connection(), &request(), &jane_params())
        .await
        .unwrap();

    let contacts = data.section("Contact").unwrap();
    assert_eq!(contacts.len(), 1);
    let jane = &contacts[0];
    assert_eq!(jane["Id"], json!(JANE));
    assert_eq!(jane["Name"], json!("Jane Doe"));
    assert_eq!(jane["Email"], json!("jane.doe@example.com"));
    assert_eq!(jane["Zip"], json!("00100"));
    assert_eq!(jane["OwnerName"], json!("Supervisor"));
    assert_eq!(jane["Country"], json!("Kenya"));
    assert_eq!(jane["Region"], json!("Nairobi County"));
    assert_eq!(jane["City"], json!("Nairobi"));

    let activities = data.section("Activity").unwrap();
    assert_eq!(
        column_of(activities, "Title"),
        vec![json!("Introductory call"), json!("Contract review")]
    );
    assert!(activities.iter().all(|a| a["Owner"] == json!(JANE)));
    assert_eq!(activities[0]["StartDate"], json!("2024-03-01T09:00:00Z"));

    assert_eq!(
        data.section("Environment").unwrap(),
        &[serde_json::from_value::<contact_report::report::ReportRow>(json!({
            "ApplicationUrl": "https://crm.example.com/app",
            "CurrentUser": "Supervisor"
        }))
        .unwrap()]
    );
}

#[tokio::test]
async fn test_zero_contacts_still_has_environment() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "compare", "column": "Name", "value": "Nobody"}),
    );
    let data = ContactReportDataProvider::new()
        .get_data(&connection(), &request(), &params)
        .await
        .unwrap();

    assert_eq!(data.len(), 3);
    assert!(data.section("Contact").unwrap().is_empty());
    assert!(data.section("Activity").unwrap().is_empty());
    assert_eq!(data.section("Environment").unwrap().len(), 1);
}

#[tokio::test]
async fn test_result_has_exactly_three_sections() {
    let data = ContactReportDataProvider::new()
        .get_data(&connection(), &request(), &jane_params())
        .await
        .unwrap();
    let names: Vec<&str> = data.section_names().collect();
    assert_eq!(names, vec!["Activity", "Contact", "Environment"]);
}

#[tokio::test]
async fn test_extraction_failure_issues_no_query() {
    let host = host();
    let counting = Arc::new(CountingExecutor {
        inner: Arc::clone(&host),
        queries: AtomicUsize::new(0),
    });
    let connection =
        UserConnection::new(host, counting.clone(), UserIdentity::named("Supervisor"));
    let provider = ContactReportDataProvider::new();

    let wrong_schema = ReportParameters::new()
        .with("EntitySchemaName", "Account")
        .with("RecordIds", json!([JANE]));
    let err = provider
        .get_data(&connection, &request(), &wrong_schema)
        .await
        .unwrap_err();
    assert!(err.is_filter_extraction());

    let err = provider
        .get_data(&connection, &request(), &ReportParameters::new())
        .await
        .unwrap_err();
    assert!(err.is_filter_extraction());

    assert_eq!(counting.queries.load(Ordering::SeqCst), 0);

    provider
        .get_data(&connection, &request(), &jane_params())
        .await
        .unwrap();
    assert_eq!(counting.queries.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_data_is_idempotent() {
    let connection = connection();
    let provider = ContactReportDataProvider::new();
    let first = provider
        .get_data(&connection, &request(), &jane_params())
        .await
        .unwrap();
    let second = provider
        .get_data(&connection, &request(), &jane_params())
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_activity_owners_are_selected_contacts() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "compare", "column": "Owner.Name", "value": "Supervisor"}),
    );
    let report = ContactReportDataProvider::new()
        .fetch(&connection(), &request(), &params)
        .await
        .unwrap();

    let contact_ids: HashSet<Uuid> = report.contacts.iter().map(|c| c.id).collect();
    assert_eq!(contact_ids.len(), 2);
    assert_eq!(report.activities.len(), 3);
    for activity in &report.activities {
        assert!(
            contact_ids.contains(&activity.owner),
            "activity {} owned by unselected contact",
            activity.title
        );
    }
}

#[tokio::test]
async fn test_lookup_fields_hold_labels() {
    let report = ContactReportDataProvider::new()
        .fetch(&connection(), &request(), &jane_params())
        .await
        .unwrap();
    let jane = &report.contacts[0];

    for label in [&jane.owner_name, &jane.country, &jane.region, &jane.city] {
        assert!(!label.is_empty());
        assert!(Uuid::parse_str(label).is_err(), "{label} is an identifier");
    }
}

#[tokio::test]
async fn test_unset_fields_are_empty() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "compare", "column": "Name", "value": "Supervisor"}),
    );
    let report = ContactReportDataProvider::new()
        .fetch(&connection(), &request(), &params)
        .await
        .unwrap();

    assert_eq!(report.contacts.len(), 1);
    let supervisor = &report.contacts[0];
    assert_eq!(supervisor.phone, "");
    assert_eq!(supervisor.owner_name, "");
    assert_eq!(supervisor.country, "");
    assert!(report.activities.is_empty());
}

#[tokio::test]
async fn test_parallel_and_sequential_fetch_agree() {
    let connection = connection();
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "is_null", "column": "Owner", "negated": true}),
    );

    let parallel = ContactReportDataProvider::new()
        .with_parallel_fetch(true)
        .fetch(&connection, &request(), &params)
        .await
        .unwrap();
    let sequential = ContactReportDataProvider::new()
        .with_parallel_fetch(false)
        .fetch(&connection, &request(), &params)
        .await
        .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.contacts.len(), 2);
}

#[tokio::test]
async fn test_missing_activity_schema_propagates() {
    let settings =
        ReportSettings::from_toml("[provider]\nactivity_schema_name = \"Task\"\n").unwrap();
    let provider = ContactReportDataProvider::from_settings(&settings).unwrap();

    let err = provider
        .get_data(&connection(), &request(), &jane_params())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::SchemaNotFound(ref name) if name == "Task"));
}

#[tokio::test]
async fn test_query_failure_propagates() {
    let host = host();
    let failing = Arc::new(FailingExecutor {
        inner: Arc::clone(&host),
        schema: "Activity",
    });
    let connection = UserConnection::new(host, failing, UserIdentity::named("Supervisor"));

    for parallel in [true, false] {
        let err = ContactReportDataProvider::new()
            .with_parallel_fetch(parallel)
            .get_data(&connection, &request(), &jane_params())
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                ReportError::QueryFailed { ref schema, ref message }
                    if schema == "Activity" && message == "timeout"
            ),
            "parallel_fetch = {parallel}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_configured_application_url_wins() {
    let provider =
        ContactReportDataProvider::new().with_application_url("https://public.example.com");
    let report = provider
        .fetch(&connection(), &request(), &jane_params())
        .await
        .unwrap();
    assert_eq!(report.environment[0].application_url, "https://public.example.com");
    assert_eq!(report.environment[0].current_user, "Supervisor");
}

#[tokio::test]
async fn test_forwarded_request_url() {
    let request = RequestContext::new("http", "10.0.0.5:5000")
        .with_path_base("/crm")
        .with_header("X-Forwarded-Proto", "https")
        .with_header("X-Forwarded-Host", "crm.example.com");
    let report = ContactReportDataProvider::new()
        .fetch(&connection(), &request, &jane_params())
        .await
        .unwrap();
    assert_eq!(report.environment[0].application_url, "https://crm.example.com/crm");
}

struct NamedContact(&'static str);

impl FilterExtractor for NamedContact {
    fn extract_filter(
        &self,
        _connection: &UserConnection,
        schema_name: &str,
        _parameters: &ReportParameters,
    ) -> Option<Filter> {
        assert_eq!(schema_name, "Contact");
        Some(column("Name").eq(self.0))
    }
}

#[tokio::test]
async fn test_custom_filter_extractor() {
    let provider =
        ContactReportDataProvider::new().with_filter_extractor(Arc::new(NamedContact("John Roe")));
    let data = provider
        .get_data(&connection(), &request(), &ReportParameters::new())
        .await
        .unwrap();

    let contacts = data.section(CONTACT_SECTION).unwrap();
    assert_eq!(column_of(contacts, "Id"), vec![json!(JOHN)]);
    assert_eq!(
        column_of(data.section("Activity").unwrap(), "Title"),
        vec![json!("Quarterly check-in")]
    );
}
