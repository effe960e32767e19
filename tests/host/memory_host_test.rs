//! MemoryHost query execution over the demo dataset.

use chrono::{DateTime, Utc};
use contact_report::prelude::*;
use contact_report::esq::Entity;
use uuid::Uuid;

const CRM: &str = include_str!("../../demos/crm.json");
const CONTACT_UID: &str = "16be3651-8fe2-4159-8dd0-a803d4683dd3";
const JANE: &str = "7f3b5a52-1c3e-4d8a-9a51-2a1e8c0d0001";

fn host() -> MemoryHost {
    MemoryHost::from_json(CRM).unwrap()
}

fn names(rows: &[Entity], column: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get_typed_column_value::<String>(column).unwrap())
        .collect()
}

async fn query(
    host: &MemoryHost,
    schema: &str,
    columns: &[&str],
    filter: Option<Filter>,
) -> Vec<Entity> {
    let mut esq = EntitySchemaQuery::new(host.get_instance_by_name(schema).unwrap());
    for column in columns {
        esq.add_column(column);
    }
    if let Some(filter) = filter {
        esq.filters.add(filter);
    }
    host.execute(&esq).await.unwrap().into_iter().collect()
}

#[test]
fn test_dataset_loads() {
    let host = host();
    assert_eq!(host.row_count("Contact"), 3);
    assert_eq!(host.row_count("Activity"), 4);
    assert_eq!(host.row_count("Unknown"), 0);

    let uid = Uuid::parse_str(CONTACT_UID).unwrap();
    assert_eq!(host.schema_name(uid).unwrap(), "Contact");
    assert_eq!(host.get_item_by_uid(uid).unwrap().caption.as_deref(), Some("Contact"));
}

#[test]
fn test_unknown_schema() {
    let host = host();
    assert!(matches!(
        host.get_instance_by_name("Task"),
        Err(ReportError::SchemaNotFound(_))
    ));
    assert!(host.get_instance_by_uid(Uuid::nil()).is_err());
}

#[test]
fn test_resolve_nested_path() {
    let host = host();
    let activity = host.get_instance_by_name("Activity").unwrap();
    let path = host.resolve_path(&activity, "Owner.Country.Name").unwrap();

    assert_eq!(path.len(), 3);
    assert_eq!(path.target_schema().name, "Country");
    assert_eq!(path.target_column().name, "Name");

    let err = host.resolve_path(&activity, "Title.Name").unwrap_err();
    assert!(matches!(err, ReportError::NotALookup { .. }));
}

#[test]
fn test_invalid_dataset() {
    let bad_value = r#"{"schemas": [{"uid": "16be3651-8fe2-4159-8dd0-a803d4683dd3",
        "name": "Contact", "columns": [{"name": "Id", "type": "guid"}]}],
        "rows": {"Contact": [{"Id": 5}]}}"#;
    assert!(matches!(
        MemoryHost::from_json(bad_value),
        Err(ReportError::InvalidValue { .. })
    ));
    assert!(matches!(MemoryHost::from_json("{"), Err(ReportError::Json(_))));
}

#[test]
fn test_lookup_without_reference_is_rejected() {
    let dangling = r#"{"schemas": [{"uid": "c449d832-a4cc-4b01-b9d5-8a12c42a9f89",
        "name": "Activity", "columns": [{"name": "Id", "type": "guid"},
        {"name": "Owner", "type": "lookup"}]}]}"#;
    let err = MemoryHost::from_json(dangling).unwrap_err();
    assert!(matches!(
        err,
        ReportError::InvalidSchema { ref schema, ref message }
            if schema == "Activity" && message.contains("'Owner'")
    ));

    let stray = r#"{"schemas": [{"uid": "c449d832-a4cc-4b01-b9d5-8a12c42a9f89",
        "name": "Activity", "columns": [{"name": "Id", "type": "guid"},
        {"name": "Title", "type": "text", "reference": "Contact"}]}]}"#;
    assert!(matches!(
        MemoryHost::from_json(stray),
        Err(ReportError::InvalidSchema { .. })
    ));
}

#[tokio::test]
async fn test_rows_in_insertion_order() {
    let rows = query(&host(), "Contact", &["Name"], None).await;
    assert_eq!(names(&rows, "Name"), vec!["Supervisor", "Jane Doe", "John Roe"]);
}

#[tokio::test]
async fn test_nested_column_projection() {
    let rows = query(
        &host(),
        "Activity",
        &["Title", "Owner.Id", "Owner.Country.Name"],
        Some(column("Title").eq("Introductory call")),
    )
    .await;

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(
        row.get_typed_column_value::<Uuid>("OwnerId").unwrap(),
        Uuid::parse_str(JANE).unwrap()
    );
    assert_eq!(
        row.get_typed_column_value::<String>("OwnerCountryName").unwrap(),
        "Kenya"
    );
}

#[tokio::test]
async fn test_unselected_column_is_an_error() {
    let rows = query(&host(), "Contact", &["Name"], None).await;
    let err = rows[0].get_typed_column_value::<String>("Email").unwrap_err();
    assert!(matches!(err, ReportError::ColumnNotFound { .. }));
}

#[tokio::test]
async fn test_null_dates_read_as_epoch() {
    let rows = query(
        &host(),
        "Activity",
        &["DueDate", "Owner.Id"],
        Some(column("Owner").is_null()),
    )
    .await;

    assert_eq!(rows.len(), 1);
    let due: DateTime<Utc> = rows[0].get_typed_column_value("DueDate").unwrap();
    assert_eq!(due.timestamp(), 0);
    assert!(rows[0].get_typed_column_value::<Uuid>("OwnerId").unwrap().is_nil());
}

#[tokio::test]
async fn test_text_matching_ignores_case() {
    let host = host();
    let email_filter = column("Email").ends_with("EXAMPLE.COM");
    let rows = query(&host, "Contact", &["Name"], Some(email_filter)).await;
    assert_eq!(rows.len(), 3);

    let rows = query(&host, "Contact", &["Name"], Some(column("Name").contains("ROE"))).await;
    assert_eq!(names(&rows, "Name"), vec!["John Roe"]);
}

#[tokio::test]
async fn test_date_range_filter() {
    let from: DateTime<Utc> = "2024-03-02T00:00:00Z".parse().unwrap();
    let to: DateTime<Utc> = "2024-03-07T23:59:59Z".parse().unwrap();
    let rows = query(
        &host(),
        "Activity",
        &["Title"],
        Some(column("StartDate").gte(from).and(column("StartDate").lte(to))),
    )
    .await;
    assert_eq!(names(&rows, "Title"), vec!["Contract review", "Quarterly check-in"]);
}

#[tokio::test]
async fn test_exists_sub_query() {
    let host = host();
    let activity = host.get_instance_by_name("Activity").unwrap();
    let mut esq = EntitySchemaQuery::new(activity);
    esq.add_column("Title");

    let mut owner = esq.create_sub_query_expression("Owner.Id").unwrap();
    owner
        .sub_query
        .filters
        .add(column("Country.Name").eq("Canada"));
    insta::assert_snapshot!(
        Filter::exists(owner.clone()).to_string(),
        @"EXISTS(Contact ON [Owner.Id] WHERE [Country.Name] = 'Canada')"
    );
    esq.filters.add(Filter::exists(owner.clone()));

    let rows: Vec<Entity> = host.execute(&esq).await.unwrap().into_iter().collect();
    assert_eq!(names(&rows, "Title"), vec!["Quarterly check-in"]);

    let mut esq = EntitySchemaQuery::new(host.get_instance_by_name("Activity").unwrap());
    esq.add_column("Title");
    esq.filters.add(Filter::not_exists(owner));
    let rows: Vec<Entity> = host.execute(&esq).await.unwrap().into_iter().collect();
    assert_eq!(
        names(&rows, "Title"),
        vec!["Introductory call", "Contract review", "Unassigned follow-up"]
    );
}

#[tokio::test]
async fn test_sub_query_needs_lookup() {
    let host = host();
    let esq = EntitySchemaQuery::new(host.get_instance_by_name("Activity").unwrap());
    assert!(matches!(
        esq.create_sub_query_expression("Title"),
        Err(ReportError::NotALookup { .. })
    ));
}

#[tokio::test]
async fn test_query_through_connection() {
    let connection = UserConnection::with_host(
        std::sync::Arc::new(host()),
        UserIdentity::named("Supervisor"),
    );
    let schema = connection
        .entity_schema_manager()
        .get_instance_by_name("Contact")
        .unwrap();
    let mut esq = EntitySchemaQuery::new(schema);
    let city = esq.add_column("City");
    esq.filters.add(column("Id").eq(Uuid::parse_str(JANE).unwrap()));

    let rows = esq.get_entity_collection(&connection).await.unwrap();
    assert_eq!(rows.len(), 1);
    let jane = rows.iter().next().unwrap();
    assert_eq!(
        jane.get_typed_column_value::<String>(&format!("{}Name", city.name)).unwrap(),
        "Nairobi"
    );
}
