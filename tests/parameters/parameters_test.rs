//! Conversion of report parameters into contact filters.

use std::sync::Arc;

use contact_report::prelude::*;
use contact_report::report::{ParameterError, ReportParameterFilterExtractor};
use serde_json::json;

const CRM: &str = include_str!("../../demos/crm.json");
const JANE: &str = "7f3b5a52-1c3e-4d8a-9a51-2a1e8c0d0001";

fn connection() -> UserConnection {
    UserConnection::with_host(
        Arc::new(MemoryHost::from_json(CRM).unwrap()),
        UserIdentity::named("Supervisor"),
    )
}

/// Filter text with Jane's id shortened for readable snapshots.
fn rendered(filter: &Filter) -> String {
    filter.to_string().replace(JANE, "<jane>")
}

fn extract(params: &ReportParameters) -> Result<Option<Filter>, ParameterError> {
    ReportParameterFilterExtractor.try_extract(&connection(), "Contact", params)
}

#[test]
fn test_record_id() {
    let params = ReportParameters::new().with("RecordId", JANE);
    let filter = extract(&params).unwrap().unwrap();
    insta::assert_snapshot!(rendered(&filter), @"[Id] IN ('<jane>')");
}

#[test]
fn test_record_ids_and_filters_combine() {
    let params = ReportParameters::new()
        .with("EntitySchemaName", "Contact")
        .with("RecordIds", json!([JANE]))
        .with(
            "Filters",
            json!({
                "type": "group",
                "logical": "or",
                "items": [
                    {"type": "compare", "column": "Country.Name", "value": "Kenya"},
                    {"type": "compare", "column": "Email", "comparison": "contain", "value": "doe"}
                ]
            }),
        );
    let filter = extract(&params).unwrap().unwrap();
    insta::assert_snapshot!(
        rendered(&filter),
        @"([Id] IN ('<jane>') AND ([Country.Name] = 'Kenya' OR [Email] CONTAINS 'doe'))"
    );
}

#[test]
fn test_no_filter_parameters() {
    let params = ReportParameters::new().with("EntitySchemaName", "Contact");
    assert!(extract(&params).unwrap().is_none());
    assert!(params.extract_esq_filter(&connection(), "Contact").is_none());
}

#[test]
fn test_wrong_schema_rejected() {
    let params = ReportParameters::new()
        .with("EntitySchemaName", "Activity")
        .with("RecordId", JANE);
    assert!(matches!(
        extract(&params),
        Err(ParameterError::SchemaMismatch { ref found, .. }) if found == "Activity"
    ));
    assert!(params.extract_esq_filter(&connection(), "Contact").is_none());
}

#[test]
fn test_unknown_filter_column_rejected() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "compare", "column": "Fax", "value": "1"}),
    );
    let err = extract(&params).unwrap_err();
    assert!(matches!(err, ParameterError::Lowering(ref e) if e.is_metadata_error()));
}

#[test]
fn test_mistyped_filter_value_rejected() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "in", "column": "Id", "values": ["not-a-uuid"]}),
    );
    assert!(matches!(
        extract(&params),
        Err(ParameterError::Lowering(ReportError::InvalidValue { .. }))
    ));
}

#[test]
fn test_text_match_on_lookup_rejected() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "compare", "column": "Country", "comparison": "start_with", "value": "Ke"}),
    );
    assert!(extract(&params).is_err());
}

#[test]
fn test_malformed_filter_tree_rejected() {
    let params = ReportParameters::new().with("Filters", json!({"type": "between"}));
    assert!(matches!(extract(&params), Err(ParameterError::InvalidFilters(_))));
}

#[test]
fn test_not_and_is_null() {
    let params = ReportParameters::new().with(
        "Filters",
        json!({"type": "not", "filter": {"type": "is_null", "column": "Owner"}}),
    );
    let filter = extract(&params).unwrap().unwrap();
    insta::assert_snapshot!(filter.to_string(), @"NOT ([Owner] IS NULL)");
}
