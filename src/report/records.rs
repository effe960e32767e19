//! Typed section records and the dictionary shape handed to the renderer.
//!
//! Field names serialize in PascalCase because report templates bind to them
//! by name.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ReportResult;

pub const CONTACT_SECTION: &str = "Contact";
pub const ACTIVITY_SECTION: &str = "Activity";
pub const ENVIRONMENT_SECTION: &str = "Environment";

/// One contact row. Lookup fields hold the referenced row's label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    pub home_phone: String,
    pub mobile_phone: String,
    pub id: Uuid,
    pub email: String,
    pub address: String,
    pub zip: String,
    pub owner_name: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

/// One activity row owned by a selected contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityRecord {
    /// Identifier of the owning contact.
    pub owner: Uuid,
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentRecord {
    pub application_url: String,
    pub current_user: String,
}

/// The three sections of a contact report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactReport {
    #[serde(rename = "Contact")]
    pub contacts: Vec<ContactRecord>,
    #[serde(rename = "Activity")]
    pub activities: Vec<ActivityRecord>,
    #[serde(rename = "Environment")]
    pub environment: Vec<EnvironmentRecord>,
}

impl ContactReport {
    /// Flatten the typed sections into the renderer's dictionary shape.
    pub fn into_data_dictionary(self) -> ReportResult<ReportDataDictionary> {
        let mut dictionary = ReportDataDictionary::new();
        dictionary.insert_section(CONTACT_SECTION, to_rows(&self.contacts)?);
        dictionary.insert_section(ACTIVITY_SECTION, to_rows(&self.activities)?);
        dictionary.insert_section(ENVIRONMENT_SECTION, to_rows(&self.environment)?);
        Ok(dictionary)
    }
}

/// A flat key/value row.
pub type ReportRow = Map<String, Value>;

fn to_rows<T: Serialize>(records: &[T]) -> ReportResult<Vec<ReportRow>> {
    records
        .iter()
        .map(|record| -> ReportResult<ReportRow> {
            Ok(serde_json::from_value(serde_json::to_value(record)?)?)
        })
        .collect()
}

/// Section name to ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportDataDictionary(BTreeMap<String, Vec<ReportRow>>);

impl ReportDataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_section(&mut self, name: &str, rows: Vec<ReportRow>) {
        self.0.insert(name.to_string(), rows);
    }

    pub fn section(&self, name: &str) -> Option<&[ReportRow]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
