//! Report data providers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::parameters::{FilterExtractor, ReportParameterFilterExtractor, ReportParameters};
use super::records::{
    ActivityRecord, ContactRecord, ContactReport, EnvironmentRecord, ReportDataDictionary,
};
use crate::config::{ProviderSettings, ReportSettings};
use crate::error::{ReportError, ReportResult};
use crate::esq::{Entity, EntitySchemaQuery, Filter};
use crate::host::{RequestContext, UserConnection};

/// Source of the sectioned data a report template renders.
#[async_trait]
pub trait ReportDataProvider: Send + Sync {
    /// Name the provider is registered under.
    fn name(&self) -> &str;

    /// Assemble all sections for one report render.
    async fn get_data(
        &self,
        connection: &UserConnection,
        request: &RequestContext,
        parameters: &ReportParameters,
    ) -> ReportResult<ReportDataDictionary>;
}

/// Contacts selected by the report parameters, the activities they own,
/// and the environment the report was rendered in.
pub struct ContactReportDataProvider {
    contact_schema_uid: Uuid,
    activity_schema_name: String,
    parallel_fetch: bool,
    application_url: Option<String>,
    filter_extractor: Arc<dyn FilterExtractor>,
}

impl ContactReportDataProvider {
    pub const NAME: &'static str = "ContactReportDataProvider";

    pub fn new() -> Self {
        let defaults = ProviderSettings::default();
        Self {
            contact_schema_uid: defaults.contact_schema_uid,
            activity_schema_name: defaults.activity_schema_name,
            parallel_fetch: defaults.parallel_fetch,
            application_url: None,
            filter_extractor: Arc::new(ReportParameterFilterExtractor),
        }
    }

    /// Create a provider from loaded settings.
    ///
    /// Fails when the configured application URL references an unset
    /// environment variable.
    pub fn from_settings(settings: &ReportSettings) -> ReportResult<Self> {
        Ok(Self {
            contact_schema_uid: settings.provider.contact_schema_uid,
            activity_schema_name: settings.provider.activity_schema_name.clone(),
            parallel_fetch: settings.provider.parallel_fetch,
            application_url: settings.environment.resolved_application_url()?,
            filter_extractor: Arc::new(ReportParameterFilterExtractor),
        })
    }

    pub fn with_filter_extractor(mut self, extractor: Arc<dyn FilterExtractor>) -> Self {
        self.filter_extractor = extractor;
        self
    }

    pub fn with_parallel_fetch(mut self, parallel: bool) -> Self {
        self.parallel_fetch = parallel;
        self
    }

    /// Report this URL instead of the one derived from the request.
    pub fn with_application_url(mut self, url: impl Into<String>) -> Self {
        self.application_url = Some(url.into());
        self
    }

    /// Fetch all three sections as typed records.
    ///
    /// The filter is extracted before any query runs; a rejected parameter
    /// map fails with [`ReportError::FilterExtraction`].
    pub async fn fetch(
        &self,
        connection: &UserConnection,
        request: &RequestContext,
        parameters: &ReportParameters,
    ) -> ReportResult<ContactReport> {
        let filter = self.extract_filter(connection, self.contact_schema_uid, parameters)?;

        let (contacts, activities, environment) = if self.parallel_fetch {
            tokio::try_join!(
                self.get_contact_data(connection, self.contact_schema_uid, &filter),
                self.get_activity_data(connection, &filter),
                async { Ok::<_, ReportError>(self.get_settings_data(connection, request)) },
            )?
        } else {
            let contacts = self
                .get_contact_data(connection, self.contact_schema_uid, &filter)
                .await?;
            let activities = self.get_activity_data(connection, &filter).await?;
            (contacts, activities, self.get_settings_data(connection, request))
        };

        Ok(ContactReport {
            contacts,
            activities,
            environment,
        })
    }

    /// Convert the parameters into a filter on the schema `schema_uid` names.
    pub fn extract_filter(
        &self,
        connection: &UserConnection,
        schema_uid: Uuid,
        parameters: &ReportParameters,
    ) -> ReportResult<Filter> {
        let item = connection.entity_schema_manager().get_item_by_uid(schema_uid)?;
        self.filter_extractor
            .extract_filter(connection, &item.name, parameters)
            .ok_or(ReportError::FilterExtraction)
    }

    /// Contacts matching `filter`, in store order.
    pub async fn get_contact_data(
        &self,
        connection: &UserConnection,
        schema_uid: Uuid,
        filter: &Filter,
    ) -> ReportResult<Vec<ContactRecord>> {
        let schema = connection
            .entity_schema_manager()
            .get_instance_by_uid(schema_uid)?;
        let mut esq = EntitySchemaQuery::new(Arc::clone(&schema));

        let id = esq.add_column(&schema.primary_column_name);
        let name = esq.add_column("Name");
        let phone = esq.add_column("Phone");
        let home_phone = esq.add_column("HomePhone");
        let mobile_phone = esq.add_column("MobilePhone");
        let email = esq.add_column("Email");
        let address = esq.add_column("Address");
        let zip = esq.add_column("Zip");
        for lookup in ["Owner", "Country", "Region", "City"] {
            esq.add_column(lookup);
        }
        esq.filters.add(filter.clone());

        let entities = esq.get_entity_collection(connection).await?;
        entities
            .iter()
            .map(|entity| -> ReportResult<ContactRecord> {
                Ok(ContactRecord {
                    name: entity.get_typed_column_value(&name.name)?,
                    phone: entity.get_typed_column_value(&phone.name)?,
                    home_phone: entity.get_typed_column_value(&home_phone.name)?,
                    mobile_phone: entity.get_typed_column_value(&mobile_phone.name)?,
                    id: entity.get_typed_column_value(&id.name)?,
                    email: entity.get_typed_column_value(&email.name)?,
                    address: entity.get_typed_column_value(&address.name)?,
                    zip: entity.get_typed_column_value(&zip.name)?,
                    owner_name: display_value(entity, "Owner")?,
                    city: display_value(entity, "City")?,
                    region: display_value(entity, "Region")?,
                    country: display_value(entity, "Country")?,
                })
            })
            .collect()
    }

    /// Activities whose owner is a contact matching `filter`.
    pub async fn get_activity_data(
        &self,
        connection: &UserConnection,
        filter: &Filter,
    ) -> ReportResult<Vec<ActivityRecord>> {
        let schema = connection
            .entity_schema_manager()
            .get_instance_by_name(&self.activity_schema_name)?;
        let mut esq = EntitySchemaQuery::new(Arc::clone(&schema));

        let id = esq.add_column(&schema.primary_column_name);
        let title = esq.add_column("Title");
        let start_date = esq.add_column("StartDate");
        let due_date = esq.add_column("DueDate");
        let owner = esq.add_column("Owner.Id");

        let mut owned_by_contact = esq.create_sub_query_expression("Owner.Id")?;
        owned_by_contact.sub_query.filters.add(filter.clone());
        esq.filters.add(Filter::exists(owned_by_contact));

        let entities = esq.get_entity_collection(connection).await?;
        entities
            .iter()
            .map(|entity| -> ReportResult<ActivityRecord> {
                Ok(ActivityRecord {
                    owner: entity.get_typed_column_value(&owner.name)?,
                    id: entity.get_typed_column_value(&id.name)?,
                    title: entity.get_typed_column_value(&title.name)?,
                    start_date: entity.get_typed_column_value(&start_date.name)?,
                    due_date: entity.get_typed_column_value(&due_date.name)?,
                })
            })
            .collect()
    }

    /// The single environment row.
    pub fn get_settings_data(
        &self,
        connection: &UserConnection,
        request: &RequestContext,
    ) -> Vec<EnvironmentRecord> {
        let application_url = self
            .application_url
            .clone()
            .unwrap_or_else(|| request.base_application_url());

        vec![EnvironmentRecord {
            application_url,
            current_user: connection.current_user().contact_name.clone(),
        }]
    }
}

/// Label of the row a lookup column references.
fn display_value(entity: &Entity, column: &str) -> ReportResult<String> {
    let name = entity.schema().column(column)?.display_column_value_name();
    entity.get_typed_column_value(&name)
}

impl Default for ContactReportDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContactReportDataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactReportDataProvider")
            .field("contact_schema_uid", &self.contact_schema_uid)
            .field("activity_schema_name", &self.activity_schema_name)
            .field("parallel_fetch", &self.parallel_fetch)
            .field("application_url", &self.application_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReportDataProvider for ContactReportDataProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn get_data(
        &self,
        connection: &UserConnection,
        request: &RequestContext,
        parameters: &ReportParameters,
    ) -> ReportResult<ReportDataDictionary> {
        let span = info_span!(
            "report",
            provider = Self::NAME,
            user = %connection.current_user().contact_name,
        );

        async move {
            let report = self.fetch(connection, request, parameters).await?;
            info!(
                contacts = report.contacts.len(),
                activities = report.activities.len(),
                "report data assembled"
            );
            report.into_data_dictionary()
        }
        .instrument(span)
        .await
    }
}
