use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::endpoints::Resource;
use crate::entities::MetaData;
use crate::error::Result;
use crate::query::{Page, QueryBuilder, SearchOptions};
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::Customer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    pub display_name: String,
    pub company_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub balance: Option<Decimal>,
}

/// Customer-specific query predicates.
pub trait CustomerQueryExt {
    /// Filters on the customer display name.
    fn where_display_name(&mut self, display_name: &str) -> &mut Self;
    /// Filters on active/inactive customers.
    fn where_active(&mut self, active: bool) -> &mut Self;
}

impl CustomerQueryExt for QueryBuilder {
    fn where_display_name(&mut self, display_name: &str) -> &mut Self {
        self.push_where(format!("DisplayName = '{display_name}'"))
    }

    fn where_active(&mut self, active: bool) -> &mut Self {
        self.push_where(format!("Active = {active}"))
    }
}

/// Search customers with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<Customer>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve customers modified after the given timestamp.
#[instrument(skip(client, options))]
pub async fn updated_since(
    client: &Client,
    since: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<Customer>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_last_updated_after(since);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
