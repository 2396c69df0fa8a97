use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::endpoints::Resource;
use crate::entities::{EntityRef, MetaData};
use crate::error::Result;
use crate::query::{Page, QueryBuilder, SearchOptions};
use crate::utils::date_format::qb_date_option;
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::Bill;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bill {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    #[serde(default, with = "qb_date_option")]
    pub txn_date: Option<Date>,
    #[serde(default, with = "qb_date_option")]
    pub due_date: Option<Date>,
    pub vendor_ref: EntityRef,
    pub total_amt: Decimal,
    pub balance: Option<Decimal>,
}

/// Bill-specific query predicates.
pub trait BillQueryExt {
    /// Filters on the owning vendor's id.
    fn where_vendor_id(&mut self, vendor_id: &str) -> &mut Self;
}

impl BillQueryExt for QueryBuilder {
    fn where_vendor_id(&mut self, vendor_id: &str) -> &mut Self {
        self.push_where(format!("VendorRef.value = '{vendor_id}'"))
    }
}

/// Search bills with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<Bill>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve bills modified after the given timestamp.
#[instrument(skip(client, options))]
pub async fn updated_since(
    client: &Client,
    since: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<Bill>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_last_updated_after(since);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
