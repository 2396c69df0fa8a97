use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::endpoints::Resource;
use crate::entities::{EntityRef, MetaData, validate_date_range};
use crate::error::Result;
use crate::query::{Page, SearchOptions};
use crate::utils::date_format::qb_date_option;
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::Estimate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Estimate {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    pub doc_number: Option<String>,
    #[serde(default, with = "qb_date_option")]
    pub txn_date: Option<Date>,
    #[serde(default, with = "qb_date_option")]
    pub expiration_date: Option<Date>,
    pub txn_status: Option<String>,
    pub customer_ref: EntityRef,
    pub total_amt: Decimal,
}

/// Search estimates with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<Estimate>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve estimates last updated within `[start, end]`.
///
/// Rejects `start > end` with a validation error before any request is made.
#[instrument(skip(client, options))]
pub async fn updated_in_range(
    client: &Client,
    start: OffsetDateTime,
    end: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<Estimate>> {
    validate_date_range(start, end)?;
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_last_updated_after(start);
    builder.where_last_updated_before(end);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
