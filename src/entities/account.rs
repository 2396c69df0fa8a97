use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::endpoints::Resource;
use crate::entities::{MetaData, validate_date_range};
use crate::error::Result;
use crate::query::{Page, SearchOptions};
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::Account;

/// Account classifications in QuickBooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountClassification {
    Asset,
    Equity,
    Expense,
    Liability,
    Revenue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    pub name: String,
    pub fully_qualified_name: Option<String>,
    pub account_type: String,
    pub account_sub_type: Option<String>,
    pub classification: Option<AccountClassification>,
    #[serde(default)]
    pub active: bool,
    pub current_balance: Option<Decimal>,
}

/// Search accounts with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<Account>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve accounts created within `[start, end]`.
///
/// Rejects `start > end` with a validation error before any request is made.
#[instrument(skip(client, options))]
pub async fn created_in_range(
    client: &Client,
    start: OffsetDateTime,
    end: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<Account>> {
    validate_date_range(start, end)?;
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_created_after(start);
    builder.where_created_before(end);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
