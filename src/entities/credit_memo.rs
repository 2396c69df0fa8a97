use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::endpoints::Resource;
use crate::entities::{EntityRef, MetaData};
use crate::error::Result;
use crate::query::{Page, QueryBuilder, SearchOptions, format_timestamp};
use crate::utils::date_format::qb_date_option;
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::CreditMemo;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreditMemo {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    pub doc_number: Option<String>,
    #[serde(default, with = "qb_date_option")]
    pub txn_date: Option<Date>,
    pub customer_ref: EntityRef,
    pub total_amt: Decimal,
    pub remaining_credit: Option<Decimal>,
}

/// Credit-memo-specific query predicates.
pub trait CreditMemoQueryExt {
    /// Filters on the credit memo due date. The timestamp is embedded as a
    /// single-quoted ISO-8601 literal.
    fn where_due_date(&mut self, date: OffsetDateTime) -> &mut Self;
    /// Filters on the owning customer's id.
    fn where_customer_id(&mut self, customer_id: &str) -> &mut Self;
}

impl CreditMemoQueryExt for QueryBuilder {
    fn where_due_date(&mut self, date: OffsetDateTime) -> &mut Self {
        let ts = format_timestamp(date);
        self.push_where(format!("DueDate = '{ts}'"))
    }

    fn where_customer_id(&mut self, customer_id: &str) -> &mut Self {
        self.push_where(format!("CustomerRef.value = '{customer_id}'"))
    }
}

/// Search credit memos with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<CreditMemo>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve credit memos modified after the given timestamp.
#[instrument(skip(client, options))]
pub async fn updated_since(
    client: &Client,
    since: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<CreditMemo>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_last_updated_after(since);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
