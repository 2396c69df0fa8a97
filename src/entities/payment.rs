use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::endpoints::Resource;
use crate::entities::{EntityRef, MetaData};
use crate::error::Result;
use crate::query::{Page, QueryBuilder, SearchOptions};
use crate::utils::date_format::qb_date_option;
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::Payment;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Payment {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    #[serde(default, with = "qb_date_option")]
    pub txn_date: Option<Date>,
    pub customer_ref: EntityRef,
    pub total_amt: Decimal,
    pub unapplied_amt: Option<Decimal>,
    pub payment_ref_num: Option<String>,
}

/// Payment-specific query predicates.
pub trait PaymentQueryExt {
    /// Filters on the paying customer's id.
    fn where_customer_id(&mut self, customer_id: &str) -> &mut Self;
}

impl PaymentQueryExt for QueryBuilder {
    fn where_customer_id(&mut self, customer_id: &str) -> &mut Self {
        self.push_where(format!("CustomerRef.value = '{customer_id}'"))
    }
}

/// Search payments with the given options.
#[instrument(skip(client, options))]
pub async fn search(client: &Client, options: &SearchOptions) -> Result<Page<Payment>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.set_search_options(options);
    client.run_query(&builder).await
}

/// Retrieve payments modified after the given timestamp.
#[instrument(skip(client, options))]
pub async fn updated_since(
    client: &Client,
    since: OffsetDateTime,
    options: &SearchOptions,
) -> Result<Page<Payment>> {
    let mut builder = client.query_builder(RESOURCE).await?;
    builder.where_last_updated_after(since);
    builder.set_search_options(options);
    client.run_query(&builder).await
}
