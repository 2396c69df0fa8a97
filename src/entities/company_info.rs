use serde::{Deserialize, Serialize};
use time::Date;

use crate::endpoints::Resource;
use crate::entities::MetaData;
use crate::error::{Error, Result};
use crate::utils::date_format::qb_date_option;
use crate::Client;

pub(crate) const RESOURCE: Resource = Resource::CompanyInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyInfo {
    pub id: String,
    pub sync_token: String,
    pub meta_data: MetaData,
    pub company_name: String,
    pub legal_name: Option<String>,
    pub country: Option<String>,
    #[serde(default, with = "qb_date_option")]
    pub company_start_date: Option<Date>,
}

/// Retrieve the company information for the current realm.
///
/// A realm has exactly one `CompanyInfo` row, so this is a single-row query.
#[instrument(skip(client))]
pub async fn get(client: &Client) -> Result<CompanyInfo> {
    let builder = client.query_builder(RESOURCE).await?;
    let page = client.run_query::<CompanyInfo>(&builder).await?;
    page.results.into_iter().next().ok_or(Error::NotFound {
        entity: "CompanyInfo".to_string(),
    })
}
