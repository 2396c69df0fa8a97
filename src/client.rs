use reqwest::{Method, StatusCode, header};
use serde::de::DeserializeOwned;
use url::Url;

use crate::endpoints::Resource;
use crate::entities::{
    account::{self, Account},
    bill::{self, Bill},
    company_info::{self, CompanyInfo},
    credit_memo::{self, CreditMemo},
    customer::{self, Customer},
    estimate::{self, Estimate},
    invoice::{self, Invoice},
    payment::{self, Payment},
};
use crate::error::{Error, Result};
use crate::oauth::AuthProvider;
use crate::query::{Page, QueryBuilder, QueryMeta, SearchOptions, next_page_hint};

/// The client used for interacting with the QuickBooks Online API.
///
/// Owns the [`AuthProvider`]; every request asks it for a valid token, which is
/// the one place automatic token refresh happens. Requests are not retried.
#[derive(Debug)]
pub struct Client {
    auth: AuthProvider,
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    #[must_use]
    pub fn new(auth: AuthProvider) -> Self {
        let base_url = auth.environment().api_base_url();
        Self {
            auth,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Overrides the resource API base URL, e.g. to point at a local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// The auth provider driving this client's token lifecycle.
    #[must_use]
    pub fn auth(&self) -> &AuthProvider {
        &self.auth
    }

    /// A query builder bound to the current realm.
    pub async fn query_builder(&self, resource: Resource) -> Result<QueryBuilder> {
        let token = self.auth.get_token().await?;
        Ok(QueryBuilder::new(
            self.base_url.clone(),
            token.realm_id().to_string(),
            resource,
        ))
    }

    /// Perform an authenticated `GET` request against the API.
    #[instrument(skip(self))]
    pub(crate) async fn get<R: DeserializeOwned>(&self, url: Url) -> Result<R> {
        let token = self.auth.get_token().await?;
        trace!(%url, "making GET request");
        let response = self
            .http
            .request(Method::GET, url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.access_token()),
            )
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::OK {
            serde_json::from_str(&body).map_err(|e| {
                error!("failed to deserialize response: {e}");
                Error::Deserialization(e, Some(body))
            })
        } else {
            error!(%status, %url, "request failed");
            Err(Error::Api {
                status,
                url: url.to_string(),
                body,
            })
        }
    }

    /// Runs a query and reshapes the `QueryResponse` envelope into a [`Page`].
    pub(crate) async fn run_query<T: DeserializeOwned>(
        &self,
        builder: &QueryBuilder,
    ) -> Result<Page<T>> {
        let value: serde_json::Value = self.get(builder.build()?).await?;
        let (results, meta) = extract_query_response::<T>(&value, builder.query().resource())?;
        let has_next_page = self.has_next_page(builder, results.len(), &meta).await?;
        Ok(Page {
            results,
            has_next_page,
        })
    }

    /// Decides whether a fetched page has a successor.
    ///
    /// Prefers the envelope's `totalCount`; when the envelope is silent and the
    /// page came back full, issues one lightweight probe with an advanced
    /// `start_position` and `MAXRESULTS 1`.
    pub(crate) async fn has_next_page(
        &self,
        builder: &QueryBuilder,
        returned: usize,
        meta: &QueryMeta,
    ) -> Result<bool> {
        let query = builder.query();
        if let Some(decided) =
            next_page_hint(query.start_position(), query.max_results(), returned, meta)
        {
            return Ok(decided);
        }

        trace!("envelope has no totalCount, probing for a next page");
        let mut probe = builder.advanced();
        probe.max_results(1);
        let value: serde_json::Value = self.get(probe.build()?).await?;
        let (rows, _) = extract_query_response::<serde_json::Value>(&value, query.resource())?;
        Ok(!rows.is_empty())
    }

    /// Access the accounts API
    #[must_use]
    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi { client: self }
    }

    /// Access the bills API
    #[must_use]
    pub fn bills(&self) -> BillsApi<'_> {
        BillsApi { client: self }
    }

    /// Access the company info API
    #[must_use]
    pub fn company_info(&self) -> CompanyInfoApi<'_> {
        CompanyInfoApi { client: self }
    }

    /// Access the credit memos API
    #[must_use]
    pub fn credit_memos(&self) -> CreditMemosApi<'_> {
        CreditMemosApi { client: self }
    }

    /// Access the customers API
    #[must_use]
    pub fn customers(&self) -> CustomersApi<'_> {
        CustomersApi { client: self }
    }

    /// Access the estimates API
    #[must_use]
    pub fn estimates(&self) -> EstimatesApi<'_> {
        EstimatesApi { client: self }
    }

    /// Access the invoices API
    #[must_use]
    pub fn invoices(&self) -> InvoicesApi<'_> {
        InvoicesApi { client: self }
    }

    /// Access the payments API
    #[must_use]
    pub fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi { client: self }
    }
}

/// Pulls the resource array and pagination metadata out of a `QueryResponse`
/// envelope. An envelope with no rows omits the array key entirely.
fn extract_query_response<T: DeserializeOwned>(
    value: &serde_json::Value,
    resource: Resource,
) -> Result<(Vec<T>, QueryMeta)> {
    let Some(query_response) = value.get("QueryResponse") else {
        return Ok((Vec::new(), QueryMeta::default()));
    };
    let meta: QueryMeta = serde_json::from_value(query_response.clone())?;
    let results = match query_response.get(resource.name()) {
        Some(rows) => serde_json::from_value(rows.clone())?,
        None => Vec::new(),
    };
    Ok((results, meta))
}

/// API handler for Accounts endpoints
#[derive(Debug)]
pub struct AccountsApi<'a> {
    client: &'a Client,
}

impl AccountsApi<'_> {
    /// Search accounts with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Account>> {
        account::search(self.client, options).await
    }

    /// Retrieve accounts created within a date range.
    #[instrument(skip(self, options))]
    pub async fn created_in_range(
        &self,
        start: time::OffsetDateTime,
        end: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Account>> {
        account::created_in_range(self.client, start, end, options).await
    }
}

/// API handler for Bills endpoints
#[derive(Debug)]
pub struct BillsApi<'a> {
    client: &'a Client,
}

impl BillsApi<'_> {
    /// Search bills with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Bill>> {
        bill::search(self.client, options).await
    }

    /// Retrieve bills modified after the given timestamp.
    #[instrument(skip(self, options))]
    pub async fn updated_since(
        &self,
        since: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Bill>> {
        bill::updated_since(self.client, since, options).await
    }
}

/// API handler for CompanyInfo
#[derive(Debug)]
pub struct CompanyInfoApi<'a> {
    client: &'a Client,
}

impl CompanyInfoApi<'_> {
    /// Retrieve the company information for the current realm.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<CompanyInfo> {
        company_info::get(self.client).await
    }
}

/// API handler for Credit Memos endpoints
#[derive(Debug)]
pub struct CreditMemosApi<'a> {
    client: &'a Client,
}

impl CreditMemosApi<'_> {
    /// Search credit memos with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<CreditMemo>> {
        credit_memo::search(self.client, options).await
    }

    /// Retrieve credit memos modified after the given timestamp.
    #[instrument(skip(self, options))]
    pub async fn updated_since(
        &self,
        since: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<CreditMemo>> {
        credit_memo::updated_since(self.client, since, options).await
    }
}

/// API handler for Customers endpoints
#[derive(Debug)]
pub struct CustomersApi<'a> {
    client: &'a Client,
}

impl CustomersApi<'_> {
    /// Search customers with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Customer>> {
        customer::search(self.client, options).await
    }

    /// Retrieve customers modified after the given timestamp.
    #[instrument(skip(self, options))]
    pub async fn updated_since(
        &self,
        since: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Customer>> {
        customer::updated_since(self.client, since, options).await
    }
}

/// API handler for Estimates endpoints
#[derive(Debug)]
pub struct EstimatesApi<'a> {
    client: &'a Client,
}

impl EstimatesApi<'_> {
    /// Search estimates with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Estimate>> {
        estimate::search(self.client, options).await
    }

    /// Retrieve estimates last updated within a date range.
    #[instrument(skip(self, options))]
    pub async fn for_date_range(
        &self,
        start: time::OffsetDateTime,
        end: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Estimate>> {
        estimate::updated_in_range(self.client, start, end, options).await
    }
}

/// API handler for Invoices endpoints
#[derive(Debug)]
pub struct InvoicesApi<'a> {
    client: &'a Client,
}

impl InvoicesApi<'_> {
    /// Search invoices with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Invoice>> {
        invoice::search(self.client, options).await
    }

    /// Retrieve invoices modified after the given timestamp.
    #[instrument(skip(self, options))]
    pub async fn updated_since(
        &self,
        since: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Invoice>> {
        invoice::updated_since(self.client, since, options).await
    }
}

/// API handler for Payments endpoints
#[derive(Debug)]
pub struct PaymentsApi<'a> {
    client: &'a Client,
}

impl PaymentsApi<'_> {
    /// Search payments with the given options.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchOptions) -> Result<Page<Payment>> {
        payment::search(self.client, options).await
    }

    /// Retrieve payments modified after the given timestamp.
    #[instrument(skip(self, options))]
    pub async fn updated_since(
        &self,
        since: time::OffsetDateTime,
        options: &SearchOptions,
    ) -> Result<Page<Payment>> {
        payment::updated_since(self.client, since, options).await
    }
}
