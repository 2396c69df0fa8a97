use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::endpoints::Resource;
use crate::error::{Error, Result};

/// API minor version pinned by this crate; appended to every query URL.
pub const MINOR_VERSION: &str = "70";

/// Page size used when the caller does not choose one.
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// Upper bound the provider enforces on `MAXRESULTS`. The builder itself does
/// not clamp; callers that exceed it get the upstream error back.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An immutable description of one query: predicates, sort and page window.
///
/// `where_clauses` keep their insertion order; that order is the literal order
/// they appear in the generated statement, joined by ` AND `.
#[derive(Debug, Clone)]
pub struct Query {
    resource: Resource,
    where_clauses: Vec<String>,
    order_by: Option<(String, SortDirection)>,
    start_position: u32,
    max_results: u32,
}

impl Query {
    fn new(resource: Resource) -> Self {
        Self {
            resource,
            where_clauses: Vec::new(),
            order_by: None,
            start_position: 1,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn resource(&self) -> Resource {
        self.resource
    }

    #[must_use]
    pub fn where_clauses(&self) -> &[String] {
        &self.where_clauses
    }

    #[must_use]
    pub fn order_by(&self) -> Option<&(String, SortDirection)> {
        self.order_by.as_ref()
    }

    /// 1-based offset of the current page window.
    #[must_use]
    pub fn start_position(&self) -> u32 {
        self.start_position
    }

    #[must_use]
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Renders the query-language statement, e.g.
    /// `SELECT * FROM Invoice WHERE DueDate = '...' ORDERBY Id ASC STARTPOSITION 1 MAXRESULTS 100`.
    #[must_use]
    pub fn statement(&self) -> String {
        let mut statement = format!("SELECT * FROM {}", self.resource.name());
        if !self.where_clauses.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&self.where_clauses.join(" AND "));
        }
        if let Some((field, direction)) = &self.order_by {
            statement.push_str(&format!(" ORDERBY {field} {}", direction.as_str()));
        }
        statement.push_str(&format!(
            " STARTPOSITION {} MAXRESULTS {}",
            self.start_position, self.max_results
        ));
        statement
    }
}

/// Options bag applied to a builder in one call.
///
/// Every field is optional; fields left `None` do not touch the builder's
/// existing state, so a partial options value never clears anything.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub order_by: Option<(String, SortDirection)>,
    pub start_position: Option<u32>,
    pub max_results: Option<u32>,
    /// A raw query-language predicate appended verbatim to the `WHERE` clauses.
    pub custom_filter: Option<String>,
}

/// Accumulates [`Query`] state and renders it into a request URL.
///
/// Predicate methods mutate the receiver and return `&mut Self` for chaining;
/// the returned reference aliases the builder, it is not a copy. Values are
/// embedded in clauses as literal single-quoted strings with no escaping beyond
/// what the upstream query language defines, which some callers rely on for
/// advanced filters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: Url,
    realm_id: String,
    query: Query,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(base_url: Url, realm_id: String, resource: Resource) -> Self {
        Self {
            base_url,
            realm_id,
            query: Query::new(resource),
        }
    }

    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Appends one raw predicate clause, preserving call order.
    pub fn push_where(&mut self, clause: impl Into<String>) -> &mut Self {
        self.query.where_clauses.push(clause.into());
        self
    }

    pub fn where_created_after(&mut self, date: OffsetDateTime) -> &mut Self {
        let ts = format_timestamp(date);
        self.push_where(format!("MetaData.CreateTime >= '{ts}'"))
    }

    pub fn where_created_before(&mut self, date: OffsetDateTime) -> &mut Self {
        let ts = format_timestamp(date);
        self.push_where(format!("MetaData.CreateTime <= '{ts}'"))
    }

    pub fn where_last_updated_after(&mut self, date: OffsetDateTime) -> &mut Self {
        let ts = format_timestamp(date);
        self.push_where(format!("MetaData.LastUpdatedTime >= '{ts}'"))
    }

    pub fn where_last_updated_before(&mut self, date: OffsetDateTime) -> &mut Self {
        let ts = format_timestamp(date);
        self.push_where(format!("MetaData.LastUpdatedTime <= '{ts}'"))
    }

    pub fn order_by(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.query.order_by = Some((field.into(), direction));
        self
    }

    pub fn start_position(&mut self, start_position: u32) -> &mut Self {
        self.query.start_position = start_position;
        self
    }

    pub fn max_results(&mut self, max_results: u32) -> &mut Self {
        self.query.max_results = max_results;
        self
    }

    /// Applies the keys present in `options`; absent keys leave state untouched.
    pub fn set_search_options(&mut self, options: &SearchOptions) -> &mut Self {
        if let Some((field, direction)) = &options.order_by {
            self.query.order_by = Some((field.clone(), *direction));
        }
        if let Some(start_position) = options.start_position {
            self.query.start_position = start_position;
        }
        if let Some(max_results) = options.max_results {
            self.query.max_results = max_results;
        }
        if let Some(filter) = &options.custom_filter {
            self.query.where_clauses.push(filter.clone());
        }
        self
    }

    /// A copy of this builder with `start_position` advanced by one page.
    ///
    /// Fetching the next page means building a fresh URL from the advanced
    /// copy; an already-returned page is never mutated.
    #[must_use]
    pub fn advanced(&self) -> Self {
        let mut next = self.clone();
        next.query.start_position = self.query.start_position + self.query.max_results;
        next
    }

    /// Renders the accumulated query into a request URL.
    ///
    /// Pure and idempotent: no I/O, no effect on builder state, and two calls
    /// without an intervening mutation yield byte-identical URLs.
    pub fn build(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint)?
            .extend(["v3", "company", &self.realm_id, "query"]);
        url.query_pairs_mut()
            .append_pair("query", &self.query.statement())
            .append_pair("minorversion", MINOR_VERSION);
        Ok(url)
    }
}

pub(crate) fn format_timestamp(date: OffsetDateTime) -> String {
    date.format(&Rfc3339)
        .expect("timestamp formats as RFC 3339")
}

/// Pagination metadata carried inside the `QueryResponse` envelope.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct QueryMeta {
    #[serde(rename = "startPosition")]
    pub start_position: Option<u32>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<u32>,
    #[serde(rename = "totalCount")]
    pub total_count: Option<u32>,
}

/// One page of search results.
///
/// Not itself paginated further; advancing means a fresh builder with an
/// advanced `start_position` (see [`QueryBuilder::advanced`]).
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub has_next_page: bool,
}

/// Decides whether another page exists, when that is locally decidable.
///
/// A short page settles it immediately (including zero results on page one).
/// A full page is settled by the envelope's `totalCount` when present.
/// `None` means the answer requires a follow-up probe request with an advanced
/// `start_position`; see `Client::has_next_page`.
#[must_use]
pub fn next_page_hint(
    start_position: u32,
    max_results: u32,
    returned: usize,
    meta: &QueryMeta,
) -> Option<bool> {
    if returned < max_results as usize {
        return Some(false);
    }
    let start = meta.start_position.unwrap_or(start_position);
    meta.total_count
        .map(|total| u64::from(start).saturating_sub(1) + (returned as u64) < u64::from(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_means_no_next_page() {
        let meta = QueryMeta::default();
        assert_eq!(next_page_hint(1, 100, 40, &meta), Some(false));
        assert_eq!(next_page_hint(1, 100, 0, &meta), Some(false));
        assert_eq!(next_page_hint(901, 100, 99, &meta), Some(false));
    }

    #[test]
    fn full_page_with_total_count_is_settled_by_the_envelope() {
        let meta = QueryMeta {
            start_position: Some(1),
            max_results: Some(100),
            total_count: Some(250),
        };
        assert_eq!(next_page_hint(1, 100, 100, &meta), Some(true));

        let last = QueryMeta {
            start_position: Some(201),
            max_results: Some(100),
            total_count: Some(300),
        };
        // 201..=300 is exactly the tail of the result set.
        assert_eq!(next_page_hint(201, 100, 100, &last), Some(false));
    }

    #[test]
    fn full_page_without_total_count_needs_a_probe() {
        let meta = QueryMeta::default();
        assert_eq!(next_page_hint(1, 100, 100, &meta), None);
    }

    #[test]
    fn envelope_start_position_overrides_the_builders() {
        let meta = QueryMeta {
            start_position: Some(101),
            max_results: None,
            total_count: Some(200),
        };
        assert_eq!(next_page_hint(1, 100, 100, &meta), Some(false));
    }
}
