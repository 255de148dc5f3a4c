//! Google Custom Search JSON API source.
//!
//! Builds one boolean query out of the configured positions, levels, and
//! locations, then walks result pages until the API stops advertising a
//! next page or [`MAX_PAGES`] is reached.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use jobwatch_core::config::SearchConfig;
use jobwatch_core::{FilterCriteria, JobRecord};

use crate::traits::{JobSource, SourceError};

const BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Upper bound on pages requested per fetch.
pub const MAX_PAGES: u32 = 10;

/// Results per page returned by the API.
const PAGE_SIZE: u32 = 10;

const FIELDS: &str = "items(title,link,snippet),queries(nextPage,request(searchTerms,excludeTerms))";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    queries: Option<Queries>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct Queries {
    #[serde(rename = "nextPage", default)]
    next_page: Option<serde_json::Value>,
    #[serde(default)]
    request: Vec<RequestInfo>,
}

#[derive(Debug, Deserialize)]
struct RequestInfo {
    #[serde(rename = "searchTerms", default)]
    search_terms: Option<String>,
    #[serde(rename = "excludeTerms", default)]
    exclude_terms: Option<String>,
}

/// One parsed result page.
#[derive(Debug)]
pub struct SearchPage {
    pub jobs: Vec<JobRecord>,
    pub has_next: bool,
}

/// Queries the Custom Search API for postings.
#[derive(Debug)]
pub struct GoogleSearchSource {
    api_key: String,
    search_engine_id: String,
    country_code: String,
    query: String,
    exclude_terms: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleSearchSource {
    /// Build a source from the search and filter configuration.
    ///
    /// Returns [`SourceError::Config`] when the API key or engine id is
    /// missing.
    pub fn from_config(search: &SearchConfig, filter: &FilterCriteria) -> Result<Self, SourceError> {
        let api_key = search
            .api_key
            .clone()
            .ok_or_else(|| SourceError::Config("API_KEY is not set".to_string()))?;
        let search_engine_id = search
            .search_engine_id
            .clone()
            .ok_or_else(|| SourceError::Config("CX is not set".to_string()))?;

        Ok(Self {
            api_key,
            search_engine_id,
            country_code: search.country_code.clone(),
            query: build_query(&[&filter.positions, &filter.levels, &search.locations]),
            exclude_terms: filter.excluded_descriptions.join(" "),
            base_url: BASE_URL.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Point the source at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Query-string parameters for a 1-based page number.
    fn page_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let start = (page - 1) * PAGE_SIZE + 1;
        vec![
            ("q", self.query.clone()),
            ("excludeTerms", self.exclude_terms.clone()),
            ("gl", self.country_code.clone()),
            ("cx", self.search_engine_id.clone()),
            ("key", self.api_key.clone()),
            ("start", start.to_string()),
            ("fields", FIELDS.to_string()),
        ]
    }

    async fn fetch_page(&self, page: u32) -> Result<SearchPage, SourceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.page_params(page))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_page(&body, page == 1)
    }
}

/// Join each non-empty term group with `OR` and wrap it in parentheses.
pub fn build_query(groups: &[&Vec<String>]) -> String {
    groups
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| format!("({})", g.join(" OR ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse one API response body.
pub fn parse_page(body: &str, log_request: bool) -> Result<SearchPage, SourceError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let has_next = parsed
        .queries
        .as_ref()
        .is_some_and(|q| q.next_page.is_some());

    if log_request {
        if let Some(request) = parsed.queries.as_ref().and_then(|q| q.request.first()) {
            debug!(
                search_terms = request.search_terms.as_deref().unwrap_or(""),
                exclude_terms = request.exclude_terms.as_deref().unwrap_or(""),
                "search request"
            );
        }
    }

    let jobs = parsed
        .items
        .into_iter()
        .map(|item| JobRecord::new(item.link, item.title, item.snippet))
        .collect();

    Ok(SearchPage { jobs, has_next })
}

#[async_trait]
impl JobSource for GoogleSearchSource {
    async fn fetch(&self) -> Result<Vec<JobRecord>, SourceError> {
        let mut all = Vec::new();

        for page in 1..=MAX_PAGES {
            let result = self.fetch_page(page).await?;
            all.extend(result.jobs);
            if !result.has_next {
                break;
            }
        }

        info!(source = self.name(), count = all.len(), "search results fetched");
        Ok(all)
    }

    fn name(&self) -> &str {
        "google-search"
    }
}
