// src/providers/search.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{record_error, SearchHit, SearchProvider};
use crate::text::normalize_text;

const CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API rejects `num` outside 1..=10.
const CSE_MAX_NUM: usize = 10;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
    #[serde(rename = "displayLink")]
    display_link: Option<String>,
}

/// Google Custom Search JSON API.
pub struct CustomSearchProvider {
    http: reqwest::Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl CustomSearchProvider {
    pub fn new(api_key: String, cx: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("claim-checker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building search http client")?;
        Ok(Self {
            http,
            api_key,
            cx,
            endpoint: CSE_ENDPOINT.to_string(),
        })
    }

    /// Point at a different endpoint (local fakes).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let num = limit.clamp(1, CSE_MAX_NUM).to_string();
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("custom search request")?
            .error_for_status()
            .context("custom search status")?;
        let body: CseResponse = resp.json().await.context("custom search body")?;
        Ok(body.items.into_iter().map(hit_from_item).take(limit).collect())
    }
}

fn hit_from_item(it: CseItem) -> SearchHit {
    let link = it.link.unwrap_or_default();
    let domain = match it.display_link.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_ascii_lowercase(),
        _ => domain_of(&link),
    };
    SearchHit {
        title: normalize_text(it.title.as_deref().unwrap_or_default()),
        snippet: normalize_text(it.snippet.as_deref().unwrap_or_default()),
        link,
        domain,
    }
}

/// Lowercased host of a URL, or empty when it does not parse.
pub fn domain_of(link: &str) -> String {
    reqwest::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

#[async_trait]
impl SearchProvider for CustomSearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        match self.fetch(query, limit).await {
            Ok(hits) => {
                debug!(count = hits.len(), "custom search ok");
                hits
            }
            Err(e) => {
                warn!(error = ?e, "custom search failed");
                record_error("search");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "custom-search"
    }
}

/// Always returns nothing; used when search credentials are missing.
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Vec<SearchHit> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
