use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::ProgressBar;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::markup::{self, ScanError};
use crate::record::RecordSource;

#[derive(Debug, Error)]
pub enum GatherError {
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("fetched page {url} has no list container")]
    MissingList {
        url: String,
        #[source]
        source: ScanError,
    },

    #[error("unreadable page indicator '{text}'")]
    BadIndicator { text: String },
}

/// Seam for the crawl so aggregation is testable without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, GatherError>;
}

/// Same-origin fetcher carrying the ajax request marker the source
/// site expects from in-page loads.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, GatherError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            reqwest::header::HeaderValue::from_static("XMLHttpRequest"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|e| GatherError::ClientBuild { source: e })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, GatherError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatherError::Fetch {
                url: url.to_string(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatherError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|e| GatherError::Fetch {
            url: url.to_string(),
            source: e,
        })
    }
}

fn indicator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").expect("hardcoded pattern"))
}

fn page_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"page=\d+").expect("hardcoded pattern"))
}

/// Parses the `"<current> / <total>"` page indicator.
pub fn parse_page_indicator(text: &str) -> Result<(u32, u32), GatherError> {
    let trimmed = text.trim();
    let bad = || GatherError::BadIndicator {
        text: text.to_string(),
    };
    let captures = indicator_regex().captures(trimmed).ok_or_else(bad)?;
    let current = captures[1].parse().map_err(|_| bad())?;
    let total = captures[2].parse().map_err(|_| bad())?;
    Ok((current, total))
}

/// Source-page URLs for every page after the current one, derived by
/// rewriting the `page=<n>` query parameter on the base link.
pub fn page_links(current: u32, total: u32, base_url: &str) -> Vec<String> {
    let mut links = Vec::new();
    for page in current.saturating_add(1)..=total {
        links.push(rewrite_page_param(base_url, page));
    }
    links
}

fn rewrite_page_param(base_url: &str, page: u32) -> String {
    let replacement = format!("page={page}");
    if page_param_regex().is_match(base_url) {
        return page_param_regex()
            .replace(base_url, replacement.as_str())
            .into_owned();
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{replacement}")
}

#[derive(Debug, Default)]
pub struct GatherOutcome {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records: Vec<RecordSource>,
}

/// Fetches every remaining source page sequentially and collects their
/// records in page order. A failed page is logged and skipped; the
/// rest of the sequence still runs.
pub async fn gather_remaining_pages(
    fetcher: &dyn PageFetcher,
    indicator: &str,
    base_link: &str,
    progress: &ProgressBar,
) -> Result<GatherOutcome, GatherError> {
    let (current, total) = parse_page_indicator(indicator)?;
    let links = page_links(current, total, base_link);
    progress.set_length(links.len() as u64);

    let mut outcome = GatherOutcome::default();
    for url in links {
        match fetch_page_records(fetcher, &url).await {
            Ok(records) => {
                debug!(url = %url, records = records.len(), "gathered source page");
                outcome.pages_fetched += 1;
                outcome.records.extend(records);
            }
            Err(error) => {
                warn!(url = %url, %error, "skipping source page");
                outcome.pages_failed += 1;
            }
        }
        progress.inc(1);
    }
    Ok(outcome)
}

async fn fetch_page_records(
    fetcher: &dyn PageFetcher,
    url: &str,
) -> Result<Vec<RecordSource>, GatherError> {
    let html = fetcher.fetch(url).await?;
    markup::list_records(&html).map_err(|e| GatherError::MissingList {
        url: url.to_string(),
        source: e,
    })
}
