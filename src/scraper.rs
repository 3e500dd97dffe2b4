use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::config::Config;
use crate::parser;
use crate::record::ProductRecord;

/// Hosts the scraper refuses to handle (matched lowercase, substring).
const BLOCKED_HOSTS: &[&str] = &["amazon.com", "amzn."];

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl ScrapeError {
    /// Placeholder record for this failure.
    pub fn into_record(self, url: &str) -> ProductRecord {
        let label = match self {
            ScrapeError::Extraction(_) => "Unexpected Error",
            _ => "Error",
        };
        ProductRecord::error(url, label, &self.to_string())
    }
}

/// Source of raw page HTML.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Plain GET with a browser User-Agent, redirects followed, non-2xx rejected.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.user_agent, config.request_timeout)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(e, url))
    }
}

fn classify(e: reqwest::Error, url: &str) -> ScrapeError {
    if e.is_timeout() {
        ScrapeError::Timeout { url: url.to_string() }
    } else {
        ScrapeError::Http(e)
    }
}

/// Input URLs split into those the extractor will see and those refused.
#[derive(Debug, Default, PartialEq)]
pub struct UrlBatch {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

/// One URL per line; blanks dropped; blocked marketplaces set aside.
pub fn partition_urls(text: &str) -> UrlBatch {
    let mut batch = UrlBatch::default();
    for url in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_blocked(url) {
            batch.rejected.push(url.to_string());
        } else {
            batch.accepted.push(url.to_string());
        }
    }
    batch
}

pub fn is_blocked(url: &str) -> bool {
    let lower = url.to_lowercase();
    BLOCKED_HOSTS.iter().any(|h| lower.contains(h))
}

/// Fetch and extract one URL. Never fails: errors become placeholder records.
pub async fn scrape_one<F: Fetcher + ?Sized>(fetcher: &F, url: &str) -> ProductRecord {
    info!("Scraping: {}", url);

    let result = fetcher
        .fetch(url)
        .await
        .and_then(|html| extract_guarded(&html, url));

    match result {
        Ok(record) => {
            let name: String = record.product_name.chars().take(50).collect();
            info!("Scraped: {}", name);
            record
        }
        Err(e) => {
            warn!("Error scraping {}: {}", url, e);
            e.into_record(url)
        }
    }
}

/// Run the extractor, turning a panic inside it into an error.
fn extract_guarded(html: &str, url: &str) -> Result<ProductRecord, ScrapeError> {
    panic::catch_unwind(AssertUnwindSafe(|| parser::extract(html, url))).map_err(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic during extraction".to_string());
        ScrapeError::Extraction(msg)
    })
}

/// Scrape URLs one at a time, in order. Always returns one record per URL.
pub async fn scrape_batch<F: Fetcher + ?Sized>(
    fetcher: &F,
    urls: &[String],
    pb: &ProgressBar,
) -> Vec<ProductRecord> {
    let mut records = Vec::with_capacity(urls.len());

    for url in urls {
        records.push(scrape_one(fetcher, url).await);
        pb.inc(1);
    }

    let errors = records.iter().filter(|r| r.is_error()).count();
    info!(
        "Scraped {} URLs ({} ok, {} errors)",
        records.len(),
        records.len() - errors,
        errors
    );
    records
}
