use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{DEFAULT_BASE_URL, RawRecord, SearchResponse};
use crate::normalize::{DiscardReason, DiscardStats, InsertOutcome, RowSet, try_normalize};
use crate::rows::NormalizedRow;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(400);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("tatoeba-seeder/", env!("CARGO_PKG_VERSION"));
const MIN_PAGE_CAP: usize = 5;
const PAGE_CAP_FACTOR: usize = 6;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub base_url: String,
    pub source_lang: String,
    pub target_lang: String,
    pub target: usize,
    pub page_size: usize,
    pub max_pages: Option<usize>,
    pub page_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            source_lang: "eng".to_string(),
            target_lang: "spa".to_string(),
            target: 500,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            page_delay: DEFAULT_PAGE_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub rows: Vec<NormalizedRow>,
    pub pages_fetched: usize,
    pub discarded: DiscardStats,
}

pub(crate) type PageFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Where raw search pages come from. Yields the body of one page.
pub(crate) trait PageSource: Sync {
    fn fetch_page(&self, page: usize) -> PageFuture<'_>;
}

struct HttpPages<'a> {
    client: reqwest::Client,
    options: &'a FetchOptions,
}

impl PageSource for HttpPages<'_> {
    fn fetch_page(&self, page: usize) -> PageFuture<'_> {
        Box::pin(async move {
            let url = search_url(self.options, page)?;
            debug!("requesting {}", url);
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("failed to request Tatoeba page {}", page))?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(anyhow!("Tatoeba API error ({}): {}", status, text));
            }
            Ok(text)
        })
    }
}

/// Page cap used when none is configured: six times the minimum number of
/// pages, never below five.
pub fn max_pages_for(target: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    (target.div_ceil(page_size) * PAGE_CAP_FACTOR).max(MIN_PAGE_CAP)
}

pub fn search_url(options: &FetchOptions, page: usize) -> Result<Url> {
    let page = page.to_string();
    let limit = options.page_size.to_string();
    Url::parse_with_params(
        &options.base_url,
        [
            ("from", options.source_lang.as_str()),
            ("to", options.target_lang.as_str()),
            ("trans_filter", "limit"),
            ("trans_to", options.target_lang.as_str()),
            ("orphans", "no"),
            ("unapproved", "no"),
            ("sort", "random"),
            ("page", page.as_str()),
            ("limit", limit.as_str()),
        ],
    )
    .with_context(|| format!("invalid Tatoeba base url: {}", options.base_url))
}

/// Pulls pages one at a time until `target` rows are collected, a page comes
/// back empty, or the page cap is reached.
pub async fn fetch_rows(options: &FetchOptions) -> Result<FetchOutcome> {
    if options.target == 0 {
        return Err(anyhow!("target row count must be greater than zero"));
    }
    if options.page_size == 0 {
        return Err(anyhow!("page size must be greater than zero"));
    }

    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .user_agent(options.user_agent.clone())
        .build()
        .with_context(|| "failed to build HTTP client")?;

    collect_pages(&HttpPages { client, options }, options).await
}

pub(crate) async fn collect_pages(
    source: &impl PageSource,
    options: &FetchOptions,
) -> Result<FetchOutcome> {
    let max_pages = options
        .max_pages
        .unwrap_or_else(|| max_pages_for(options.target, options.page_size));
    let mut rows = RowSet::with_capacity(options.target);
    let mut discarded = DiscardStats::default();
    let mut pages_fetched = 0usize;

    for page in 1..=max_pages {
        debug!("fetching page {}/{}", page, max_pages);
        let text = source.fetch_page(page).await?;
        pages_fetched += 1;

        let parsed: SearchResponse = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse Tatoeba page {}", page))?;
        if parsed.results.is_empty() {
            info!("page {} returned no results; stopping", page);
            break;
        }

        let before = rows.len();
        for item in parsed.results.iter() {
            collect_item(item, &mut rows, &mut discarded);
        }
        info!(
            "page {}: {} results, {} new rows ({}/{})",
            page,
            parsed.results.len(),
            rows.len() - before,
            rows.len(),
            options.target
        );

        if rows.is_full() {
            break;
        }
        if page < max_pages {
            sleep(options.page_delay).await;
        }
    }

    if rows.is_empty() {
        warn!(
            "no usable sentence pairs after {} pages (wanted {})",
            pages_fetched, options.target
        );
    } else if !rows.is_full() {
        warn!(
            "collected {} of {} requested rows after {} pages",
            rows.len(),
            options.target,
            pages_fetched
        );
    }

    Ok(FetchOutcome {
        rows: rows.into_rows(),
        pages_fetched,
        discarded,
    })
}

// One bad item is a discard, never a failed page.
fn collect_item(item: &Value, rows: &mut RowSet, discarded: &mut DiscardStats) {
    let parsed = match item {
        Value::Object(_) => RawRecord::deserialize(item).map_err(|err| err.to_string()),
        _ => Err("not an object".to_string()),
    };
    let record = match parsed {
        Ok(record) => record,
        Err(err) => {
            debug!("dropping result {}: {} ({})", item, DiscardReason::Malformed, err);
            discarded.record(DiscardReason::Malformed);
            return;
        }
    };
    match try_normalize(&record).map(|row| rows.insert(row)) {
        Ok(InsertOutcome::MissingId) => {
            debug!("dropping record {:?}: {}", record.id, DiscardReason::MissingId);
            discarded.record(DiscardReason::MissingId);
        }
        Ok(_) => {}
        Err(reason) => {
            debug!("dropping record {:?}: {}", record.id, reason);
            discarded.record(reason);
        }
    }
}
