//! Post listing pagination and post page fetching.
//!
//! The listing API is paged with `limit`/`offset`. [`fetch_all_posts`] walks it
//! until the first empty page; any failure along the way ends the walk early
//! and keeps what was already collected. [`fetch_post_body`] loads a single
//! post page and pulls out its article container.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::browser::Page;
use crate::extract::ContentSelectors;
use crate::{ArchiveError, Result};

/// Records requested per listing page.
pub const PAGE_SIZE: usize = 50;

/// Navigation settings for listing and post pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Listing page timeout in seconds.
    pub timeout: u64,
    /// Post page timeout in seconds.
    pub detail_timeout: u64,
    /// Records per listing page.
    pub page_size: usize,
    /// Article containers tried on post pages.
    pub content_selectors: ContentSelectors,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, detail_timeout: 90, page_size: PAGE_SIZE, content_selectors: ContentSelectors::default() }
    }
}

/// Result of loading one post page.
#[derive(Debug)]
pub enum DetailOutcome {
    /// HTML of the article container.
    Found(String),
    /// The page loaded but has no known article container.
    NoContent,
    /// The server refused the page, usually a paywall.
    Inaccessible,
    /// Any other navigation failure.
    Failed(ArchiveError),
}

/// Listing URL for one page.
pub fn listing_url(base_url: &str, limit: usize, offset: usize) -> String {
    format!("{base_url}/api/v1/posts?limit={limit}&offset={offset}")
}

/// Post page URL for a slug.
pub fn post_url(base_url: &str, slug: &str) -> String {
    format!("{base_url}/p/{slug}")
}

/// Collects every raw post record of a publication.
///
/// Stops at the first empty page. A page that fails to load or does not hold
/// a JSON list also ends pagination; records gathered before it are returned.
pub async fn fetch_all_posts(base_url: &str, page: &mut dyn Page, config: &FetchConfig) -> Vec<Value> {
    let mut records = Vec::new();
    let mut offset = 0;
    let timeout = Duration::from_secs(config.timeout);

    info!(base_url, "fetching post listing");

    loop {
        let url = listing_url(base_url, config.page_size, offset);
        debug!(url = %url, "fetching listing page");

        match fetch_listing_page(page, &url, timeout).await {
            Ok(batch) if batch.is_empty() => break,
            Ok(batch) => {
                info!(offset, count = batch.len(), "fetched listing page");
                records.extend(batch);
                offset += config.page_size;
            }
            Err(e) => {
                error!(offset, error = %e, "stopping pagination");
                break;
            }
        }
    }

    info!(total = records.len(), "finished fetching post listing");
    records
}

async fn fetch_listing_page(page: &mut dyn Page, url: &str, timeout: Duration) -> Result<Vec<Value>> {
    page.goto(url, timeout).await?;

    match serde_json::from_str::<Value>(page.content().trim())? {
        Value::Array(batch) => Ok(batch),
        other => {
            warn!(url, kind = json_kind(&other), "listing page is not a JSON list");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loads a post page and extracts its article container.
pub async fn fetch_post_body(page: &mut dyn Page, base_url: &str, slug: &str, config: &FetchConfig) -> DetailOutcome {
    let url = post_url(base_url, slug);
    debug!(url = %url, "fetching post page");

    match page.goto(&url, Duration::from_secs(config.detail_timeout)).await {
        Ok(()) => match config.content_selectors.extract(page.content()) {
            Some(html) => DetailOutcome::Found(html),
            None => {
                warn!(url = %url, "no article container found on post page");
                DetailOutcome::NoContent
            }
        },
        Err(e) if e.is_inaccessible() => {
            warn!(url = %url, "post page refused, likely paywalled");
            DetailOutcome::Inaccessible
        }
        Err(e) => {
            error!(url = %url, error = %e, "failed to load post page");
            DetailOutcome::Failed(e)
        }
    }
}
