//! Concurrent archiving of several publications.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::archive::{ArchiveSummary, Archiver};
use crate::browser::Browser;
use crate::config::PublicationConfig;
use crate::fetch::FetchConfig;
use crate::formatters::TextConfig;
use crate::progress::ProgressBoard;
use crate::sanitize::SanitizeConfig;

/// Settings and shared state of one run.
///
/// The progress board is the only state shared between publications; the
/// rest is copied into each [`Archiver`].
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub progress: ProgressBoard,
    pub fetch: FetchConfig,
    pub sanitize: SanitizeConfig,
    pub text: TextConfig,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_sanitize_config(mut self, sanitize: SanitizeConfig) -> Self {
        self.sanitize = sanitize;
        self
    }

    pub fn with_text_config(mut self, text: TextConfig) -> Self {
        self.text = text;
        self
    }
}

/// Archives every valid publication concurrently, one task each.
///
/// Entries without a handle or base URL, and repeats of a handle already
/// scheduled, are skipped with a warning. Summaries come back in
/// configuration order.
pub async fn run(browser: Arc<dyn Browser>, configs: Vec<PublicationConfig>, ctx: &RunContext) -> Vec<ArchiveSummary> {
    let mut tasks = JoinSet::new();
    let mut handles = Vec::new();
    let mut seen = HashSet::new();

    for config in configs {
        if !config.is_valid() {
            warn!(handle = %config.handle, base_url = %config.base_url, "skipping invalid publication");
            continue;
        }
        if !seen.insert(config.handle.clone()) {
            warn!(handle = %config.handle, "skipping duplicate publication");
            continue;
        }

        let index = handles.len();
        handles.push(config.handle.clone());
        let archiver = Archiver::new(Arc::clone(&browser), config, ctx);
        tasks.spawn(async move { (index, archiver.archive().await) });
    }

    info!(publications = handles.len(), "archiving publications");

    let mut results: Vec<Option<ArchiveSummary>> = vec![None; handles.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, summary)) => results[index] = Some(summary),
            Err(e) => error!(error = %e, "publication task failed"),
        }
    }

    results
        .into_iter()
        .zip(handles)
        .map(|(summary, handle)| summary.unwrap_or_else(|| ArchiveSummary::new(handle)))
        .collect()
}
