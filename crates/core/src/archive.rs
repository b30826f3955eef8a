//! Per-publication archive run.
//!
//! An [`Archiver`] drives one publication through three phases:
//!
//! 1. **Fetching**: open a page, walk the listing, dump the raw payload.
//! 2. **Processing**: for each record in listing order, skip it if already
//!    archived, fill in its body from the post page when asked to, then render
//!    and save it and queue its text conversion.
//! 3. **Done**: wait for queued conversions and report an [`ArchiveSummary`].
//!
//! Nothing in a run is fatal. Every failure is logged and counted, and the
//! summary is returned regardless.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::browser::{Browser, Page};
use crate::config::{DetailPages, PublicationConfig};
use crate::fetch::{DetailOutcome, FetchConfig, fetch_all_posts, fetch_post_body};
use crate::formatters::TextConfig;
use crate::progress::{Phase, ProgressBoard, ProgressHandle};
use crate::runner::RunContext;
use crate::sanitize::SanitizeConfig;
use crate::storage::ArchiveStore;
use crate::{Post, Result, normalize};

/// Outcome counts of one publication's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub handle: String,
    /// Posts written for the first time.
    pub downloaded: usize,
    /// Posts without a title or body.
    pub missing_body: usize,
    /// Posts skipped because their HTML was already archived.
    pub skipped_existing: usize,
    /// Posts whose page was refused and had no listing body to fall back on.
    pub inaccessible: usize,
    /// Posts dropped after any other error.
    pub failed: usize,
    /// Records returned by the listing.
    pub records: usize,
}

impl ArchiveSummary {
    pub fn new(handle: impl Into<String>) -> Self {
        Self { handle: handle.into(), ..Default::default() }
    }

    fn log(&self) {
        info!(
            downloaded = self.downloaded,
            skipped_existing = self.skipped_existing,
            records = self.records,
            "publication archived"
        );
        if self.missing_body > 0 {
            warn!(missing_body = self.missing_body, "some posts had no body and were not archived");
        }
        if self.inaccessible > 0 || self.failed > 0 {
            warn!(inaccessible = self.inaccessible, failed = self.failed, "some posts could not be fetched");
        }
    }
}

/// Archives one publication.
pub struct Archiver {
    browser: Arc<dyn Browser>,
    config: PublicationConfig,
    fetch: FetchConfig,
    sanitize: SanitizeConfig,
    text: TextConfig,
    progress: ProgressBoard,
}

impl Archiver {
    /// Creates an archiver using the run-wide settings of `ctx`.
    pub fn new(browser: Arc<dyn Browser>, config: PublicationConfig, ctx: &RunContext) -> Self {
        Self {
            browser,
            config,
            fetch: ctx.fetch.clone(),
            sanitize: ctx.sanitize.clone(),
            text: ctx.text.clone(),
            progress: ctx.progress.clone(),
        }
    }

    pub fn config(&self) -> &PublicationConfig {
        &self.config
    }

    /// Runs the publication to completion inside its own tracing span.
    pub async fn archive(&self) -> ArchiveSummary {
        let span = info_span!("publication", handle = %self.config.handle);
        self.run().instrument(span).await
    }

    async fn run(&self) -> ArchiveSummary {
        let mut summary = ArchiveSummary::new(&self.config.handle);
        let mut progress = self.progress.register(&self.config.handle);

        let mut store = match ArchiveStore::open(&self.config.handle, &self.config.output_directory) {
            Ok(store) => store.with_conversion(self.sanitize.clone(), self.text.clone()),
            Err(e) => {
                error!(error = %e, "cannot open archive directory");
                progress.finish();
                return summary;
            }
        };

        let mut page = match self.browser.new_page(&self.config.base_url).await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "cannot open page, skipping publication");
                progress.finish();
                return summary;
            }
        };

        let records = fetch_all_posts(&self.config.base_url, page.as_mut(), &self.fetch).await;
        summary.records = records.len();
        progress.set_total(records.len());

        match store.dump_raw(&records) {
            Ok(path) => debug!(path = %path.display(), "saved raw listing"),
            Err(e) => error!(error = %e, "failed to save raw listing"),
        }

        progress.set_phase(Phase::Processing);
        let mut conversions = JoinSet::new();

        for record in &records {
            let post = normalize(record);
            self.process_post(post, page.as_mut(), &mut store, &mut conversions, &mut progress, &mut summary)
                .await;
        }

        drain_conversions(&mut conversions).await;
        progress.finish();
        summary.log();
        summary
    }

    async fn process_post(
        &self, mut post: Post, page: &mut dyn Page, store: &mut ArchiveStore,
        conversions: &mut JoinSet<Result<std::path::PathBuf>>, progress: &mut ProgressHandle,
        summary: &mut ArchiveSummary,
    ) {
        progress.advance();

        let archived = post.title().is_some_and(|title| store.exists(title));
        if self.config.skip_existing && archived {
            debug!(title = post.title().unwrap_or_default(), "already archived, skipping");
            summary.skipped_existing += 1;
            return;
        }

        if !archived
            && self.wants_detail_page(&post)
            && let Some(slug) = post.page_slug().map(str::to_owned)
        {
            match fetch_post_body(page, &self.config.base_url, &slug, &self.fetch).await {
                DetailOutcome::Found(html) => post.body_html = Some(html),
                DetailOutcome::NoContent => {}
                DetailOutcome::Inaccessible if post.body().is_none() => {
                    summary.inaccessible += 1;
                    return;
                }
                DetailOutcome::Failed(_) if post.body().is_none() => {
                    summary.failed += 1;
                    return;
                }
                DetailOutcome::Inaccessible | DetailOutcome::Failed(_) => {
                    debug!(slug = %slug, "post page unavailable, using listing body");
                }
            }
        }

        let Some(title) = post.title().filter(|_| post.body().is_some()) else {
            debug!(title = post.title().unwrap_or_default(), audience = ?post.audience, "post has no body");
            summary.missing_body += 1;
            return;
        };

        let html = store.render_html(&post, &self.config.base_url);
        match store.save_html(title, &html) {
            Ok(Some(path)) => {
                debug!(title, path = %path.display(), "saved post");
                conversions.spawn(store.convert_to_text(path).in_current_span());
                summary.downloaded += 1;
            }
            Ok(None) => debug!(title, "post file already on disk"),
            Err(e) => {
                error!(title, error = %e, "failed to save post");
                summary.failed += 1;
            }
        }
    }

    fn wants_detail_page(&self, post: &Post) -> bool {
        if post.page_slug().is_none() {
            return false;
        }

        match self.config.detail_pages {
            DetailPages::Never => false,
            DetailPages::Missing => post.body().is_none(),
            DetailPages::Always => true,
        }
    }
}

async fn drain_conversions(conversions: &mut JoinSet<Result<std::path::PathBuf>>) {
    while let Some(joined) = conversions.join_next().await {
        match joined {
            Ok(Ok(path)) => debug!(path = %path.display(), "saved text"),
            Ok(Err(e)) => error!(error = %e, "text conversion failed"),
            Err(e) => error!(error = %e, "text conversion task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn archiver(mode: DetailPages) -> Archiver {
        struct NoBrowser;

        #[async_trait::async_trait]
        impl Browser for NoBrowser {
            async fn new_page(&self, base_url: &str) -> Result<Box<dyn Page>> {
                Err(crate::ArchiveError::InvalidUrl(base_url.to_string()))
            }
        }

        let mut config = PublicationConfig::new("t", "https://t.com");
        config.detail_pages = mode;
        Archiver::new(Arc::new(NoBrowser), config, &RunContext::default())
    }

    #[test]
    fn test_wants_detail_page() {
        let with_body = normalize(&json!({"title": "A", "slug": "a", "body_html": "<p>x</p>"}));
        let without_body = normalize(&json!({"title": "B", "slug": "b"}));
        let without_slug = normalize(&json!({"title": "C"}));

        let never = archiver(DetailPages::Never);
        assert!(!never.wants_detail_page(&without_body));

        let missing = archiver(DetailPages::Missing);
        assert!(!missing.wants_detail_page(&with_body));
        assert!(missing.wants_detail_page(&without_body));
        assert!(!missing.wants_detail_page(&without_slug));

        let always = archiver(DetailPages::Always);
        assert!(always.wants_detail_page(&with_body));
        assert!(!always.wants_detail_page(&without_slug));
    }

    #[tokio::test]
    async fn test_page_failure_gives_empty_summary() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut archiver = archiver(DetailPages::Missing);
        archiver.config.output_directory = tmp.path().to_path_buf();

        let summary = archiver.archive().await;
        assert_eq!(summary, ArchiveSummary::new("t"));
        assert!(archiver.progress.is_empty());
    }
}
