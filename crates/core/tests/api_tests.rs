//! Library API integration tests
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quire_core::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const BASE: &str = "https://example.substack.com";

enum Reply {
    Body(String),
    Refused(u16),
}

/// In-memory site shared by every page the browser opens.
#[derive(Default)]
struct FakeSite {
    routes: HashMap<String, Reply>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn listing(mut self, base: &str, pages: &[Vec<Value>]) -> Self {
        for (i, page) in pages.iter().enumerate() {
            let url = format!("{base}/api/v1/posts?limit=50&offset={}", i * 50);
            self.routes.insert(url, Reply::Body(serde_json::to_string(page).unwrap()));
        }
        let end = format!("{base}/api/v1/posts?limit=50&offset={}", pages.len() * 50);
        self.routes.insert(end, Reply::Body("[]".to_string()));
        self
    }

    fn post_page(mut self, base: &str, slug: &str, html: &str) -> Self {
        self.routes.insert(format!("{base}/p/{slug}"), Reply::Body(html.to_string()));
        self
    }

    fn refused(mut self, base: &str, slug: &str, status: u16) -> Self {
        self.routes.insert(format!("{base}/p/{slug}"), Reply::Refused(status));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn count_matching(&self, needle: &str) -> usize {
        self.requests().iter().filter(|u| u.contains(needle)).count()
    }
}

struct FakeBrowser {
    site: Arc<FakeSite>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self, _base_url: &str) -> Result<Box<dyn Page>> {
        Ok(Box::new(FakePage { site: Arc::clone(&self.site), content: String::new() }))
    }
}

struct FakePage {
    site: Arc<FakeSite>,
    content: String,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.site.requests.lock().unwrap().push(url.to_string());
        self.content.clear();
        match self.site.routes.get(url) {
            Some(Reply::Body(body)) => {
                self.content = body.clone();
                Ok(())
            }
            Some(Reply::Refused(status)) => Err(ArchiveError::NavigationAborted { url: url.to_string(), status: *status }),
            None => Err(ArchiveError::HttpStatus { url: url.to_string(), status: 404 }),
        }
    }

    fn content(&self) -> &str {
        &self.content
    }
}

fn publication(handle: &str, base: &str, out: &TempDir) -> PublicationConfig {
    let mut config = PublicationConfig::new(handle, base);
    config.output_directory = out.path().to_path_buf();
    config
}

async fn archive(site: FakeSite, config: PublicationConfig) -> (ArchiveSummary, Arc<FakeSite>) {
    let site = Arc::new(site);
    let browser: Arc<dyn Browser> = Arc::new(FakeBrowser { site: Arc::clone(&site) });
    let summary = Archiver::new(browser, config, &RunContext::new()).archive().await;
    (summary, site)
}

fn post(title: &str, body: Option<&str>) -> Value {
    json!({"title": title, "body_html": body, "post_date": "2024-01-15T09:00:00.000Z"})
}

#[tokio::test]
async fn test_pagination_request_count() {
    let pages: Vec<Vec<Value>> =
        (0..2).map(|p| (0..50).map(|i| post(&format!("Post {}", p * 50 + i), Some("<p>x</p>"))).collect()).collect();
    let site = FakeSite::default().listing(BASE, &pages);

    let browser = FakeBrowser { site: Arc::new(site) };
    let mut page = browser.new_page(BASE).await.unwrap();
    let records = fetch_all_posts(BASE, page.as_mut(), &FetchConfig::default()).await;

    assert_eq!(records.len(), 100);
    assert_eq!(browser.site.requests().len(), 3);
}

#[tokio::test]
async fn test_archive_writes_all_artifacts() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default().listing(BASE, &[vec![post("Hello World", Some("<p>First post body.</p>"))]]);

    let (summary, _) = archive(site, publication("example", BASE, &out)).await;

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.records, 1);

    let root = out.path().join("example");
    let html = std::fs::read_to_string(root.join("html_dumps/Hello-World.html")).unwrap();
    assert!(html.contains("<h1>Hello World</h1>"));
    assert!(html.contains("January 15, 2024"));
    assert!(html.contains(&format!("Archived from {BASE}")));

    let text = std::fs::read_to_string(root.join("text_dumps/Hello-World.txt")).unwrap();
    assert!(text.contains("First post body."));

    let dump: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(root.join("json_dumps/dump.json")).unwrap()).unwrap();
    assert_eq!(dump.len(), 1);
}

#[tokio::test]
async fn test_skip_existing_leaves_file_untouched() {
    let out = TempDir::new().unwrap();
    let html_dir = out.path().join("example/html_dumps");
    std::fs::create_dir_all(&html_dir).unwrap();
    std::fs::write(html_dir.join("Post-One.html"), "original").unwrap();

    let site = FakeSite::default().listing(BASE, &[vec![post("Post One", Some("<p>new</p>"))]]);
    let (summary, _) = archive(site, publication("example", BASE, &out)).await;

    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.missing_body, 0);
    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(std::fs::read_to_string(html_dir.join("Post-One.html")).unwrap(), "original");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let out = TempDir::new().unwrap();
    let listing = vec![post("One", Some("<p>1</p>")), post("Two", Some("<p>2</p>"))];

    let (first, _) = archive(FakeSite::default().listing(BASE, &[listing.clone()]), publication("ex", BASE, &out)).await;
    let (second, _) = archive(FakeSite::default().listing(BASE, &[listing]), publication("ex", BASE, &out)).await;

    assert_eq!(first.downloaded, 2);
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped_existing, 2);
}

#[tokio::test]
async fn test_existing_file_without_skip_is_not_overwritten() {
    let out = TempDir::new().unwrap();
    let html_dir = out.path().join("example/html_dumps");
    std::fs::create_dir_all(&html_dir).unwrap();
    std::fs::write(html_dir.join("Post-One.html"), "original").unwrap();

    let mut config = publication("example", BASE, &out);
    config.skip_existing = false;

    let site = FakeSite::default().listing(BASE, &[vec![post("Post One", Some("<p>new</p>"))]]);
    let (summary, _) = archive(site, config).await;

    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.skipped_existing, 0);
    assert_eq!(std::fs::read_to_string(html_dir.join("Post-One.html")).unwrap(), "original");
}

#[tokio::test]
async fn test_missing_body_accounting() {
    let out = TempDir::new().unwrap();
    let mut config = publication("example", BASE, &out);
    config.detail_pages = DetailPages::Never;

    let site = FakeSite::default().listing(
        BASE,
        &[vec![post("A", Some("<p>a</p>")), post("B", None), post("C", Some("<p>c</p>"))]],
    );
    let (summary, _) = archive(site, config).await;

    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.missing_body, 1);
    assert!(!out.path().join("example/html_dumps/B.html").exists());
}

#[tokio::test]
async fn test_untitled_post_counts_as_missing_body() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default().listing(BASE, &[vec![json!({"body_html": "<p>orphan</p>"})]]);
    let (summary, _) = archive(site, publication("example", BASE, &out)).await;

    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.missing_body, 1);
}

#[tokio::test]
async fn test_detail_page_fills_missing_body() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default()
        .listing(
            BASE,
            &[vec![
                json!({"title": "Open", "slug": "open", "body_html": null}),
                json!({"title": "Listed", "slug": "listed", "body_html": "<p>from listing</p>"}),
            ]],
        )
        .post_page(BASE, "open", r#"<html><body><div class="post-content"><p>from page</p></div></body></html>"#);

    let (summary, site) = archive(site, publication("example", BASE, &out)).await;

    assert_eq!(summary.downloaded, 2);
    assert_eq!(site.count_matching("/p/open"), 1);
    assert_eq!(site.count_matching("/p/listed"), 0);

    let html = std::fs::read_to_string(out.path().join("example/html_dumps/Open.html")).unwrap();
    assert!(html.contains("from page"));
}

#[tokio::test]
async fn test_detail_page_always_replaces_listing_body() {
    let out = TempDir::new().unwrap();
    let mut config = publication("example", BASE, &out);
    config.detail_pages = DetailPages::Always;

    let site = FakeSite::default()
        .listing(BASE, &[vec![json!({"title": "Teaser", "slug": "teaser", "body_html": "<p>teaser only</p>"})]])
        .post_page(BASE, "teaser", r#"<article class="post"><p>full text</p></article>"#);

    let (summary, _) = archive(site, config).await;
    assert_eq!(summary.downloaded, 1);

    let html = std::fs::read_to_string(out.path().join("example/html_dumps/Teaser.html")).unwrap();
    assert!(html.contains("full text"));
    assert!(!html.contains("teaser only"));
}

#[tokio::test]
async fn test_inaccessible_post_is_skipped() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default()
        .listing(
            BASE,
            &[vec![
                json!({"title": "Paid", "slug": "paid", "audience": "only_paid"}),
                json!({"title": "Free", "slug": "free", "body_html": "<p>free</p>"}),
            ]],
        )
        .refused(BASE, "paid", 403);

    let (summary, _) = archive(site, publication("example", BASE, &out)).await;

    assert_eq!(summary.inaccessible, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.missing_body, 0);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_page_without_container_counts_as_missing_body() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default()
        .listing(BASE, &[vec![json!({"title": "Odd", "slug": "odd"})]])
        .post_page(BASE, "odd", "<html><body><main>no container</main></body></html>");

    let (summary, _) = archive(site, publication("example", BASE, &out)).await;
    assert_eq!(summary.missing_body, 1);
    assert_eq!(summary.downloaded, 0);
}

#[tokio::test]
async fn test_failed_post_page_is_counted() {
    let out = TempDir::new().unwrap();
    let site = FakeSite::default().listing(BASE, &[vec![json!({"title": "Gone", "slug": "gone"})]]);

    let (summary, _) = archive(site, publication("example", BASE, &out)).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.missing_body, 0);
}

#[tokio::test]
async fn test_runner_archives_in_config_order() {
    let out = TempDir::new().unwrap();
    let other = "https://other.substack.com";
    let site = Arc::new(
        FakeSite::default()
            .listing(BASE, &[vec![post("Alpha", Some("<p>a</p>"))]])
            .listing(other, &[vec![post("Beta", Some("<p>b</p>")), post("Gamma", Some("<p>g</p>"))]]),
    );
    let browser: Arc<dyn Browser> = Arc::new(FakeBrowser { site: Arc::clone(&site) });

    let configs = vec![
        publication("example", BASE, &out),
        PublicationConfig::new("", "https://invalid.example.com"),
        publication("other", other, &out),
    ];
    let ctx = RunContext::new();
    let summaries = run(browser, configs, &ctx).await;

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].handle, "example");
    assert_eq!(summaries[0].downloaded, 1);
    assert_eq!(summaries[1].handle, "other");
    assert_eq!(summaries[1].downloaded, 2);
    assert!(ctx.progress.is_empty());

    assert!(out.path().join("other/text_dumps/Gamma.txt").is_file());
}

#[test]
fn test_public_helpers() {
    assert_eq!(slugify("Café Déjà-vu!"), "Cafe-Deja-vu");
    assert_eq!(derive_handle("https://plebs.substack.com").as_deref(), Some("plebs"));
    assert_eq!(normalize(&json!({"title": "T", "weird_field": "x"})).extra_fields.len(), 1);
}
