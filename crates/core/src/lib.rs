pub mod archive;
pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod post;
pub mod progress;
pub mod runner;
pub mod sanitize;
pub mod slug;
pub mod storage;

pub use archive::{ArchiveSummary, Archiver};
pub use browser::{Browser, BrowserConfig, Credentials, DEFAULT_USER_AGENT, Page};
#[cfg(feature = "fetch")]
pub use browser::{HttpBrowser, HttpPage, StorageState};
pub use config::{ConfigDefaults, DetailPages, PublicationConfig, derive_handle, load_config, normalize_base_url};
pub use error::{ArchiveError, Result};
pub use extract::{ContentSelectors, extract_main_content};
pub use fetch::{DetailOutcome, FetchConfig, fetch_all_posts, fetch_post_body};
pub use formatters::{TextConfig, TextFormatter, convert_to_text, render_post};
pub use post::{Post, normalize};
pub use progress::{Phase, ProgressBoard, ProgressHandle, ProgressState};
pub use runner::{RunContext, run};
pub use sanitize::{SanitizeConfig, clean};
pub use slug::slugify;
pub use storage::ArchiveStore;
