//! On-disk archive for one publication.
//!
//! Layout under `{output_directory}/{handle}/`:
//!
//! ```text
//! html_dumps/<slug>.html   rendered post, written once
//! json_dumps/dump.json     raw listing payload, rewritten every run
//! text_dumps/<slug>.txt    plain-text mirror of html_dumps
//! ```
//!
//! An HTML file's existence is the only "already archived" marker. The set of
//! existing file names is read once when the store is opened and kept up to
//! date as files are written, so lookups never touch the filesystem.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::formatters::{TextConfig, convert_to_text, render_post};
use crate::sanitize::{SanitizeConfig, clean};
use crate::{ArchiveError, Post, Result, slugify};

const HTML_DIR: &str = "html_dumps";
const JSON_DIR: &str = "json_dumps";
const TEXT_DIR: &str = "text_dumps";
const DUMP_FILE: &str = "dump.json";

/// Append-only archive of one publication's posts.
#[derive(Debug)]
pub struct ArchiveStore {
    root: PathBuf,
    html_dir: PathBuf,
    json_dir: PathBuf,
    text_dir: PathBuf,
    existing: HashSet<String>,
    sanitize: Arc<SanitizeConfig>,
    text: Arc<TextConfig>,
}

impl ArchiveStore {
    /// Opens (creating if needed) the archive for `handle` under `output_directory`.
    pub fn open(handle: &str, output_directory: impl AsRef<Path>) -> Result<Self> {
        let root = output_directory.as_ref().join(handle);
        let html_dir = root.join(HTML_DIR);
        let json_dir = root.join(JSON_DIR);
        let text_dir = root.join(TEXT_DIR);

        for dir in [&html_dir, &json_dir, &text_dir] {
            fs::create_dir_all(dir)?;
        }

        let existing = load_existing_html(&html_dir)?;
        debug!(dir = %html_dir.display(), count = existing.len(), "loaded existing HTML files");

        Ok(Self {
            root,
            html_dir,
            json_dir,
            text_dir,
            existing,
            sanitize: Arc::new(SanitizeConfig::default()),
            text: Arc::new(TextConfig::default()),
        })
    }

    /// Replaces the sanitizer and text settings used by [`Self::convert_to_text`].
    pub fn with_conversion(mut self, sanitize: SanitizeConfig, text: TextConfig) -> Self {
        self.sanitize = Arc::new(sanitize);
        self.text = Arc::new(text);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    pub fn text_dir(&self) -> &Path {
        &self.text_dir
    }

    /// Number of HTML files known to the store.
    pub fn archived_count(&self) -> usize {
        self.existing.len()
    }

    /// Whether a post with this title has already been archived.
    pub fn exists(&self, title: &str) -> bool {
        self.existing.contains(&html_file_name(title))
    }

    /// Writes the unprocessed listing payload to `json_dumps/dump.json`.
    pub fn dump_raw(&self, records: &[Value]) -> Result<PathBuf> {
        let path = self.json_dir.join(DUMP_FILE);
        fs::write(&path, serde_json::to_vec(records)?)?;
        Ok(path)
    }

    /// Renders the archived HTML page for a post.
    pub fn render_html(&self, post: &Post, source_url: &str) -> String {
        render_post(post, source_url)
    }

    /// Saves rendered HTML unless the target file already exists.
    ///
    /// Returns `Ok(None)` when nothing was written.
    pub fn save_html(&mut self, title: &str, html: &str) -> Result<Option<PathBuf>> {
        let file_name = html_file_name(title);
        let path = self.html_dir.join(&file_name);
        if file_name == ".html" {
            warn!(title, "title has no filesystem-safe characters, saving as .html");
        }

        if path.is_file() {
            debug!(path = %path.display(), "HTML file already exists, skipping");
            self.existing.insert(file_name);
            return Ok(None);
        }

        fs::write(&path, html)?;
        debug!(path = %path.display(), "saved HTML file");
        self.existing.insert(file_name);
        Ok(Some(path))
    }

    /// Text file mirroring an HTML file of this archive.
    pub fn text_path_for(&self, html_path: &Path) -> Result<PathBuf> {
        let relative = html_path.strip_prefix(&self.html_dir).map_err(|_| {
            ArchiveError::IoError(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not inside {}", html_path.display(), self.html_dir.display()),
            ))
        })?;
        Ok(self.text_dir.join(relative).with_extension("txt"))
    }

    /// Converts a saved HTML file to plain text on the blocking thread pool.
    ///
    /// The returned future owns everything it needs, so it can be spawned and
    /// awaited later while the caller moves on to the next post.
    pub fn convert_to_text(&self, html_path: PathBuf) -> impl Future<Output = Result<PathBuf>> + Send + 'static {
        let text_path = self.text_path_for(&html_path);
        let sanitize = Arc::clone(&self.sanitize);
        let text = Arc::clone(&self.text);

        async move {
            let text_path = text_path?;
            let target = text_path.clone();
            tokio::task::spawn_blocking(move || convert_file(&html_path, &target, &sanitize, &text)).await??;
            Ok(text_path)
        }
    }
}

/// Reads an HTML file, strips page chrome, and writes its plain text.
pub fn convert_file(html_path: &Path, text_path: &Path, sanitize: &SanitizeConfig, text: &TextConfig) -> Result<()> {
    let html = fs::read_to_string(html_path)?;
    let cleaned = clean(&html, sanitize);
    let content = convert_to_text(&cleaned, text);

    if let Some(parent) = text_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(text_path, content)?;
    Ok(())
}

fn html_file_name(title: &str) -> String {
    format!("{}.html", slugify(title))
}

fn load_existing_html(dir: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".html") && entry.file_type()?.is_file() {
            names.insert(name);
        }
    }
    Ok(names)
}
