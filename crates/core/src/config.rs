//! Publication list loading.
//!
//! The configuration file is a JSON list. Each entry is either a bare URL
//! string or an object with a `url` and optional overrides:
//!
//! ```json
//! [
//!     "https://plebs.substack.com",
//!     {"url": "https://www.cafecomsatoshi.com.br/archive", "name": "cafe", "detail_pages": "always"}
//! ]
//! ```
//!
//! Malformed entries are skipped with a warning; only an unreadable file or a
//! non-list root is an error.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::{ArchiveError, Result};

static SUBSTACK_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(?:www\.)?([^.]+)\.substack\.com").unwrap());
static CUSTOM_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(?:www\.)?([^.]+)\.(?:com|com\.br|org|net)").unwrap());

/// When a post's own page is fetched to obtain its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailPages {
    /// Listing payload only.
    Never,
    /// Only for posts whose listing record has no body.
    #[default]
    Missing,
    /// For every post not yet archived.
    Always,
}

impl fmt::Display for DetailPages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailPages::Never => write!(f, "never"),
            DetailPages::Missing => write!(f, "missing"),
            DetailPages::Always => write!(f, "always"),
        }
    }
}

impl FromStr for DetailPages {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" => Ok(DetailPages::Never),
            "missing" => Ok(DetailPages::Missing),
            "always" => Ok(DetailPages::Always),
            other => Err(format!("unknown detail page mode '{other}' (expected never, missing or always)")),
        }
    }
}

/// One publication to archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationConfig {
    /// Short unique name, also the archive directory name.
    pub handle: String,
    /// Publication root without a trailing `/archive` or `/`.
    pub base_url: String,
    pub output_directory: PathBuf,
    pub skip_existing: bool,
    pub detail_pages: DetailPages,
}

impl PublicationConfig {
    /// Creates an entry with default options.
    pub fn new(handle: impl Into<String>, base_url: &str) -> Self {
        let defaults = ConfigDefaults::default();
        Self {
            handle: handle.into(),
            base_url: normalize_base_url(base_url),
            output_directory: defaults.output_directory,
            skip_existing: defaults.skip_existing,
            detail_pages: defaults.detail_pages,
        }
    }

    /// Whether the entry can be archived at all.
    ///
    /// The handle must be a single plain directory name, since it is joined
    /// onto the output directory.
    pub fn is_valid(&self) -> bool {
        is_plain_name(&self.handle) && !self.base_url.trim().is_empty()
    }
}

fn is_plain_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Values applied to entries that do not set their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub output_directory: PathBuf,
    pub skip_existing: bool,
    pub detail_pages: DetailPages,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self { output_directory: PathBuf::from("./archive"), skip_existing: true, detail_pages: DetailPages::default() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Url(String),
    Object(RawObject),
}

#[derive(Deserialize)]
struct RawObject {
    url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    output_directory: Option<PathBuf>,
    #[serde(default)]
    skip_existing: Option<bool>,
    #[serde(default)]
    detail_pages: Option<DetailPages>,
}

/// Reads and resolves the publication list at `path`.
pub fn load_config(path: impl AsRef<Path>, defaults: &ConfigDefaults) -> Result<Vec<PublicationConfig>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ArchiveError::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;
    parse_config(&content, defaults)
        .map_err(|e| ArchiveError::ConfigError(format!("{}: {}", path.display(), config_message(e))))
}

/// Resolves a publication list from its JSON text.
pub fn parse_config(content: &str, defaults: &ConfigDefaults) -> Result<Vec<PublicationConfig>> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| ArchiveError::ConfigError(format!("invalid JSON: {e}")))?;

    let Value::Array(entries) = root else {
        return Err(ArchiveError::ConfigError("the root is not a list".to_string()));
    };

    Ok(entries.into_iter().filter_map(|entry| resolve_entry(entry, defaults)).collect())
}

fn resolve_entry(entry: Value, defaults: &ConfigDefaults) -> Option<PublicationConfig> {
    let raw = match serde_json::from_value::<RawEntry>(entry.clone()) {
        Ok(raw) => raw,
        Err(_) => {
            warn!(entry = %entry, "skipping invalid config entry");
            return None;
        }
    };

    let (url, name, output_directory, skip_existing, detail_pages) = match raw {
        RawEntry::Url(url) => (url, None, None, None, None),
        RawEntry::Object(o) => (o.url, o.name, o.output_directory, o.skip_existing, o.detail_pages),
    };

    let handle = match name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => match derive_handle(&url) {
            Some(handle) => handle,
            None => {
                warn!(url = %url, "skipping config entry without a usable name");
                return None;
            }
        },
    };

    if !is_plain_name(&handle) {
        warn!(name = %handle, "skipping config entry whose name is not a plain directory name");
        return None;
    }

    let config = PublicationConfig {
        handle,
        base_url: normalize_base_url(&url),
        output_directory: output_directory.unwrap_or_else(|| defaults.output_directory.clone()),
        skip_existing: skip_existing.unwrap_or(defaults.skip_existing),
        detail_pages: detail_pages.unwrap_or(defaults.detail_pages),
    };

    if !config.is_valid() {
        warn!(entry = %entry, "skipping config entry with an empty URL");
        return None;
    }
    Some(config)
}

fn config_message(err: ArchiveError) -> String {
    match err {
        ArchiveError::ConfigError(msg) => msg,
        other => other.to_string(),
    }
}

/// Derives a publication handle from its URL.
///
/// `https://plebs.substack.com` gives `plebs`,
/// `https://www.cafecomsatoshi.com.br/archive` gives `cafecomsatoshi`. Other
/// hosts fall back to their first label, with a warning.
pub fn derive_handle(url: &str) -> Option<String> {
    for pattern in [&*SUBSTACK_HOST, &*CUSTOM_HOST] {
        if let Some(caps) = pattern.captures(url) {
            return Some(caps[1].to_string());
        }
    }

    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let name = host.strip_prefix("www.").unwrap_or(host).split('.').next()?;
    if name.is_empty() {
        return None;
    }

    warn!(url, name, "using fallback name extraction");
    Some(name.to_string())
}

/// Strips a trailing `/archive` and any trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/archive").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}
