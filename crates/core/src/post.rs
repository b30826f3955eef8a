//! Canonical post entity and normalization of listing records.
//!
//! Listing payloads are loosely typed and grow new fields over time. A
//! [`Post`] keeps the handful of fields the archiver actually reads as typed
//! options and carries everything else in [`Post::extra_fields`], so a record
//! survives a normalize/serialize round trip without losing data.

use serde::Serialize;
use serde_json::{Map, Value};

/// Keys lifted out of a raw record into typed fields.
const CANONICAL_FIELDS: [&str; 8] = [
    "title",
    "body_html",
    "description",
    "audio_url",
    "podcast_url",
    "post_date",
    "audience",
    "slug",
];

/// One post from a publication's listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Post {
    /// Post title. Required before anything is written to disk.
    pub title: Option<String>,

    /// Article HTML, either from the listing or extracted from the post page.
    /// `None` usually means the post is paywalled.
    pub body_html: Option<String>,

    /// Subtitle / teaser.
    pub description: Option<String>,

    /// Audio enclosure.
    pub audio_url: Option<String>,

    /// Podcast enclosure, used when `audio_url` is absent.
    pub podcast_url: Option<String>,

    /// Publication date as sent by the API (usually ISO-8601).
    pub post_date: Option<String>,

    /// Intended audience, e.g. `everyone` or `only_paid`.
    pub audience: Option<String>,

    /// URL slug of the post page (`{base_url}/p/{slug}`).
    pub slug: Option<String>,

    /// Every field not listed above, untouched.
    #[serde(flatten)]
    pub extra_fields: Map<String, Value>,
}

impl Post {
    /// Builds a post from a raw listing object.
    ///
    /// Canonical keys holding a string become typed fields; `null` becomes
    /// `None`. A canonical key holding any other JSON type is left in
    /// `extra_fields` instead of being dropped.
    pub fn from_record(mut record: Map<String, Value>) -> Self {
        let mut post = Post::default();

        for key in CANONICAL_FIELDS {
            let value = match record.remove(key) {
                Some(Value::String(s)) => Some(s),
                Some(Value::Null) | None => None,
                Some(other) => {
                    record.insert(key.to_string(), other);
                    None
                }
            };

            match key {
                "title" => post.title = value,
                "body_html" => post.body_html = value,
                "description" => post.description = value,
                "audio_url" => post.audio_url = value,
                "podcast_url" => post.podcast_url = value,
                "post_date" => post.post_date = value,
                "audience" => post.audience = value,
                "slug" => post.slug = value,
                _ => unreachable!("key not in CANONICAL_FIELDS"),
            }
        }

        post.extra_fields = record;
        post
    }

    /// Title, when present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Body HTML, when present and non-empty.
    pub fn body(&self) -> Option<&str> {
        self.body_html.as_deref().filter(|b| !b.is_empty())
    }

    /// Slug of the post page, when present and non-empty.
    pub fn page_slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }

    /// Audio link for the rendered page, preferring `audio_url`.
    pub fn audio(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .filter(|a| !a.is_empty())
            .or_else(|| self.podcast_url.as_deref().filter(|p| !p.is_empty()))
    }
}

/// Normalizes any JSON value into a [`Post`].
///
/// Never fails: a value that is not an object produces an empty post.
pub fn normalize(record: &Value) -> Post {
    match record {
        Value::Object(map) => Post::from_record(map.clone()),
        _ => Post::default(),
    }
}
