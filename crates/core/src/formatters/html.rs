use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::Post;

const STYLESHEET: &str = r#"<style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
        }
        h1 { font-size: 2.2em; margin-bottom: 0.5em; }
        .post-meta { color: #666; font-size: 0.9em; margin-bottom: 2em; }
        .post-content { margin-top: 2em; }
        .post-content img { max-width: 100%; height: auto; }
        blockquote { border-left: 3px solid #ccc; margin-left: 0; padding-left: 20px; color: #555; }
        pre { background: #f6f8fa; padding: 16px; overflow: auto; border-radius: 3px; }
        code { font-family: monospace; background: #f6f8fa; padding: 2px 4px; border-radius: 3px; }
    </style>"#;

/// Render a post as a self-contained HTML document.
///
/// The same post and source always produce the same bytes.
pub fn render_post(post: &Post, source_url: &str) -> String {
    let title = escape_html(post.title().unwrap_or_default());
    let description = escape_html(post.description.as_deref().unwrap_or_default());
    let date_html = post.post_date.as_deref().map(format_date_html).unwrap_or_default();
    let audio_html = post.audio().map(format_audio_html).unwrap_or_default();
    let body = post.body().unwrap_or_default();
    let source = escape_html(source_url);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {STYLESHEET}
</head>
<body>
    <article>
        <header>
            <h1>{title}</h1>
            <div class="post-meta">
                {date_html}
                <div class="post-description">{description}</div>
                {audio_html}
            </div>
        </header>
        <div class="post-content">{body}</div>
    </article>
    <footer>
        <p>Archived from {source}</p>
    </footer>
</body>
</html>"#
    )
}

/// Format the date block, falling back to the raw value when it does not parse
fn format_date_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    match parse_post_date(raw) {
        Some(date) => format!(r#"<div class="post-date">{}</div>"#, date.format("%B %d, %Y")),
        None => {
            warn!(date = raw, "unrecognized post date format, keeping it verbatim");
            format!(r#"<div class="post-date">{}</div>"#, escape_html(raw))
        }
    }
}

/// Parse an ISO-8601 date or timestamp, keeping the calendar date of its own offset
fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(timestamp.date());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn format_audio_html(url: &str) -> String {
    format!(
        r#"<p>Audio link: <a href="{}">Listen to audio</a></p>"#,
        escape_html(url)
    )
}

/// Escape text for use in element content and double-quoted attributes
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
