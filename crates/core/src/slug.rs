//! Filesystem-safe keys derived from post titles.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s-]").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Turns a title into the file stem used for deduplication.
///
/// Decomposes the text and drops diacritics, keeps only ASCII letters,
/// digits, whitespace and hyphens, then collapses separator runs into a
/// single hyphen. Distinct titles can collide; the first one archived wins.
///
/// ```rust
/// use quire_core::slugify;
///
/// assert_eq!(slugify("Café Déjà-vu!"), "Cafe-Deja-vu");
/// ```
pub fn slugify(title: &str) -> String {
    let stripped: String = title.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let kept = DISALLOWED.replace_all(&stripped, "");
    SEPARATORS.replace_all(&kept, "-").trim_matches('-').to_string()
}
