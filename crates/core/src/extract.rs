//! Main-content extraction from rendered post pages.
//!
//! Post pages carry the article inside one of a few well-known containers.
//! [`ContentSelectors`] tries them in order and returns the first match's
//! outer HTML; pages where nothing matches are reported as `None`, which the
//! orchestrator counts as a missing body.

use scraper::{Html, Selector};

use crate::{ArchiveError, Result};

/// Containers tried on a post page, most specific first.
pub const DEFAULT_CONTENT_SELECTORS: [&str; 3] = ["div.post-content", "article.post", "div.body"];

/// Ordered list of parsed content selectors.
#[derive(Debug, Clone)]
pub struct ContentSelectors {
    selectors: Vec<Selector>,
}

impl ContentSelectors {
    /// Parses the selectors, failing on the first invalid one.
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| {
                Selector::parse(s.as_ref()).map_err(|e| ArchiveError::SelectorError(format!("{}: {}", s.as_ref(), e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Outer HTML of the first element matched by the first selector that matches anything.
    pub fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        self.selectors
            .iter()
            .find_map(|selector| document.select(selector).next())
            .map(|element| element.html())
    }
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| Selector::parse(s).unwrap())
                .collect(),
        }
    }
}

/// Extracts the article container from a post page with the default selectors.
pub fn extract_main_content(html: &str) -> Option<String> {
    ContentSelectors::default().extract(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_selector_wins() {
        let html = r#"
            <html><body>
                <article class="post"><p>Article wrapper</p></article>
                <div class="post-content"><p>Real body</p></div>
            </body></html>
        "#;

        let content = extract_main_content(html).unwrap();
        assert!(content.starts_with(r#"<div class="post-content">"#));
        assert!(content.contains("Real body"));
        assert!(!content.contains("Article wrapper"));
    }

    #[test]
    fn test_falls_back_in_order() {
        let article = r#"<html><body><article class="post"><p>A</p></article><div class="body">B</div></body></html>"#;
        assert_eq!(
            extract_main_content(article).as_deref(),
            Some(r#"<article class="post"><p>A</p></article>"#)
        );

        let body_only = r#"<html><body><div class="body"><p>B</p></div></body></html>"#;
        assert_eq!(
            extract_main_content(body_only).as_deref(),
            Some(r#"<div class="body"><p>B</p></div>"#)
        );
    }

    #[test]
    fn test_no_match_is_none() {
        let html = "<html><body><main><p>Paywalled teaser</p></main></body></html>";
        assert!(extract_main_content(html).is_none());
        assert!(extract_main_content("").is_none());
    }

    #[test]
    fn test_first_element_of_matching_selector() {
        let html = r#"<div class="post-content">one</div><div class="post-content">two</div>"#;
        assert_eq!(extract_main_content(html).as_deref(), Some(r#"<div class="post-content">one</div>"#));
    }

    #[test]
    fn test_custom_selectors() {
        let selectors = ContentSelectors::new(&["section.entry"]).unwrap();
        let html = r#"<section class="entry">E</section><div class="post-content">P</div>"#;
        assert_eq!(selectors.extract(html).as_deref(), Some(r#"<section class="entry">E</section>"#));
    }

    #[test]
    fn test_invalid_selector_errors() {
        let result = ContentSelectors::new(&["div["]);
        assert!(matches!(result, Err(ArchiveError::SelectorError(_))));
    }
}
