use scraper::{Html, Selector};
use tracing::warn;

/// Share widget container on post pages.
const SHARE_CONTAINER: &str = "pencraft pc-display-flex pc-flexDirection-column pc-gap-24 pc-padding-24 pc-reset bg-primary-zk6FDl border-detail-EGrm7T pc-borderRadius-md container-xiJVit";

/// Inline subscribe prompt container.
const SUBSCRIBE_CONTAINER: &str = "pencraft pc-display-flex pc-flexDirection-column pc-gap-20 pc-reset";

/// Heading anchors, removed only when they carry no text.
const HEADER_ANCHOR: &str = ".header-anchor-post";

/// Configuration for stripping page chrome before text conversion
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Selectors whose matching elements are removed together with their content
    pub denylist: Vec<String>,
    /// Additional selectors supplied by the caller
    pub extra_selectors: Vec<String>,
    /// Whether to drop heading anchors that have no text content
    pub remove_empty_anchors: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            denylist: vec![
                "div.modal".to_string(),
                "div.post-ufi".to_string(),
                format!("div[class=\"{SHARE_CONTAINER}\"]"),
                format!("div[class=\"{SUBSCRIBE_CONTAINER}\"]"),
                "div.subscribe-widget".to_string(),
                "ul.dropdown-menu.tooltip.subscribe-prompt-dropdown.free".to_string(),
                "div.captioned-image-container".to_string(),
                "div.visibility-check".to_string(),
                "div.divider-Ti4OTa".to_string(),
                "footer".to_string(),
                "script".to_string(),
                "style".to_string(),
            ],
            extra_selectors: Vec::new(),
            remove_empty_anchors: true,
        }
    }
}

/// Remove share widgets, subscribe prompts and other noise from an HTML document.
///
/// Every selector is applied in the same pass, so the result does not depend
/// on the order of the denylist. Input with nothing to remove is returned as is.
pub fn clean(html: &str, config: &SanitizeConfig) -> String {
    let mut processed = remove_denylisted(html, config);

    if config.remove_empty_anchors {
        processed = remove_empty_anchors(&processed);
    }

    processed
}

/// Remove every element matching a denylist selector
fn remove_denylisted(html: &str, config: &SanitizeConfig) -> String {
    let selectors: Vec<&String> = config
        .denylist
        .iter()
        .chain(config.extra_selectors.iter())
        .filter(|sel| match sel.parse::<lol_html::Selector>() {
            Ok(_) => true,
            Err(e) => {
                warn!(selector = %sel, error = %e, "ignoring invalid sanitizer selector");
                false
            }
        })
        .collect();

    if selectors.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: selectors
                .iter()
                .map(|sel| {
                    lol_html::element!(sel.as_str(), |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    output
}

/// Remove heading anchors whose text content is empty
fn remove_empty_anchors(html: &str) -> String {
    let Ok(selector) = Selector::parse(HEADER_ANCHOR) else {
        return html.to_string();
    };

    let mut document = Html::parse_document(html);
    let empty: Vec<_> = document
        .select(&selector)
        .filter(|el| el.text().all(|t| t.trim().is_empty()))
        .map(|el| el.id())
        .collect();

    if empty.is_empty() {
        return html.to_string();
    }

    for id in empty {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_denylisted_elements() {
        let html = r#"
            <html>
                <head><style>p{color:red;}</style><script>track();</script></head>
                <body>
                    <div class="modal">Sign in</div>
                    <div class="post-ufi">Like Share</div>
                    <div class="subscribe-widget">Subscribe now</div>
                    <ul class="dropdown-menu tooltip subscribe-prompt-dropdown free"><li>Free</li></ul>
                    <div class="captioned-image-container"><img src="a.png"></div>
                    <div class="visibility-check"></div>
                    <div class="divider-Ti4OTa"></div>
                    <p>Real content</p>
                    <footer>Archived from somewhere</footer>
                </body>
            </html>
        "#;

        let result = clean(html, &SanitizeConfig::default());
        assert!(!result.contains("Sign in"));
        assert!(!result.contains("Like Share"));
        assert!(!result.contains("Subscribe now"));
        assert!(!result.contains("<li>Free</li>"));
        assert!(!result.contains("a.png"));
        assert!(!result.contains("visibility-check"));
        assert!(!result.contains("divider-Ti4OTa"));
        assert!(!result.contains("Archived from"));
        assert!(!result.contains("track()"));
        assert!(!result.contains("color:red"));
        assert!(result.contains("<p>Real content</p>"));
    }

    #[test]
    fn test_exact_class_string_containers() {
        let html = format!(
            r#"<div class="{SHARE_CONTAINER}">Share this</div><div class="{SUBSCRIBE_CONTAINER}">Get updates</div><div class="pencraft">Kept</div>"#
        );

        let result = clean(&html, &SanitizeConfig::default());
        assert!(!result.contains("Share this"));
        assert!(!result.contains("Get updates"));
        assert!(result.contains("Kept"));
    }

    #[test]
    fn test_empty_header_anchor_removed_non_empty_kept() {
        let html = r##"
            <html><body>
                <h2><a class="header-anchor-post" href="#one"></a>One</h2>
                <h2><a class="header-anchor-post" href="#two">§ Two</a></h2>
            </body></html>
        "##;

        let result = clean(html, &SanitizeConfig::default());
        assert!(!result.contains("href=\"#one\""));
        assert!(result.contains("href=\"#two\""));
        assert!(result.contains("§ Two"));
        assert!(result.contains("One"));
    }

    #[test]
    fn test_anchor_with_only_markup_is_empty() {
        let html = r#"<html><body><div class="header-anchor-post"><svg><path d="M0"></path></svg></div><p>x</p></body></html>"#;
        let result = clean(html, &SanitizeConfig::default());
        assert!(!result.contains("header-anchor-post"));
        assert!(result.contains("<p>x</p>"));
    }

    #[test]
    fn test_unmatched_input_unchanged() {
        let html = "<html><head></head><body><p>Nothing to strip here.</p></body></html>";
        assert_eq!(clean(html, &SanitizeConfig::default()), html);
    }

    #[test]
    fn test_input_made_only_of_noise_is_emptied() {
        let config = SanitizeConfig::default();

        assert_eq!(clean("<script>track();</script>", &config), "");
        assert_eq!(clean("<footer>Archived from x</footer>", &config), "");
        assert_eq!(clean(r#"<div class="subscribe-widget">Subscribe now</div>"#, &config), "");
        assert_eq!(clean("<style>p{color:red}</style><div class=\"modal\">Popup</div>", &config), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean("", &SanitizeConfig::default()), "");
    }

    #[test]
    fn test_extra_selectors() {
        let html = "<div class=\"paywall\">Upgrade</div><p>Text</p>";
        let config = SanitizeConfig { extra_selectors: vec!["div.paywall".to_string()], ..Default::default() };

        let result = clean(html, &config);
        assert!(!result.contains("Upgrade"));
        assert!(result.contains("<p>Text</p>"));
    }

    #[test]
    fn test_invalid_extra_selector_is_ignored() {
        let html = "<div class=\"modal\">Popup</div><p>Text</p>";
        let config = SanitizeConfig { extra_selectors: vec!["div[".to_string()], ..Default::default() };

        let result = clean(html, &config);
        assert!(!result.contains("Popup"));
        assert!(result.contains("<p>Text</p>"));
    }

    #[test]
    fn test_removal_order_does_not_matter() {
        let html = r#"<div class="modal"><div class="subscribe-widget">Nested</div></div><footer><div class="post-ufi">x</div></footer><p>Body</p>"#;

        let forward = SanitizeConfig::default();
        let mut reversed = SanitizeConfig::default();
        reversed.denylist.reverse();

        assert_eq!(clean(html, &forward), clean(html, &reversed));
    }
}
