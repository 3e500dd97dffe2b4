use std::sync::LazyLock;

use regex::Regex;

use super::{capture, first_match, Matcher};

static OG_TITLE_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        r#"(?i)og:title["'][^>]*content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:title["']"#,
    ]
    .map(|p| Regex::new(p).unwrap())
});
static TITLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>([^<]+)</title>").unwrap());

const MATCHERS: &[Matcher] = &[og_title, title_tag];

/// Raw (uncleaned) product title, or empty when nothing matches.
pub fn extract(html: &str) -> String {
    first_match(html, MATCHERS).unwrap_or_default()
}

fn og_title(html: &str) -> Option<String> {
    OG_TITLE_RES.iter().find_map(|re| capture(re, html))
}

fn title_tag(html: &str) -> Option<String> {
    capture(&TITLE_TAG_RE, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_title_without_title_tag() {
        let html = r#"<head><meta property="og:title" content="Blue Widget"></head>"#;
        assert_eq!(extract(html), "Blue Widget");
    }

    #[test]
    fn og_title_beats_title_tag() {
        let html = r#"<title>Shop | Blue Widget</title><META PROPERTY='OG:TITLE' CONTENT='Blue Widget'>"#;
        assert_eq!(extract(html), "Blue Widget");
    }

    #[test]
    fn og_title_content_before_property() {
        let html = r#"<title>Shop</title><meta content="Blue Widget" property="og:title" />"#;
        assert_eq!(extract(html), "Blue Widget");
    }

    #[test]
    fn falls_back_to_title_tag() {
        assert_eq!(extract("<html><TITLE>Red Gadget</TITLE></html>"), "Red Gadget");
    }

    #[test]
    fn nothing_matches() {
        assert_eq!(extract(""), "");
        assert_eq!(extract("<html><title></title><h1>Heading</h1></html>"), "");
    }
}
