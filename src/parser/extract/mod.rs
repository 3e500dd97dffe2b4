pub mod compare_at;
pub mod description;
pub mod image;
pub mod price;
pub mod title;

use regex::Regex;

/// One strategy in a field's fallback chain.
pub type Matcher = fn(&str) -> Option<String>;

/// Raw field values pulled from one document, before record assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub title: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: String,
    pub image: String,
}

/// Run matchers in order and return the first hit.
pub fn first_match(html: &str, matchers: &[Matcher]) -> Option<String> {
    matchers.iter().find_map(|m| m(html))
}

/// First capture group of the first match of `re` in `html`.
pub(crate) fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html).map(|c| c[1].to_string())
}

/// First capture group, across all matches of `re`, that satisfies `keep`.
pub(crate) fn capture_where<F>(re: &Regex, html: &str, keep: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    re.captures_iter(html)
        .map(|c| c[1].to_string())
        .find(|v| keep(v))
}

pub fn extract_all(html: &str) -> ExtractedFields {
    let title = title::extract(html);
    let description = description::extract(html);
    let price = price::extract(html);
    let compare_at_price = compare_at::extract(html, &price);
    let image = image::extract(html);

    ExtractedFields {
        title,
        description,
        price,
        compare_at_price,
        image,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Trail Runner 2 | Outdoor Co</title>
<meta property="og:title" content="Trail Runner 2">
<meta property="og:image" content="https://cdn.outdoor.example/files/trail-runner_280x280.jpg">
<meta property="og:description" content="Lightweight trail shoe.">
<script type="application/ld+json">
{"@type":"Product","name":"Trail Runner 2","offers":{"price": 129.95,"priceCurrency":"USD"}}
</script>
</head>
<body>
<div class="product-description rte"><p>Grippy outsole.</p><script>track()</script></div>
<span class="price">$129.95</span>
<s class="price--compare">$159.00</s>
</body>
</html>"#;

    #[test]
    fn first_match_short_circuits() {
        fn never(_: &str) -> Option<String> {
            None
        }
        fn hit(_: &str) -> Option<String> {
            Some("a".into())
        }
        fn later(_: &str) -> Option<String> {
            panic!("must not run after a hit")
        }
        assert_eq!(first_match("", &[never, hit, later]), Some("a".into()));
        assert_eq!(first_match("", &[never]), None);
    }

    #[test]
    fn shop_page_fields() {
        let f = extract_all(SHOP_PAGE);
        assert_eq!(f.title, "Trail Runner 2");
        assert_eq!(f.description, "<p>Grippy outsole.</p>");
        assert_eq!(f.price, "129.95");
        assert_eq!(f.compare_at_price, "159.00");
        assert_eq!(f.image, "https://cdn.outdoor.example/files/trail-runner.jpg");
    }

    #[test]
    fn bare_page_is_all_empty() {
        let f = extract_all("<html><body><p>nothing here</p></body></html>");
        assert_eq!(f, ExtractedFields::default());
    }
}
