use std::sync::LazyLock;

use regex::Regex;

use super::capture_where;
use super::price::parse_amount;
use crate::parser::text::clean_text;

const MIN_AMOUNT: f64 = 0.01;
const MAX_AMOUNT: f64 = 10_000.0;

const AMOUNT: &str = r"([0-9][0-9,]*(?:\.[0-9]+)?)";

/// Platform conventions for the pre-discount price, most specific first.
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Structured RRP / MSRP fields
        format!(r#"(?i)"(?:rrp|msrp|recommended_?retail_?price)"\s*:\s*"?\$?{AMOUNT}"#),
        // Shopify
        format!(r#""compare_at_price"\s*:\s*"?{AMOUNT}"#),
        format!(r#""compareAtPrice"\s*:\s*\{{?\s*(?:"amount"\s*:\s*)?"?{AMOUNT}"#),
        // Magento price boxes, either attribute order
        format!(
            r#"(?i)data-price-type=["']oldPrice["'][^>]*data-price-amount=["']{AMOUNT}["']"#
        ),
        format!(
            r#"(?i)data-price-amount=["']{AMOUNT}["'][^>]*data-price-type=["']oldPrice["']"#
        ),
        // Old/regular price markup
        format!(
            r#"(?i)class=["'][^"']*(?:old-price|was-price|price--compare|compare-price|compare-at-price|regular-price|price-was)[^"']*["'][^>]*>(?:\s|<[^>]+>|\$|&nbsp;)*{AMOUNT}"#
        ),
        // Schema.org list price
        format!(
            r#"(?i)"priceType"\s*:\s*"(?:https?://schema\.org/)?(?:ListPrice|StrikethroughPrice)"[^{{}}]*?"price"\s*:\s*"?{AMOUNT}"#
        ),
        format!(
            r#"(?i)"price"\s*:\s*"?{AMOUNT}"?[^{{}}]*?"priceType"\s*:\s*"(?:https?://schema\.org/)?(?:ListPrice|StrikethroughPrice)""#
        ),
        format!(r#"(?i)"(?:list_?price|original_?price)"\s*:\s*"?\$?{AMOUNT}"#),
        // Free text
        format!(r"(?i)\bwas:?\s*\$\s*{AMOUNT}"),
        format!(r"(?i)\b(?:regular|original|list)\s+price:?\s*\$\s*{AMOUNT}"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Original price before discount. Empty when absent or when it merely
/// repeats `price`.
pub fn extract(html: &str, price: &str) -> String {
    let Some(found) = PATTERNS
        .iter()
        .find_map(|re| capture_where(re, html, is_plausible))
    else {
        return String::new();
    };

    let found = clean_text(&found);
    match (parse_amount(&found), parse_amount(price)) {
        (Some(was), Some(now)) if was == now => String::new(),
        _ => found,
    }
}

/// Rejects zero prices and values too large to be a single item, which are
/// usually quantities or subscription totals.
fn is_plausible(amount: &str) -> bool {
    parse_amount(amount).is_some_and(|v| v > MIN_AMOUNT && v < MAX_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract::price;

    #[test]
    fn equal_to_price_is_suppressed() {
        let html = r#"{"price": "10.00", "compare_at_price": "10.00"}"#;
        let p = price::extract(html);
        assert_eq!(p, "10.00");
        assert_eq!(extract(html, &p), "");
    }

    #[test]
    fn equality_is_numeric() {
        let html = r#"{"compare_at_price": "10"}"#;
        assert_eq!(extract(html, "10.00"), "");
    }

    #[test]
    fn shopify_compare_at() {
        let html = r#"{"price":"49.00","compare_at_price":"65.00"}"#;
        assert_eq!(extract(html, "49.00"), "65.00");
    }

    #[test]
    fn shopify_storefront_money() {
        let html = r#""compareAtPrice":{"amount":"80.0","currencyCode":"USD"}"#;
        assert_eq!(extract(html, "60.0"), "80.0");
    }

    #[test]
    fn rrp_field() {
        assert_eq!(extract(r#"{"RRP": "$129.99"}"#, "99.99"), "129.99");
    }

    #[test]
    fn magento_old_price_either_order() {
        let a = r#"<span data-price-type="oldPrice" data-price-amount="75" class="price-wrapper">"#;
        let b = r#"<span data-price-amount="75" data-price-type="oldPrice">"#;
        assert_eq!(extract(a, "60"), "75");
        assert_eq!(extract(b, "60"), "75");
    }

    #[test]
    fn old_price_markup() {
        let html = r#"<p class="price"><del class="old-price"><span>$</span> 34.50</del></p>"#;
        assert_eq!(extract(html, "29.00"), "34.50");
    }

    #[test]
    fn schema_list_price() {
        let html = r#"{"@type":"UnitPriceSpecification","priceType":"https://schema.org/ListPrice","price":"220.00"}"#;
        assert_eq!(extract(html, "180.00"), "220.00");
    }

    #[test]
    fn was_free_text() {
        assert_eq!(extract("<p>Was: $1,250.00 now $999</p>", "999"), "1,250.00");
    }

    #[test]
    fn out_of_range_values_skipped() {
        // 0 and 25000 fail validation; the second candidate of the same
        // pattern is used.
        let html = r#"{"compare_at_price": 0} {"compare_at_price": 25000} {"compare_at_price": "45.00"}"#;
        assert_eq!(extract(html, "30.00"), "45.00");
    }

    #[test]
    fn invalid_pattern_falls_through_to_next() {
        let html = r#"{"msrp": "0.00"} <s class="was-price">$12.00</s>"#;
        assert_eq!(extract(html, "9.00"), "12.00");
    }

    #[test]
    fn unparseable_price_keeps_compare_at() {
        assert_eq!(extract(r#"{"compare_at_price":"15.00"}"#, ""), "15.00");
    }

    #[test]
    fn nothing_found() {
        assert_eq!(extract("<p>$10.00</p>", "10.00"), "");
    }
}
