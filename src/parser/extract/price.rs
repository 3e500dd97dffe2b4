use std::sync::LazyLock;

use regex::Regex;

use super::{capture, first_match, Matcher};
use crate::parser::text::clean_text;

static JSON_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price":\s*([0-9.]+)"#).unwrap());
static JSON_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price":\s*"([^"]+)""#).unwrap());
static ITEMPROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"itemprop=["']price["']\s+content=["']([^"']+)["']"#).unwrap()
});
static DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9,]+\.?[0-9]*)").unwrap());

// The first occurrence in document order is taken as the featured product's
// price, even when later ones look better.
const MATCHERS: &[Matcher] = &[json_number, json_string, itemprop, dollar_amount];

pub fn extract(html: &str) -> String {
    first_match(html, MATCHERS)
        .map(|p| clean_text(&p))
        .unwrap_or_default()
}

fn json_number(html: &str) -> Option<String> {
    capture(&JSON_NUMBER_RE, html)
}

fn json_string(html: &str) -> Option<String> {
    capture(&JSON_STRING_RE, html)
}

fn itemprop(html: &str) -> Option<String> {
    capture(&ITEMPROP_RE, html)
}

fn dollar_amount(html: &str) -> Option<String> {
    capture(&DOLLAR_RE, html)
}

/// Parse price-like text ("$1,299.00", " 10 ") as a number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}
