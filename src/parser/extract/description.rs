use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

use super::{capture, first_match, Matcher};

pub const MAX_DESCRIPTION_CHARS: usize = 2000;

// Each pattern stops at the nearest closing tag of the same element, so a
// nested <div> inside the description cuts it short. Kept as-is.
static STRUCTURAL_RES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r#"(?is)<div[^>]*class=["'][^"']*description[^"']*["'][^>]*>(.*?)</div>"#,
        r#"(?is)<div[^>]*class=["'][^"']*product-description[^"']*["'][^>]*>(.*?)</div>"#,
        r#"(?is)<div[^>]*id=["']description["'][^>]*>(.*?)</div>"#,
        r#"(?is)<section[^>]*class=["'][^"']*description[^"']*["'][^>]*>(.*?)</section>"#,
    ]
    .map(|p| Regex::new(p).unwrap())
});
static OG_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)og:description["'][^>]*content=["']([^"']+)["']"#).unwrap()
});
static META_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+name=["']description["']\s+content=["']([^"']+)["']"#).unwrap()
});
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

const MATCHERS: &[Matcher] = &[structural, og_description, meta_description];

/// Product description as an HTML fragment. Markup is kept; only scripts,
/// styles and comments are removed.
pub fn extract(html: &str) -> String {
    first_match(html, MATCHERS)
        .map(|d| sanitize(&d))
        .unwrap_or_default()
}

/// The first structural pattern that matches decides; an empty body there
/// falls through to the meta tags rather than to the next pattern.
fn structural(html: &str) -> Option<String> {
    STRUCTURAL_RES
        .iter()
        .find_map(|re| capture(re, html))
        .map(|body| body.trim().to_string())
        .filter(|body| !body.is_empty())
}

fn og_description(html: &str) -> Option<String> {
    capture(&OG_DESCRIPTION_RE, html).map(|d| wrap_paragraph(&d))
}

fn meta_description(html: &str) -> Option<String> {
    capture(&META_DESCRIPTION_RE, html).map(|d| wrap_paragraph(&d))
}

fn wrap_paragraph(text: &str) -> String {
    format!("<p>{}</p>", decode_html_entities(text))
}

fn sanitize(fragment: &str) -> String {
    let out = SCRIPT_RE.replace_all(fragment, "");
    let out = STYLE_RE.replace_all(&out, "");
    let out = COMMENT_RE.replace_all(&out, "");
    truncate(out.trim())
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_DESCRIPTION_CHARS {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", head)
    }
}
