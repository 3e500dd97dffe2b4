use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use url::Url;

use super::{capture_where, first_match, Matcher};
use crate::parser::upgrade::upgrade;

/// Substrings that mark an image as chrome, not product (matched lowercase).
const DENYLIST: &[&str] = &[
    "thumbnail",
    "_thumb",
    "placeholder",
    "loading",
    "icon",
    "logo",
    "_sm.",
    "_xs.",
    "/thumb/",
    "header",
    "footer",
    "banner",
    "crest",
    "horizontal",
    "brand",
    "site",
];

static OG_IMAGE_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        r#"(?i)<meta[^>]*property=["']og:image["'][^>]*content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:image["']"#,
    ]
    .map(|p| Regex::new(p).unwrap())
});
static JSON_LD_IMAGE_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [r#""image":\s*"([^"]+)""#, r#""image":\s*\[\s*"([^"]+)""#].map(|p| Regex::new(p).unwrap())
});
static PRODUCT_IMG_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        r#"(?i)<img[^>]*class=["'][^"']*product[^"']*["'][^>]*src=["']([^"']+)["']"#,
        r#"(?i)<img[^>]*id=["'][^"']*product[^"']*["'][^>]*src=["']([^"']+)["']"#,
    ]
    .map(|p| Regex::new(p).unwrap())
});
static SMALL_DIMENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])\d{1,3}x\d{1,3}(?:[._/]|$)").unwrap());
static SRCSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)srcset=["']([^"']+)["']"#).unwrap());
static WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)w$").unwrap());
static RASTER_IMG_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        r#"(?i)<img[^>]*\sdata-src=["']([^"']+\.(?:jpe?g|png|webp|gif))["']"#,
        r#"(?i)<img[^>]*\ssrc=["']([^"']+\.(?:jpe?g|png|webp|gif))["']"#,
    ]
    .map(|p| Regex::new(p).unwrap())
});
static PREFERRED_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:[5-9]\d{2}|[1-9]\d{3})x(?:[5-9]\d{2}|[1-9]\d{3})/|_(?:[5-9]\d{2}|[1-9]\d{3})x(?:\d{3,4})?\.")
        .unwrap()
});

const MATCHERS: &[Matcher] = &[og_image, json_ld_image, product_img, largest_srcset, raster_img];

/// Best product image URL, upgraded toward full size. Empty when none found.
pub fn extract(html: &str) -> String {
    first_match(html, MATCHERS)
        .map(|u| upgrade(&u))
        .unwrap_or_default()
}

pub fn is_denied(url: &str) -> bool {
    let lower = url.to_lowercase();
    DENYLIST.iter().any(|token| lower.contains(token))
}

fn first_allowed(res: &[Regex], html: &str) -> Option<String> {
    res.iter()
        .find_map(|re| capture_where(re, html, |u| !is_denied(u)))
}

fn og_image(html: &str) -> Option<String> {
    first_allowed(&*OG_IMAGE_RES, html)
}

fn json_ld_image(html: &str) -> Option<String> {
    first_allowed(&*JSON_LD_IMAGE_RES, html).map(|u| u.replace("\\/", "/"))
}

fn product_img(html: &str) -> Option<String> {
    PRODUCT_IMG_RES.iter().find_map(|re| {
        capture_where(re, html, |u| !is_denied(u) && !SMALL_DIMENSION_RE.is_match(u))
    })
}

/// Widest `<url> <N>w` candidate across every srcset in the page.
fn largest_srcset(html: &str) -> Option<String> {
    let mut best: Option<(u32, String)> = None;

    for caps in SRCSET_RE.captures_iter(html) {
        for source in caps[1].split(',') {
            let mut parts = source.split_whitespace();
            let (Some(url), Some(descriptor)) = (parts.next(), parts.next()) else {
                continue;
            };
            let Some(width) = WIDTH_RE
                .captures(descriptor)
                .and_then(|c| c[1].parse::<u32>().ok())
            else {
                continue;
            };
            if is_denied(url) {
                continue;
            }
            if best.as_ref().map_or(true, |(w, _)| width > *w) {
                best = Some((width, url.to_string()));
            }
        }
    }

    best.map(|(_, url)| url)
}

/// Any lazy or plain `<img>` with a raster extension, preferring ones whose
/// URL already names a mid-to-large size.
fn raster_img(html: &str) -> Option<String> {
    let candidates: Vec<String> = RASTER_IMG_RES
        .iter()
        .flat_map(|re| re.captures_iter(html).map(|c| c[1].to_string()))
        .filter(|u| !is_denied(u))
        .collect();

    candidates
        .iter()
        .find(|u| PREFERRED_SIZE_RE.is_match(u))
        .or_else(|| candidates.first())
        .cloned()
}

/// Decode entities and resolve relative image URLs against the page URL.
/// Absolute URLs and unparseable bases are returned decoded but otherwise
/// unchanged.
pub fn absolutize(image: &str, page_url: &str) -> String {
    if image.is_empty() {
        return String::new();
    }
    let decoded = decode_html_entities(image).into_owned();
    if decoded.starts_with("http://") || decoded.starts_with("https://") {
        return decoded;
    }
    Url::parse(page_url)
        .and_then(|base| base.join(&decoded))
        .map(|u| u.to_string())
        .unwrap_or(decoded)
}
