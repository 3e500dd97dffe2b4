use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static DIMENSION_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+x\d+\.").unwrap());
static TRAILING_DIMENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+x\d+(\.[a-z]+)$").unwrap());
static THUMBNAIL_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/thumbnail/([^/]+/[^/]+/[^/]+)/([^_]+)_\d+x\d+(\.[a-z]+)$").unwrap()
});
static DIMENSION_PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\d+x\d+/").unwrap());

const FULL_SIZE_SEGMENT: &str = "/media/1024x1366/";

type Rewrite = fn(&str) -> String;

// Applied in order; each returns its input unchanged when it does not apply.
const STEPS: &[(&str, Rewrite)] = &[
    ("strip_dimension_suffix", strip_dimension_suffix),
    ("thumbnail_to_media", thumbnail_to_media),
    ("dimension_path", dimension_path),
];

/// Rewrite a thumbnail-looking image URL toward its full-size variant.
pub fn upgrade(url: &str) -> String {
    if !url.contains("thumbnail") && !DIMENSION_SUFFIX_RE.is_match(url) {
        return url.to_string();
    }

    STEPS.iter().fold(url.to_string(), |current, (name, step)| {
        let next = step(&current);
        if next != current {
            debug!(step = *name, from = %current, to = %next, "Upgraded image URL");
        }
        next
    })
}

/// `.../product_280x280.jpg` -> `.../product.jpg`
fn strip_dimension_suffix(url: &str) -> String {
    TRAILING_DIMENSION_RE.replace(url, "${1}").into_owned()
}

/// `/thumbnail/a/b/c/name_280x280.jpg` -> `/media/1024x1366/a/b/c/name.jpg`,
/// or a plain segment swap when the URL has a different shape.
fn thumbnail_to_media(url: &str) -> String {
    if !url.contains("/thumbnail/") {
        return url.to_string();
    }

    let rewritten = THUMBNAIL_PATH_RE.replace(url, "/media/1024x1366/${1}/${2}${3}");
    if rewritten != url {
        return rewritten.into_owned();
    }

    let swapped = url.replace("/thumbnail/", FULL_SIZE_SEGMENT);
    TRAILING_DIMENSION_RE.replace(&swapped, "${1}").into_owned()
}

/// `/280x280/` path segments -> `/1024x1366/`
fn dimension_path(url: &str) -> String {
    if !DIMENSION_PATH_RE.is_match(url) {
        return url.to_string();
    }
    DIMENSION_PATH_RE.replace_all(url, "/1024x1366/").into_owned()
}
