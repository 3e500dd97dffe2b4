use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B-\x0C\x0E-\x1F\x7F-\x9F]").unwrap());
static NUMERIC_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));?").unwrap());

/// Windows-1252 meanings of 0x80..=0x9F as browsers read numeric references.
/// Unassigned slots keep their C1 code point and are stripped as controls.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

/// Normalize scraped text for a spreadsheet cell: decode entities, drop
/// control characters, fold typographic quotes and dashes to ASCII, discard
/// everything else outside ASCII, trim.
///
/// Repeated until stable, so `clean_text(clean_text(s)) == clean_text(s)`.
pub fn clean_text(raw: &str) -> String {
    let mut current = clean_once(raw);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let numeric = decode_numeric_refs(raw);
    let decoded = decode_html_entities(&numeric);
    let stripped = CONTROL_RE.replace_all(&decoded, "");

    stripped
        .chars()
        .filter_map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' => Some('"'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => Some('\''),
            '\u{2013}' | '\u{2014}' => Some('-'),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Resolve `&#N;` and `&#xN;` the way HTML5 does: 0x80..=0x9F through
/// Windows-1252, NUL and non-scalar values dropped.
fn decode_numeric_refs(raw: &str) -> std::borrow::Cow<'_, str> {
    NUMERIC_REF_RE.replace_all(raw, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        match code {
            Some(0) | None => String::new(),
            Some(c @ 0x80..=0x9F) => WINDOWS_1252[(c - 0x80) as usize].to_string(),
            Some(c) => char::from_u32(c).map(String::from).unwrap_or_default(),
        }
    })
}
