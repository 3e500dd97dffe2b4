use chrono::{DateTime, Local};
use serde::Serialize;
use md5::{Digest, Md5};

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const ERROR_SKU: &str = "ERROR";
const ERROR_MESSAGE_CHARS: usize = 50;

/// Column headers of the tabular export, in order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Sku",
    "Product Name",
    "Product Description",
    "Image Url",
    "Variant Price",
    "Variant Compareat Price",
    "Product Url",
    "Ratings",
];

/// One scraped product page. Empty strings mean "not found".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub sku: String,
    pub product_name: String,
    /// HTML fragment, markup preserved.
    pub product_description: String,
    pub image_url: String,
    pub variant_price: String,
    pub variant_compare_at_price: String,
    pub product_url: String,
    pub ratings: String,
    pub scraped_at: DateTime<Local>,
}

impl ProductRecord {
    /// Placeholder for a URL that could not be fetched or extracted.
    pub fn error(url: &str, label: &str, message: &str) -> Self {
        let message: String = message.chars().take(ERROR_MESSAGE_CHARS).collect();
        ProductRecord {
            sku: ERROR_SKU.to_string(),
            product_name: format!("{}: {}", label, message),
            product_description: String::new(),
            image_url: String::new(),
            variant_price: String::new(),
            variant_compare_at_price: String::new(),
            product_url: url.to_string(),
            ratings: String::new(),
            scraped_at: Local::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.sku == ERROR_SKU
    }

    /// Cells in `EXPORT_HEADERS` order.
    pub fn export_row(&self) -> [&str; 8] {
        [
            self.sku.as_str(),
            self.product_name.as_str(),
            self.product_description.as_str(),
            self.image_url.as_str(),
            self.variant_price.as_str(),
            self.variant_compare_at_price.as_str(),
            self.product_url.as_str(),
            self.ratings.as_str(),
        ]
    }
}

/// Display SKU: five letters from the title plus a number in 1000..=9999
/// derived from the URL. Deterministic; collisions are acceptable.
pub fn generate_sku(title: &str, url: &str) -> String {
    let mut prefix: String = title
        .chars()
        .filter(char::is_ascii_alphabetic)
        .take(5)
        .collect::<String>()
        .to_ascii_uppercase();
    while prefix.len() < 5 {
        prefix.push('X');
    }

    format!("{}{}", prefix, url_bucket(url) + 1000)
}

/// MD5 of the URL read as a big-endian integer, modulo 9000.
fn url_bucket(url: &str) -> u32 {
    Md5::digest(url.as_bytes())
        .iter()
        .fold(0u32, |acc, &b| (acc * 256 + u32::from(b)) % 9000)
}
