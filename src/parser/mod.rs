pub mod extract;
pub mod text;
pub mod upgrade;

use chrono::Local;

use crate::record::{generate_sku, ProductRecord, UNKNOWN_PRODUCT};
use extract::image::absolutize;
use text::clean_text;

/// Five field sub-pipelines, then record assembly. Pure apart from the
/// timestamp; one call per page.
pub fn extract(html: &str, source_url: &str) -> ProductRecord {
    let fields = extract::extract_all(html);

    let name = clean_text(&fields.title);
    ProductRecord {
        sku: generate_sku(&fields.title, source_url),
        product_name: if name.is_empty() {
            UNKNOWN_PRODUCT.to_string()
        } else {
            name
        },
        product_description: fields.description,
        image_url: absolutize(&fields.image, source_url),
        variant_price: fields.price,
        variant_compare_at_price: fields.compare_at_price,
        product_url: source_url.to_string(),
        ratings: String::new(),
        scraped_at: Local::now(),
    }
}
