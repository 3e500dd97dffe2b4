use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::record::{ProductRecord, EXPORT_HEADERS};

const EXPORT_PREFIX: &str = "products_";
const EXPORT_EXT: &str = ".csv";

/// Write the header row plus one row per record, in order.
pub fn write_csv<W: Write>(writer: W, records: &[ProductRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADERS)?;
    for record in records {
        wtr.write_record(record.export_row())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(writer: W, records: &[ProductRecord]) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// `products_<YYYYmmdd_HHMMSS>.csv`
pub fn export_file_name() -> String {
    format!(
        "{}{}{}",
        EXPORT_PREFIX,
        Local::now().format("%Y%m%d_%H%M%S"),
        EXPORT_EXT
    )
}

/// True only for names `export_file_name` can produce. Guards downloads.
pub fn is_export_file_name(name: &str) -> bool {
    let Some(stamp) = name
        .strip_prefix(EXPORT_PREFIX)
        .and_then(|rest| rest.strip_suffix(EXPORT_EXT))
    else {
        return false;
    };
    stamp.len() == 15
        && stamp
            .char_indices()
            .all(|(i, c)| if i == 8 { c == '_' } else { c.is_ascii_digit() })
}

/// Write a timestamped CSV export into `dir` and return its path.
pub fn save_export(dir: &Path, records: &[ProductRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
    let path = dir.join(export_file_name());
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, records)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn sample() -> Vec<ProductRecord> {
        vec![
            parser::extract(
                r#"<title>Rope, 10m</title><div class="description"><p>"Strong"</p></div>{"price": 12.5}"#,
                "https://shop.example/rope",
            ),
            ProductRecord::error("https://shop.example/gone", "Error", "HTTP 404"),
        ]
    }

    #[test]
    fn csv_header_and_row_order() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Sku,Product Name,Product Description,Image Url,Variant Price,Variant Compareat Price,Product Url,Ratings")
        );

        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Rope, 10m");
        assert_eq!(&rows[0][2], r#"<p>"Strong"</p>"#);
        assert_eq!(&rows[0][4], "12.5");
        assert_eq!(&rows[0][6], "https://shop.example/rope");
        assert_eq!(&rows[1][0], "ERROR");
        assert_eq!(&rows[1][6], "https://shop.example/gone");
    }

    #[test]
    fn json_includes_timestamp() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v.as_array().map(Vec::len), Some(2));
        assert!(v[0]["scraped_at"].is_string());
        assert_eq!(v[1]["sku"], "ERROR");
    }

    #[test]
    fn export_names_round_trip_through_guard() {
        assert!(is_export_file_name(&export_file_name()));
        assert!(is_export_file_name("products_20250101_093000.csv"));
        assert!(!is_export_file_name("../products_20250101_093000.csv"));
        assert!(!is_export_file_name("products_2025010_0930000.csv"));
        assert!(!is_export_file_name("products_20250101_093000.csv.bak"));
        assert!(!is_export_file_name("secrets.csv"));
    }
}
