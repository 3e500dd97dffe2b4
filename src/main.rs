mod config;
mod export;
mod parser;
mod record;
mod scraper;
mod server;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::record::ProductRecord;
use crate::scraper::HttpFetcher;

#[derive(Parser)]
#[command(name = "product_scraper", about = "Heuristic product page scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape product URLs and export the results
    Scrape {
        /// Product URLs
        urls: Vec<String>,
        /// File with one URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (default: timestamped CSV in EXPORT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },
    /// Run the extractor on a saved HTML page
    Extract {
        #[arg(long)]
        html: PathBuf,
        /// URL the page was fetched from
        #[arg(long)]
        url: String,
    },
    /// Start the web interface
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            urls,
            input,
            output,
            json,
        } => {
            let mut text = urls.join("\n");
            if let Some(path) = input {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                text.push('\n');
                text.push_str(&contents);
            }

            let batch = scraper::partition_urls(&text);
            for url in &batch.rejected {
                println!("Skipping unsupported URL: {}", url);
            }
            if batch.accepted.is_empty() {
                bail!("No URLs to scrape");
            }

            let config = Config::from_env()?;
            let fetcher = HttpFetcher::from_config(&config)?;
            println!("Scraping {} URLs...", batch.accepted.len());
            let pb = ProgressBar::new(batch.accepted.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
                    .progress_chars("#>-"),
            );
            let records = scraper::scrape_batch(&fetcher, &batch.accepted, &pb).await;
            pb.finish_and_clear();

            print_summary(&records);

            let path = match (output, json) {
                (Some(path), true) => {
                    export::write_json(create(&path)?, &records)?;
                    path
                }
                (Some(path), false) => {
                    export::write_csv(create(&path)?, &records)?;
                    path
                }
                (None, true) => {
                    let path = config.export_dir.join(
                        export::export_file_name().replace(".csv", ".json"),
                    );
                    fs::create_dir_all(&config.export_dir)?;
                    export::write_json(create(&path)?, &records)?;
                    path
                }
                (None, false) => export::save_export(&config.export_dir, &records)?,
            };
            println!("Saved {} products to {}", records.len(), path.display());
            Ok(())
        }
        Commands::Extract { html, url } => {
            println!("{}", extract_saved_page(&html, &url)?);
            Ok(())
        }
        Commands::Serve { port } => {
            let mut config = Config::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(config).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Offline extraction; needs no environment configuration.
fn extract_saved_page(html: &Path, url: &str) -> anyhow::Result<String> {
    let page = fs::read_to_string(html)
        .with_context(|| format!("Failed to read {}", html.display()))?;
    let record = parser::extract(&page, url);
    Ok(serde_json::to_string_pretty(&record)?)
}

fn create(path: &Path) -> anyhow::Result<fs::File> {
    fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn print_summary(records: &[ProductRecord]) {
    println!(
        "{:>3} | {:<9} | {:<32} | {:>9} | {:>9} | {:<5}",
        "#", "SKU", "Product", "Price", "Was", "Image"
    );
    println!("{}", "-".repeat(84));

    for (i, r) in records.iter().enumerate() {
        let image = if r.image_url.is_empty() { "-" } else { "yes" };
        println!(
            "{:>3} | {:<9} | {:<32} | {:>9} | {:>9} | {:<5}",
            i + 1,
            r.sku,
            truncate(&r.product_name, 29),
            or_dash(&r.variant_price),
            or_dash(&r.variant_compare_at_price),
            image
        );
    }

    let errors = records.iter().filter(|r| r.is_error()).count();
    println!(
        "\n{} products | {} ok | {} errors",
        records.len(),
        records.len() - errors,
        errors
    );
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
