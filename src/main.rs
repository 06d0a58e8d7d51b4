mod db;
mod export;
mod parser;
mod scraper;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use db::{ExportFilter, SortDir};

/// Scrape PGCB's historical generation report into SQLite and export a
/// Date,Time,Load CSV.
#[derive(Parser)]
#[command(name = "pgcb_scraper", about = "PGCB power generation report scraper")]
struct Cli {
    /// Re-fetch every page even if the local store already exists
    #[arg(long)]
    force_fetch: bool,
    /// Sort direction applied to year/month in the export
    #[arg(long, value_enum, default_value = "desc")]
    sort: SortDir,
    /// Output CSV path
    #[arg(short, long)]
    output: PathBuf,
    /// Lower year bound for the export filter (inclusive)
    #[arg(long, default_value_t = 2017)]
    min_year: i32,
    /// Lower month bound for the export filter (inclusive)
    #[arg(long, default_value_t = 1)]
    min_month: i32,
    /// Upper year bound for the export filter (inclusive)
    #[arg(long, default_value_t = 2020)]
    max_year: i32,
    /// Upper month bound for the export filter (inclusive)
    #[arg(long, default_value_t = 12)]
    max_month: i32,
    /// Highest page number available on the server
    #[arg(long, default_value_t = 960)]
    max_page: u32,
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

    if cli.force_fetch || !db::store_exists() {
        db::remove_store()?;
        let conn = db::connect()?;
        db::init_schema(&conn)?;
        println!("Fetching pages 1..={} (streaming to store)...", cli.max_page);
        let stats = scraper::fetch_all(&conn, cli.max_page).await?;
        println!(
            "Fetched {} pages: {} records stored, {} rows dropped (malformed date).",
            stats.pages, stats.records, stats.dropped
        );
    }

    let conn = db::connect()?;
    db::init_schema(&conn)?;
    println!("Generating csv");
    let opts = export::ExportOptions {
        filter: ExportFilter {
            min_year: cli.min_year,
            max_year: cli.max_year,
            min_month: cli.min_month,
            max_month: cli.max_month,
        },
        sort: cli.sort,
    };
    export::write_report(&conn, &opts, &cli.output)?;

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
