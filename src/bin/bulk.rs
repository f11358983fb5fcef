use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sqlkb::bulk::count_pairs;
use sqlkb::store::submit;
use sqlkb::StoreArgs;

#[derive(Parser, Debug)]
#[command(
    name = "sqlkb-bulk",
    about = "Push a bulk NDJSON file to the document store and report rejected items"
)]
struct BulkCli {
    /// Bulk NDJSON written by sqlkb-embedder or sqlkb-summarizer
    input: PathBuf,

    /// Validate the file and report the pair count without sending it
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> Result<()> {
    sqlkb::init_tracing();
    let cli = BulkCli::parse();
    let body = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {:?}", cli.input))?;
    let pairs = count_pairs(&body).with_context(|| format!("invalid bulk file {:?}", cli.input))?;
    println!("{} action/document pairs in {:?}", pairs, cli.input);
    if cli.dry_run {
        return Ok(());
    }

    let store = cli
        .store
        .build_store()?
        .context("--store-url (or SQLKB_STORE_URL) is required")?;
    let report = submit(&store, &body)?;
    if report.is_success() {
        println!("Bulk-inserted all {} items successfully.", report.submitted);
        return Ok(());
    }
    for failure in &report.failures {
        println!(
            "Error: [{}] {}/{}: {}",
            failure.status,
            failure.index,
            failure.id.as_deref().unwrap_or("-"),
            failure.reason
        );
    }
    anyhow::bail!(
        "{} of {} items failed to index",
        report.failures.len(),
        report.submitted
    )
}
