use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlkb::records::write_jsonl_line;
use sqlkb::statements::load_statements;
use sqlkb::{AnnotationPipeline, Catalog, ChatArgs, QueryParaphraser, ReferenceExtractor};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "sqlkb-annotate",
    about = "Paraphrase a SQL corpus into (question, query) records grounded in a schema catalog"
)]
struct AnnotateCli {
    /// Schema catalog JSON
    #[arg(long, env = "SQLKB_CATALOG", default_value = "metadata/schema.json")]
    catalog: PathBuf,

    /// SQL corpus, statements separated by `;`
    #[arg(long, env = "SQLKB_SQL", default_value = "metadata/queries.sql")]
    sql: PathBuf,

    /// Output JSONL of annotated records
    #[arg(long, env = "SQLKB_ANNOTATIONS", default_value = "annotations.jsonl")]
    output: PathBuf,

    /// Milliseconds to pause after an unparseable extraction reply
    #[arg(long, env = "SQLKB_EXTRACTION_PAUSE_MS", default_value_t = 1000)]
    extraction_pause_ms: u64,

    /// Only load the inputs and report counts (no model calls)
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(flatten)]
    chat: ChatArgs,
}

fn main() -> Result<()> {
    sqlkb::init_tracing();
    let cli = AnnotateCli::parse();
    let catalog = Catalog::load(&cli.catalog)?;
    let queries = load_statements(&cli.sql)?;
    println!(
        "catalog: {} tables, {} columns; corpus: {} statements",
        catalog.len(),
        catalog.column_count(),
        queries.len()
    );
    if cli.dry_run {
        println!("dry-run enabled; skipping model calls.");
        return Ok(());
    }
    if queries.is_empty() {
        warn!("no statements found in {:?}; nothing to annotate", cli.sql);
    }

    let provider = cli.chat.build_provider()?;
    let settings = cli.chat.settings();
    let pipeline = AnnotationPipeline::new(
        &catalog,
        ReferenceExtractor::new(provider.as_ref(), settings),
        QueryParaphraser::new(provider.as_ref(), settings, &cli.chat.output_language)?,
    )
    .with_failure_pause(Duration::from_millis(cli.extraction_pause_ms));

    let output = File::create(&cli.output)
        .with_context(|| format!("failed to create {:?}", cli.output))?;
    let mut writer = BufWriter::new(output);
    let stats = pipeline.annotate_with(&queries, |record| {
        write_jsonl_line(&mut writer, &record)?;
        writer.flush()?;
        Ok(())
    })?;
    writer.flush()?;

    info!(
        records = stats.records,
        extraction_failures = stats.extraction_failures,
        ungrounded = stats.ungrounded,
        "annotation complete; wrote {:?}",
        cli.output
    );
    Ok(())
}
