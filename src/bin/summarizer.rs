use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sqlkb::bulk::write_bulk;
use sqlkb::records::read_annotations_lenient;
use sqlkb::store::index_documents;
use sqlkb::summarizer::{summary_bulk_items, DEFAULT_SUMMARY_INDEX};
use sqlkb::{Catalog, ChatArgs, EmbeddingArgs, StoreArgs, TableDescriptor, TableSummarizer};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sqlkb-summarizer",
    about = "Summarize catalog tables from the annotated query corpus"
)]
struct SummarizeCli {
    /// Schema catalog JSON
    #[arg(long, env = "SQLKB_CATALOG", default_value = "metadata/schema.json")]
    catalog: PathBuf,

    /// Annotated records produced by sqlkb-annotate
    #[arg(long, env = "SQLKB_ANNOTATIONS", default_value = "annotations.jsonl")]
    annotations: PathBuf,

    /// Output bulk NDJSON of table summaries
    #[arg(long, env = "SQLKB_SUMMARIES_BULK", default_value = "schema_descriptions.ndjson")]
    output: PathBuf,

    /// Destination index name
    #[arg(long, env = "SQLKB_SUMMARY_INDEX", default_value = DEFAULT_SUMMARY_INDEX)]
    index: String,

    /// Only summarize these tables (repeatable; default is the whole catalog)
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<String>,

    #[command(flatten)]
    chat: ChatArgs,

    #[command(flatten)]
    embedding: EmbeddingArgs,

    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> Result<()> {
    sqlkb::init_tracing();
    let cli = SummarizeCli::parse();
    let catalog = Catalog::load(&cli.catalog)?;
    let file = File::open(&cli.annotations)
        .with_context(|| format!("failed to open {:?}", cli.annotations))?;
    let records = read_annotations_lenient(BufReader::new(file))?;
    let tables: Vec<&TableDescriptor> = if cli.tables.is_empty() {
        catalog.tables().iter().collect()
    } else {
        catalog.select(cli.tables.as_slice())?
    };
    info!(
        tables = tables.len(),
        records = records.len(),
        "summarizing catalog tables"
    );

    let provider = cli.chat.build_provider()?;
    let embedder = cli.embedding.build_embedder()?;
    let summarizer = TableSummarizer::new(
        provider.as_ref(),
        &embedder,
        cli.chat.settings(),
        &cli.chat.output_language,
    )?;
    let summaries = summarizer.summarize_tables(&tables, &records)?;
    let items = summary_bulk_items(&cli.index, summaries);

    let output =
        File::create(&cli.output).with_context(|| format!("failed to create {:?}", cli.output))?;
    let mut writer = BufWriter::new(output);
    let written = write_bulk(&mut writer, &items)?;
    writer.flush()?;
    info!("wrote {} table summaries to {:?}", written, cli.output);

    if let Some(store) = cli.store.build_store()? {
        let report = index_documents(&store, &items)?;
        if !report.is_success() {
            eprintln!(
                "{} of {} summaries were rejected; see log above.",
                report.failures.len(),
                report.submitted
            );
        }
    }
    Ok(())
}
