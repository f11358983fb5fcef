use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sqlkb::bulk::write_bulk;
use sqlkb::embed::DEFAULT_EXAMPLE_INDEX;
use sqlkb::records::load_annotations;
use sqlkb::store::index_documents;
use sqlkb::{embed_all, EmbeddingArgs, StoreArgs};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sqlkb-embedder",
    about = "Embed annotated records into bulk-indexable example-query documents"
)]
struct EmbedCli {
    /// Annotated records produced by sqlkb-annotate
    #[arg(long, env = "SQLKB_ANNOTATIONS", default_value = "annotations.jsonl")]
    input: PathBuf,

    /// Output bulk NDJSON (action line, then document line)
    #[arg(long, env = "SQLKB_EXAMPLES_BULK", default_value = "example_queries.ndjson")]
    output: PathBuf,

    /// Destination index name
    #[arg(long, env = "SQLKB_EXAMPLE_INDEX", default_value = DEFAULT_EXAMPLE_INDEX)]
    index: String,

    #[command(flatten)]
    embedding: EmbeddingArgs,

    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> Result<()> {
    sqlkb::init_tracing();
    let cli = EmbedCli::parse();
    let records = load_annotations(&cli.input)?;
    let embedder = cli.embedding.build_embedder()?;
    info!(
        records = records.len(),
        index = %cli.index,
        dimensions = ?embedder.dimensions(),
        "embedding annotated records"
    );

    let items = embed_all(&embedder, &cli.index, &records)?;
    let output =
        File::create(&cli.output).with_context(|| format!("failed to create {:?}", cli.output))?;
    let mut writer = BufWriter::new(output);
    let written = write_bulk(&mut writer, &items)?;
    writer.flush()?;
    info!("wrote {} documents to {:?}", written, cli.output);

    if let Some(store) = cli.store.build_store()? {
        let report = index_documents(&store, &items)?;
        if !report.is_success() {
            eprintln!(
                "{} of {} documents were rejected; see log above.",
                report.failures.len(),
                report.submitted
            );
        }
    }
    Ok(())
}
