#![warn(missing_docs)]
//! Core library entry points for the sqlkb knowledge-base builder.
//!
//! The pipeline turns a schema catalog plus a corpus of raw SQL statements into bulk-indexable
//! documents: annotated example queries (paraphrase + SQL + vector) and per-table summaries.

pub mod annotate;
pub mod bulk;
pub mod catalog;
pub mod config;
pub mod embed;
pub mod embedder;
pub mod extractor;
pub mod llm;
pub mod paraphraser;
pub mod prompts;
pub mod records;
pub mod resolver;
pub mod statements;
pub mod store;
pub mod summarizer;

pub use annotate::{AnnotationPipeline, AnnotationStats};
pub use bulk::{BulkAction, BulkItem, BulkTarget};
pub use catalog::{Catalog, ColumnDescriptor, TableDescriptor};
pub use config::{ChatArgs, EmbeddingArgs, StoreArgs};
pub use embed::embed_all;
pub use embedder::Embedder;
pub use extractor::{ExtractionError, ReferenceExtractor, ReferenceSet};
pub use llm::{GenerationSettings, LlmProvider, PromptChain, PromptTemplate, ProviderRequest};
pub use paraphraser::QueryParaphraser;
pub use records::{AnnotatedRecord, EmbeddedDocument, TableSummaryRecord};
pub use resolver::{resolve, GroundingContext};
pub use statements::split_statements;
pub use store::{BulkFailure, BulkReport, DocumentStore, OpenSearchStore};
pub use summarizer::{select_queries, TableSummarizer};

/// Installs the stderr `tracing` subscriber used by every binary.
///
/// Honors `RUST_LOG` and falls back to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
