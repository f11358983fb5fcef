//! Table summarizer: per-table model summaries built from the annotated query corpus.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::bulk::{BulkAction, BulkItem};
use crate::catalog::{Catalog, ColumnDescriptor, TableDescriptor};
use crate::embedder::Embedder;
use crate::llm::{GenerationSettings, LlmProvider, PromptChain, PromptTemplate};
use crate::prompts::{SUMMARY_SYSTEM, SUMMARY_USER};
use crate::records::{AnnotatedRecord, TableSummaryRecord};

/// Default index for table-summary documents.
pub const DEFAULT_SUMMARY_INDEX: &str = "schema_descriptions";

/// Records whose `query` contains `table_name`, ignoring case.
///
/// Plain substring containment: a table whose name is part of a longer name also matches
/// statements on the longer table, and aliased or differently qualified names are missed.
pub fn select_queries<'r>(
    table_name: &str,
    records: &'r [AnnotatedRecord],
) -> Vec<&'r AnnotatedRecord> {
    let needle = table_name.to_lowercase();
    records
        .iter()
        .filter(|record| record.query.to_lowercase().contains(&needle))
        .collect()
}

/// Writes a summary per table and embeds it.
pub struct TableSummarizer<'a> {
    chain: PromptChain<'a>,
    embedder: &'a dyn Embedder,
}

#[derive(Serialize)]
struct TableSchema<'t> {
    table_name: &'t str,
    table_desc: &'t str,
    cols: &'t [ColumnDescriptor],
}

impl<'a> TableSummarizer<'a> {
    /// Builds a summarizer writing in `output_language`.
    pub fn new(
        provider: &'a dyn LlmProvider,
        embedder: &'a dyn Embedder,
        settings: GenerationSettings,
        output_language: &str,
    ) -> Result<Self> {
        let system = PromptTemplate::new(SUMMARY_SYSTEM)
            .render(&[("output_language", output_language)])?;
        Ok(Self {
            chain: PromptChain::new(provider, system, PromptTemplate::new(SUMMARY_USER), settings),
            embedder,
        })
    }

    /// Summarizes one table from the records that mention it.
    pub fn summarize(
        &self,
        table: &TableDescriptor,
        records: &[AnnotatedRecord],
    ) -> Result<TableSummaryRecord> {
        let matched = select_queries(&table.table_name, records);
        debug!(table = %table.table_name, matched = matched.len(), "selected sample queries");
        let schema = serde_json::to_string(&TableSchema {
            table_name: &table.table_name,
            table_desc: &table.table_desc,
            cols: &table.cols,
        })
        .context("failed to serialize table schema")?;
        let mut samples = String::new();
        for record in &matched {
            samples.push_str(&serde_json::to_string(record)?);
            samples.push('\n');
        }
        let table_summary = self
            .chain
            .invoke(&[
                ("table_schema", &schema),
                ("sample_queries", samples.trim_end()),
            ])
            .with_context(|| format!("failed to summarize table {}", table.table_name))?
            .trim()
            .to_string();
        let table_summary_v = self
            .embedder
            .embed(&table_summary)
            .with_context(|| format!("failed to embed summary of {}", table.table_name))?;
        Ok(TableSummaryRecord {
            table_name: table.table_name.clone(),
            table_desc: table.table_desc.clone(),
            cols: table.cols.clone(),
            table_summary,
            table_summary_v,
        })
    }

    /// Summarizes every table in catalog order.
    pub fn summarize_all(
        &self,
        catalog: &Catalog,
        records: &[AnnotatedRecord],
    ) -> Result<Vec<TableSummaryRecord>> {
        let tables: Vec<&TableDescriptor> = catalog.tables().iter().collect();
        self.summarize_tables(&tables, records)
    }

    /// Summarizes `tables` in the order given.
    pub fn summarize_tables(
        &self,
        tables: &[&TableDescriptor],
        records: &[AnnotatedRecord],
    ) -> Result<Vec<TableSummaryRecord>> {
        let mut summaries = Vec::with_capacity(tables.len());
        for (position, table) in tables.iter().enumerate() {
            summaries.push(self.summarize(table, records)?);
            info!(
                "summarized {} of {} tables ({})...",
                position + 1,
                tables.len(),
                table.table_name
            );
        }
        Ok(summaries)
    }
}

/// Pairs each summary with an `index` action whose identifier is the table name.
pub fn summary_bulk_items(
    index: &str,
    summaries: Vec<TableSummaryRecord>,
) -> Vec<BulkItem<TableSummaryRecord>> {
    summaries
        .into_iter()
        .map(|summary| BulkItem {
            action: BulkAction::index(index, summary.table_name.clone()),
            document: summary,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str) -> AnnotatedRecord {
        AnnotatedRecord {
            input: format!("about {query}"),
            query: query.to_string(),
        }
    }

    #[test]
    fn matches_case_insensitive_substrings() {
        let records = vec![record("SELECT * FROM ORDERS"), record("select 1 from customers")];
        let orders = select_queries("orders", &records);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].query, "SELECT * FROM ORDERS");
        assert!(select_queries("CUSTOMERS", &records[..1]).is_empty());
    }

    #[test]
    fn substring_match_over_selects_longer_names() {
        let records = vec![record("SELECT * FROM order_items")];
        assert_eq!(select_queries("order", &records).len(), 1);
    }

    #[test]
    fn bulk_ids_are_table_names() {
        let summary = TableSummaryRecord {
            table_name: "ORDERS".into(),
            table_desc: "Order records".into(),
            cols: Vec::new(),
            table_summary: "s".into(),
            table_summary_v: vec![0.5],
        };
        let items = summary_bulk_items("schema_descriptions", vec![summary]);
        assert_eq!(items[0].action.id(), "ORDERS");
        assert_eq!(items[0].action.index.index, "schema_descriptions");
    }
}
