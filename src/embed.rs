//! Embedding stage: annotated records to bulk-indexable example-query documents.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::bulk::{BulkAction, BulkItem};
use crate::embedder::Embedder;
use crate::records::{AnnotatedRecord, EmbeddedDocument};

/// Default index for example-query documents.
pub const DEFAULT_EXAMPLE_INDEX: &str = "example_queries";

/// Embeds each record's paraphrase, in order, and pairs it with an `index` action.
///
/// The identifier of the nth document is `n`, so re-running over the same records yields the
/// same identifiers. Every vector must have the length of the first one.
pub fn embed_all(
    embedder: &dyn Embedder,
    index: &str,
    records: &[AnnotatedRecord],
) -> Result<Vec<BulkItem<EmbeddedDocument>>> {
    let mut items = Vec::with_capacity(records.len());
    let mut dimensions = None;
    for (position, record) in records.iter().enumerate() {
        let input_v = embedder
            .embed(&record.input)
            .with_context(|| format!("failed to embed record {}", position))?;
        let expected = *dimensions.get_or_insert(input_v.len());
        anyhow::ensure!(
            input_v.len() == expected,
            "record {} embedded to {} dimensions, expected {}",
            position,
            input_v.len(),
            expected
        );
        debug!(position, dims = expected, "embedded example query");
        items.push(BulkItem {
            action: BulkAction::index(index, position.to_string()),
            document: EmbeddedDocument {
                input: record.input.clone(),
                query: record.query.clone(),
                input_v,
            },
        });
        if (position + 1) % 50 == 0 {
            info!("embedded {} of {} records...", position + 1, records.len());
        }
    }
    info!(count = items.len(), index, "embedding complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct LengthEmbedder {
        calls: Cell<usize>,
    }

    impl Embedder for LengthEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![text.len() as f32, self.calls.get() as f32])
        }
    }

    fn records(n: usize) -> Vec<AnnotatedRecord> {
        (0..n)
            .map(|i| AnnotatedRecord {
                input: format!("paraphrase {i}"),
                query: format!("SELECT {i}"),
            })
            .collect()
    }

    #[test]
    fn identifiers_are_positions_and_stable_across_runs() {
        let embedder = LengthEmbedder { calls: Cell::new(0) };
        let input = records(4);

        let first = embed_all(&embedder, "example_queries", &input).unwrap();
        let second = embed_all(&embedder, "example_queries", &input).unwrap();

        let ids = |items: &[BulkItem<EmbeddedDocument>]| {
            items.iter().map(|i| i.action.id().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ["0", "1", "2", "3"]);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first[2].document.query, "SELECT 2");
        assert_eq!(first[2].action.index.index, "example_queries");
        // vectors differ between runs; documents otherwise match
        assert_ne!(first[0].document.input_v, second[0].document.input_v);
        assert_eq!(first[0].document.input, second[0].document.input);
    }

    #[test]
    fn empty_input_yields_no_documents() {
        let embedder = LengthEmbedder { calls: Cell::new(0) };
        assert!(embed_all(&embedder, "x", &[]).unwrap().is_empty());
        assert_eq!(embedder.calls.get(), 0);
    }

    struct Ragged;

    impl Embedder for Ragged {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; text.len()])
        }
    }

    #[test]
    fn inconsistent_dimensions_are_rejected() {
        let input = vec![
            AnnotatedRecord {
                input: "ab".into(),
                query: "q".into(),
            },
            AnnotatedRecord {
                input: "abc".into(),
                query: "q".into(),
            },
        ];
        let err = embed_all(&Ragged, "x", &input).expect_err("ragged");
        assert!(err.to_string().contains("expected 2"));
    }
}
