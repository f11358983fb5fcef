//! Bulk action/document pairs and their NDJSON encoding.

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::records::write_jsonl_line;

/// Destination half of an `index` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTarget {
    /// Destination index name.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document identifier within the index.
    #[serde(rename = "_id")]
    pub id: String,
}

/// Action line of a bulk pair, serialized as `{"index": {"_index": .., "_id": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAction {
    /// Index-or-replace target.
    pub index: BulkTarget,
}

impl BulkAction {
    /// Index (create or overwrite) `id` in `index`.
    pub fn index(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: BulkTarget {
                index: index.into(),
                id: id.into(),
            },
        }
    }

    /// Document identifier carried by the action.
    pub fn id(&self) -> &str {
        &self.index.id
    }
}

/// One action line plus its document line.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem<T> {
    /// Destination and identifier.
    pub action: BulkAction,
    /// Document payload.
    pub document: T,
}

/// Writes every pair as two NDJSON lines and returns the number of pairs.
pub fn write_bulk<W: Write, T: Serialize>(writer: &mut W, items: &[BulkItem<T>]) -> Result<usize> {
    for item in items {
        write_jsonl_line(writer, &item.action)?;
        write_jsonl_line(writer, &item.document)?;
    }
    Ok(items.len())
}

/// Encodes `items` as an NDJSON bulk body.
pub fn to_ndjson<T: Serialize>(items: &[BulkItem<T>]) -> Result<String> {
    let mut buf = Vec::new();
    write_bulk(&mut buf, items)?;
    String::from_utf8(buf).context("bulk body is not valid UTF-8")
}

/// Checks that `body` alternates action and document lines and returns the pair count.
pub fn count_pairs(body: &str) -> Result<usize> {
    let lines: Vec<&str> = body.lines().filter(|line| !line.trim().is_empty()).collect();
    anyhow::ensure!(
        lines.len() % 2 == 0,
        "bulk body has {} non-empty lines; expected action/document pairs",
        lines.len()
    );
    for (pair, chunk) in lines.chunks(2).enumerate() {
        let action: serde_json::Value = serde_json::from_str(chunk[0])
            .with_context(|| format!("bulk pair {} has an invalid action line", pair))?;
        anyhow::ensure!(
            action.as_object().is_some_and(|obj| obj.len() == 1),
            "bulk pair {} action must be a single-key object",
            pair
        );
        let _: serde_json::Value = serde_json::from_str(chunk[1])
            .with_context(|| format!("bulk pair {} has an invalid document line", pair))?;
    }
    Ok(lines.len() / 2)
}
