//! Document store contract and an OpenSearch/Elasticsearch `_bulk` client.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::bulk::{count_pairs, to_ndjson, BulkItem};

/// Destination for bulk action/document pairs.
pub trait DocumentStore {
    /// Submits an NDJSON bulk body and returns the store's per-item report.
    fn bulk(&self, body: &str) -> Result<BulkResponse>;
}

/// Bulk API response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    /// Whether any item failed.
    #[serde(default)]
    pub errors: bool,
    /// One entry per submitted pair, keyed by operation (`index`, `create`, ...).
    #[serde(default)]
    pub items: Vec<BTreeMap<String, BulkItemStatus>>,
}

/// Outcome of one bulk item.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemStatus {
    /// Index the item targeted.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document identifier.
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// HTTP-style status code.
    pub status: u16,
    /// Failure detail, present when `status >= 400`.
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Failure detail attached to a bulk item.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemError {
    /// Error type reported by the store.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// One failed bulk item, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// Position of the pair in the submitted body.
    pub position: usize,
    /// Operation name.
    pub operation: String,
    /// Target index.
    pub index: String,
    /// Document identifier, when the store echoed one.
    pub id: Option<String>,
    /// Status code.
    pub status: u16,
    /// Failure reason.
    pub reason: String,
}

impl BulkResponse {
    /// Every item whose status is 400 or above.
    pub fn failures(&self) -> Vec<BulkFailure> {
        let mut failures = Vec::new();
        for (position, item) in self.items.iter().enumerate() {
            for (operation, status) in item {
                if status.status < 400 {
                    continue;
                }
                let reason = status
                    .error
                    .as_ref()
                    .map(|err| match &err.reason {
                        Some(reason) => format!("{}: {}", err.kind, reason),
                        None => err.kind.clone(),
                    })
                    .unwrap_or_else(|| "no reason given".to_string());
                failures.push(BulkFailure {
                    position,
                    operation: operation.clone(),
                    index: status.index.clone(),
                    id: status.id.clone(),
                    status: status.status,
                    reason,
                });
            }
        }
        failures
    }
}

/// Summary of one bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Pairs submitted.
    pub submitted: usize,
    /// Items the store rejected.
    pub failures: Vec<BulkFailure>,
}

impl BulkReport {
    /// Whether every item was accepted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Submits a raw NDJSON body and logs every rejected item.
///
/// Rejections are reported, not retried, and do not stop the remaining items.
pub fn submit(store: &dyn DocumentStore, body: &str) -> Result<BulkReport> {
    let submitted = count_pairs(body)?;
    if submitted == 0 {
        info!("bulk body is empty; nothing to index");
        return Ok(BulkReport::default());
    }
    let response = store.bulk(body)?;
    let failures = if response.errors {
        response.failures()
    } else {
        Vec::new()
    };
    if failures.is_empty() {
        info!("bulk-inserted all {} items successfully", submitted);
    } else {
        error!(
            failed = failures.len(),
            submitted, "there were errors during bulk indexing"
        );
        for failure in &failures {
            error!(
                position = failure.position,
                index = %failure.index,
                id = failure.id.as_deref().unwrap_or("-"),
                status = failure.status,
                "bulk item failed: {}",
                failure.reason
            );
        }
    }
    Ok(BulkReport {
        submitted,
        failures,
    })
}

/// Encodes `items` and submits them with [`submit`].
pub fn index_documents<T: Serialize>(
    store: &dyn DocumentStore,
    items: &[BulkItem<T>],
) -> Result<BulkReport> {
    let body = to_ndjson(items)?;
    submit(store, &body)
}

/// Blocking client for the `_bulk` endpoint of an OpenSearch or Elasticsearch cluster.
pub struct OpenSearchStore {
    client: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl OpenSearchStore {
    /// Builds a client for the cluster at `base_url`, with optional basic auth.
    pub fn new(
        base_url: &str,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "document store URL must be an http(s) URL"
        );
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build document store HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/_bulk", base_url.trim_end_matches('/')),
            credentials,
        })
    }
}

impl DocumentStore for OpenSearchStore {
    fn bulk(&self, body: &str) -> Result<BulkResponse> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"))
            .body(body.to_string());
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }
        let resp = request
            .send()
            .with_context(|| format!("failed to call {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("bulk request failed ({}): {}", status, text);
        }
        resp.json().context("failed to parse bulk response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const MIXED: &str = r#"{
        "took": 3,
        "errors": true,
        "items": [
            {"index": {"_index": "example_queries", "_id": "0", "status": 201}},
            {"index": {"_index": "example_queries", "_id": "1", "status": 400,
                       "error": {"type": "mapper_parsing_exception",
                                 "reason": "failed to parse field [input_v]"}}},
            {"index": {"_index": "example_queries", "_id": "2", "status": 200}}
        ]
    }"#;

    #[test]
    fn extracts_failed_items_only() {
        let response: BulkResponse = serde_json::from_str(MIXED).unwrap();
        let failures = response.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].position, 1);
        assert_eq!(failures[0].id.as_deref(), Some("1"));
        assert_eq!(
            failures[0].reason,
            "mapper_parsing_exception: failed to parse field [input_v]"
        );
    }

    struct Canned(&'static str, RefCell<Vec<String>>);

    impl DocumentStore for Canned {
        fn bulk(&self, body: &str) -> Result<BulkResponse> {
            self.1.borrow_mut().push(body.to_string());
            Ok(serde_json::from_str(self.0)?)
        }
    }

    #[test]
    fn submit_reports_without_aborting() {
        let store = Canned(MIXED, RefCell::new(Vec::new()));
        let body = "{\"index\":{\"_index\":\"example_queries\",\"_id\":\"0\"}}\n{}\n".repeat(3);
        let report = submit(&store, &body).unwrap();
        assert_eq!(report.submitted, 3);
        assert!(!report.is_success());
        assert_eq!(store.1.borrow().len(), 1);
    }

    #[test]
    fn empty_body_skips_the_store() {
        let store = Canned(MIXED, RefCell::new(Vec::new()));
        assert!(submit(&store, "").unwrap().is_success());
        assert!(store.1.borrow().is_empty());
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(OpenSearchStore::new("localhost:9200", None, Duration::from_secs(1)).is_err());
    }
}
