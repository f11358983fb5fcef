#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use sqlkb::store::BulkResponse;
use sqlkb::{DocumentStore, Embedder, LlmProvider, ProviderRequest};

/// Which prompt a scripted call answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Paraphrase,
    Summary,
}

/// One call seen by [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct Call {
    pub stage: Stage,
    pub system: String,
    pub prompt: String,
}

impl Call {
    /// Statement the prompt carries, for extraction and paraphrase calls.
    pub fn sql(&self) -> &str {
        self.prompt
            .rsplit_once("SQL: ")
            .map(|(_, sql)| sql.trim_end())
            .unwrap_or("")
    }

    /// Text between two tags in the prompt.
    pub fn section(&self, open: &str, close: &str) -> &str {
        let start = self.prompt.find(open).map(|i| i + open.len()).unwrap_or(0);
        let end = self.prompt[start..]
            .find(close)
            .map(|i| start + i)
            .unwrap_or(self.prompt.len());
        self.prompt[start..end].trim()
    }
}

/// Chat model double that answers by stage.
///
/// Extraction replies come from `extractions` keyed by statement; statements without an
/// entry get `{"table": [], "column": []}`. Statements listed in `failing` make the call
/// itself fail.
#[derive(Default)]
pub struct ScriptedModel {
    pub extractions: HashMap<String, String>,
    pub failing: Vec<String>,
    pub calls: RefCell<Vec<Call>>,
}

impl ScriptedModel {
    pub fn with_extraction(mut self, sql: &str, reply: &str) -> Self {
        self.extractions.insert(sql.to_string(), reply.to_string());
        self
    }

    pub fn calls_for(&self, stage: Stage) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.stage == stage)
            .cloned()
            .collect()
    }
}

impl LlmProvider for ScriptedModel {
    fn answer(&self, request: &ProviderRequest) -> Result<String> {
        let stage = if request.system.contains("extracting table names") {
            Stage::Extraction
        } else if request.system.contains("summarize SQL tables") {
            Stage::Summary
        } else {
            Stage::Paraphrase
        };
        let call = Call {
            stage: stage.clone(),
            system: request.system.to_string(),
            prompt: request.prompt.to_string(),
        };
        let sql = call.sql().to_string();
        self.calls.borrow_mut().push(call);
        if stage != Stage::Summary && self.failing.contains(&sql) {
            return Err(anyhow!("model unavailable"));
        }
        Ok(match stage {
            Stage::Extraction => self
                .extractions
                .get(&sql)
                .cloned()
                .unwrap_or_else(|| r#"{"table": [], "column": []}"#.to_string()),
            Stage::Paraphrase => format!("Request for: {sql}\n"),
            Stage::Summary => "Table holding rows that can answer counting questions.".to_string(),
        })
    }
}

/// Embedder double: vector is `[len, call_no]`, so reruns differ slightly.
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: Cell<usize>,
}

impl Embedder for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![text.chars().count() as f32, self.calls.get() as f32])
    }
}

/// Store double that records bodies and rejects the listed ids.
#[derive(Default)]
pub struct RecordingStore {
    pub reject: Vec<String>,
    pub bodies: RefCell<Vec<String>>,
}

impl DocumentStore for RecordingStore {
    fn bulk(&self, body: &str) -> Result<BulkResponse> {
        self.bodies.borrow_mut().push(body.to_string());
        let mut items = Vec::new();
        let mut errors = false;
        for line in body.lines().step_by(2) {
            let action: serde_json::Value = serde_json::from_str(line)?;
            let target = &action["index"];
            let id = target["_id"].as_str().unwrap_or_default().to_string();
            let item = if self.reject.contains(&id) {
                errors = true;
                serde_json::json!({"index": {
                    "_index": target["_index"], "_id": id, "status": 400,
                    "error": {"type": "mapper_parsing_exception", "reason": "bad vector"}
                }})
            } else {
                serde_json::json!({"index": {
                    "_index": target["_index"], "_id": id, "status": 201
                }})
            };
            items.push(item);
        }
        Ok(serde_json::from_value(serde_json::json!({
            "errors": errors,
            "items": items,
        }))?)
    }
}
