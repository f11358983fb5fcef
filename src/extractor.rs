//! Model-backed extraction of the tables and columns a SQL statement references.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::llm::{GenerationSettings, LlmProvider, PromptChain, PromptTemplate};
use crate::prompts::{EXTRACTION_SYSTEM, EXTRACTION_USER};

/// Table and column names a model claims a statement uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSet {
    /// Referenced table names, as the model spelled them.
    #[serde(default)]
    pub table: Vec<String>,
    /// Referenced column names, as the model spelled them.
    #[serde(default)]
    pub column: Vec<String>,
}

impl ReferenceSet {
    /// Builds a set from string slices.
    pub fn new<T, C>(tables: T, columns: C) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            table: tables.into_iter().map(Into::into).collect(),
            column: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether neither tables nor columns were extracted.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.column.is_empty()
    }

    /// Lowercased table names.
    pub fn tables_lower(&self) -> HashSet<String> {
        self.table.iter().map(|name| name.to_lowercase()).collect()
    }

    /// Lowercased column names.
    pub fn columns_lower(&self) -> HashSet<String> {
        self.column.iter().map(|name| name.to_lowercase()).collect()
    }
}

/// Failure modes of [`ReferenceExtractor::extract`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The model answered, but not with a parseable reference document.
    #[error("model returned malformed reference data: {source}")]
    Malformed {
        /// Raw model output, kept for manual inspection.
        raw: String,
        /// Parser error for the full output.
        #[source]
        source: serde_json::Error,
    },
    /// The model call itself failed.
    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

/// Asks a chat model which tables and columns a statement touches.
pub struct ReferenceExtractor<'a> {
    chain: PromptChain<'a>,
}

impl<'a> ReferenceExtractor<'a> {
    /// Builds an extractor over `provider`.
    pub fn new(provider: &'a dyn LlmProvider, settings: GenerationSettings) -> Self {
        Self {
            chain: PromptChain::new(
                provider,
                EXTRACTION_SYSTEM,
                PromptTemplate::new(EXTRACTION_USER),
                settings,
            ),
        }
    }

    /// Extracts the reference set for `sql`.
    ///
    /// Names are not checked against any catalog.
    pub fn extract(&self, sql: &str) -> Result<ReferenceSet, ExtractionError> {
        let raw = self.chain.invoke(&[("sql", sql)])?;
        parse_reference_set(&raw)
    }
}

/// Parses model output into a [`ReferenceSet`].
///
/// The whole reply is tried first, then the outermost `{...}` span, which covers replies
/// wrapped in a code fence or a sentence of preamble.
pub fn parse_reference_set(raw: &str) -> Result<ReferenceSet, ExtractionError> {
    let trimmed = raw.trim();
    let err = match serde_json::from_str::<ReferenceSet>(trimmed) {
        Ok(set) => return Ok(set),
        Err(err) => err,
    };
    if let Some(candidate) = outermost_object(trimmed) {
        if candidate.len() < trimmed.len() {
            if let Ok(set) = serde_json::from_str::<ReferenceSet>(candidate) {
                return Ok(set);
            }
        }
    }
    Err(ExtractionError::Malformed {
        raw: raw.to_string(),
        source: err,
    })
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
