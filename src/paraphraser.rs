//! Model-backed natural-language paraphrase of a statement's intent.

use anyhow::{Context, Result};

use crate::llm::{GenerationSettings, LlmProvider, PromptChain, PromptTemplate};
use crate::prompts::{PARAPHRASE_SYSTEM, PARAPHRASE_USER};
use crate::resolver::GroundingContext;

/// Turns a statement plus its grounding context into a declarative request.
pub struct QueryParaphraser<'a> {
    chain: PromptChain<'a>,
}

impl<'a> QueryParaphraser<'a> {
    /// Builds a paraphraser that answers in `output_language`.
    pub fn new(
        provider: &'a dyn LlmProvider,
        settings: GenerationSettings,
        output_language: &str,
    ) -> Result<Self> {
        let system = PromptTemplate::new(PARAPHRASE_SYSTEM)
            .render(&[("output_language", output_language)])?;
        Ok(Self {
            chain: PromptChain::new(
                provider,
                system,
                PromptTemplate::new(PARAPHRASE_USER),
                settings,
            ),
        })
    }

    /// Paraphrases `sql`. The reply is used as-is apart from trimming.
    pub fn paraphrase(&self, sql: &str, grounding: &GroundingContext) -> Result<String> {
        let description =
            serde_json::to_string(grounding).context("failed to serialize grounding context")?;
        let reply = self
            .chain
            .invoke(&[("sql", sql), ("description", &description)])?;
        Ok(reply.trim().to_string())
    }
}
