//! Command-line and environment configuration shared by the binaries.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};

use crate::embedder::openai::OpenAiEmbedder;
use crate::llm::{AnthropicProvider, GenerationSettings, LlmProvider, OpenAiProvider};
use crate::prompts::DEFAULT_OUTPUT_LANGUAGE;
use crate::store::OpenSearchStore;

/// Chat model backends.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions.
    Openai,
    /// Anthropic messages API.
    Anthropic,
}

/// Chat model selection and sampling knobs.
#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Chat model backend
    #[arg(long, env = "SQLKB_LLM_PROVIDER", value_enum, default_value = "openai")]
    pub llm_provider: ProviderKind,

    /// Chat model identifier (defaults per provider)
    #[arg(long, env = "SQLKB_CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// OpenAI API key for chat calls
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL for the OpenAI-compatible chat API
    #[arg(long, env = "SQLKB_OPENAI_BASE", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Anthropic API key (required when --llm-provider anthropic)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "SQLKB_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Maximum completion tokens per call
    #[arg(long, env = "SQLKB_MAX_TOKENS", default_value_t = 4096)]
    pub max_tokens: usize,

    /// Language paraphrases and summaries are written in
    #[arg(long, env = "SQLKB_OUTPUT_LANGUAGE", default_value = DEFAULT_OUTPUT_LANGUAGE)]
    pub output_language: String,

    /// Seconds to wait for each chat call
    #[arg(long, env = "SQLKB_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,
}

impl ChatArgs {
    /// Sampling settings for every chain.
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens.max(1),
        }
    }

    /// Model identifier, falling back to the provider default.
    pub fn model(&self) -> String {
        self.chat_model.clone().unwrap_or_else(|| match self.llm_provider {
            ProviderKind::Openai => "gpt-4o-mini".to_string(),
            ProviderKind::Anthropic => "claude-3-sonnet-20240229".to_string(),
        })
    }

    /// Builds the configured chat provider.
    pub fn build_provider(&self) -> Result<Box<dyn LlmProvider>> {
        let timeout = Duration::from_secs(self.llm_timeout_secs.max(1));
        let provider: Box<dyn LlmProvider> = match self.llm_provider {
            ProviderKind::Openai => {
                let key = self
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set for the OpenAI provider"))?;
                Box::new(OpenAiProvider::new(
                    key,
                    self.openai_base_url.clone(),
                    self.model(),
                    timeout,
                )?)
            }
            ProviderKind::Anthropic => {
                let key = self.anthropic_api_key.clone().ok_or_else(|| {
                    anyhow!("ANTHROPIC_API_KEY must be set for the Anthropic provider")
                })?;
                Box::new(AnthropicProvider::new(key, self.model(), timeout)?)
            }
        };
        Ok(provider)
    }
}

/// Embedding model selection.
#[derive(Args, Debug, Clone)]
pub struct EmbeddingArgs {
    /// API key for the embedding endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Base URL for the OpenAI-compatible embeddings API
    #[arg(long, env = "SQLKB_EMBEDDING_BASE", default_value = "https://api.openai.com/v1")]
    pub embedding_base_url: String,

    /// Embedding model identifier
    #[arg(long, env = "SQLKB_EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    /// Vector length requested from the model (0 keeps the model default)
    #[arg(long, env = "SQLKB_EMBEDDING_DIMENSIONS", default_value_t = 1024)]
    pub embedding_dimensions: usize,

    /// Seconds to wait for each embedding request
    #[arg(long, env = "SQLKB_EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
    pub embedding_timeout_secs: u64,

    /// Attempts for rate limits or transient errors
    #[arg(long, env = "SQLKB_EMBEDDING_MAX_RETRIES", default_value_t = 5)]
    pub embedding_max_retries: usize,
}

impl EmbeddingArgs {
    /// Builds the configured embedding client.
    pub fn build_embedder(&self) -> Result<OpenAiEmbedder> {
        let key = self
            .embedding_api_key
            .clone()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY or --embedding-api-key must be set"))?;
        OpenAiEmbedder::new(
            key,
            self.embedding_base_url.clone(),
            self.embedding_model.clone(),
            (self.embedding_dimensions > 0).then_some(self.embedding_dimensions),
            Duration::from_secs(self.embedding_timeout_secs.max(1)),
            self.embedding_max_retries.max(1),
        )
    }
}

/// Document store connection.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Cluster base URL (https://host:port); indexing is skipped when unset
    #[arg(long, env = "SQLKB_STORE_URL")]
    pub store_url: Option<String>,

    /// Basic-auth user
    #[arg(long, env = "SQLKB_STORE_USER")]
    pub store_user: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "SQLKB_STORE_PASSWORD", hide_env_values = true)]
    pub store_password: Option<String>,

    /// Seconds to wait for a bulk request
    #[arg(long, env = "SQLKB_STORE_TIMEOUT_SECS", default_value_t = 300)]
    pub store_timeout_secs: u64,
}

impl StoreArgs {
    /// Builds the store client, or `None` when no URL is configured.
    pub fn build_store(&self) -> Result<Option<OpenSearchStore>> {
        let Some(url) = &self.store_url else {
            return Ok(None);
        };
        let credentials = match (&self.store_user, &self.store_password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            (None, None) => None,
            _ => anyhow::bail!("--store-user and --store-password must be set together"),
        };
        OpenSearchStore::new(
            url,
            credentials,
            Duration::from_secs(self.store_timeout_secs.max(1)),
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        chat: ChatArgs,
        #[command(flatten)]
        embedding: EmbeddingArgs,
        #[command(flatten)]
        store: StoreArgs,
    }

    #[test]
    fn defaults_follow_the_provider() {
        let cli = Harness::parse_from(["test", "--llm-provider", "anthropic"]);
        assert_eq!(cli.chat.model(), "claude-3-sonnet-20240229");
        assert_eq!(cli.chat.settings().temperature, 0.0);
        assert_eq!(cli.embedding.embedding_dimensions, 1024);
    }

    #[test]
    fn explicit_model_wins() {
        let cli = Harness::parse_from(["test", "--chat-model", "custom", "--max-tokens", "0"]);
        assert_eq!(cli.chat.model(), "custom");
        assert_eq!(cli.chat.settings().max_tokens, 1);
    }

    #[test]
    fn store_is_optional_and_credentials_come_in_pairs() {
        let cli = Harness::parse_from(["test"]);
        assert!(cli.store.build_store().unwrap().is_none());

        let cli = Harness::parse_from([
            "test",
            "--store-url",
            "https://search.local",
            "--store-user",
            "admin",
        ]);
        assert!(cli.store.build_store().is_err());
    }
}
