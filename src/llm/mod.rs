//! Chat-model providers and the prompt plumbing shared by every model-backed stage.

use anyhow::{anyhow, Result};

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Trait implemented by concrete LLM providers.
pub trait LlmProvider {
    /// Sends one system + user exchange and returns the model's text reply.
    fn answer(&self, request: &ProviderRequest) -> Result<String>;
}

/// Request envelope shared by the various providers.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    /// Fixed system instruction.
    pub system: &'a str,
    /// Rendered user prompt.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: usize,
}

/// Sampling knobs applied to every call a chain makes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Text template with `{name}` placeholders. `{{` and `}}` emit literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wraps a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes every placeholder from `vars`.
    ///
    /// A placeholder with no matching variable is an error. Braces that do not enclose a
    /// plain identifier are copied through untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find(|ch: char| ch == '{' || ch == '}') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('}') {
                out.push('}');
                rest = &tail[1..];
                continue;
            }
            let body = &tail[1..];
            match body.find('}') {
                Some(end) if is_placeholder(&body[..end]) => {
                    let name = &body[..end];
                    let value = vars
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| anyhow!("prompt variable `{}` was not supplied", name))?;
                    out.push_str(value);
                    rest = &body[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = body;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// A fixed system instruction plus a user template bound to one provider.
pub struct PromptChain<'a> {
    provider: &'a dyn LlmProvider,
    system: String,
    template: PromptTemplate,
    settings: GenerationSettings,
}

impl<'a> PromptChain<'a> {
    /// Binds a system instruction and user template to `provider`.
    pub fn new(
        provider: &'a dyn LlmProvider,
        system: impl Into<String>,
        template: PromptTemplate,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            provider,
            system: system.into(),
            template,
            settings,
        }
    }

    /// Renders the user template with `vars` and returns the model's raw reply.
    pub fn invoke(&self, vars: &[(&str, &str)]) -> Result<String> {
        let prompt = self.template.render(vars)?;
        self.provider.answer(&ProviderRequest {
            system: &self.system,
            prompt: &prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        })
    }
}
