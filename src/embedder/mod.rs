//! Embedding model clients.

use anyhow::Result;

pub mod openai;

/// Turns text into a fixed-length vector.
pub trait Embedder {
    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
