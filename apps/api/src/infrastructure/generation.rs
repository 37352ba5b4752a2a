// Offline generation provider
// Used when no external model provider is configured

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::agents::generation::{GenerationOutput, GenerationProvider};
use crate::errors::CoreResult;

/// Dry-run provider that echoes the rendered prompt back as content
///
/// Token usage is approximated by the word count of prompt and context;
/// nothing is billed.
#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerationProvider for OfflineGenerator {
    async fn generate(&self, prompt: &str, context: &str) -> CoreResult<GenerationOutput> {
        let tokens_used = (prompt.split_whitespace().count() + context.split_whitespace().count()) as u64;
        debug!(tokens_used, "Offline generation");

        Ok(GenerationOutput {
            content: prompt.to_string(),
            tokens_used,
            cost: Decimal::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_prompt_and_counts_words() {
        let output = OfflineGenerator::new()
            .generate("design the schema", "postgres only")
            .await
            .unwrap();

        assert_eq!(output.content, "design the schema");
        assert_eq!(output.tokens_used, 5);
        assert_eq!(output.cost, Decimal::ZERO);
    }
}
