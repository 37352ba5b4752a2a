// Generation port
//
// Content and code production is delegated to an external provider.
// Adapters live in the infrastructure layer.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CoreResult;

/// Successful provider response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub content: String,
    pub tokens_used: u64,
    pub cost: Decimal,
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produces content for a prompt
    ///
    /// `context` is a serialized slice of the project context. Failures are
    /// reported as `CoreError::GenerationFailure`.
    async fn generate(&self, prompt: &str, context: &str) -> CoreResult<GenerationOutput>;
}
