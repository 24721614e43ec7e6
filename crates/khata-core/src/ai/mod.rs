//! Pluggable AI backend abstraction
//!
//! The categorization fallback is backend-agnostic: anything that can take a
//! transaction plus the category vocabulary and return a (category,
//! confidence) pair. The AI capability is strictly best-effort; callers
//! treat every failure as "no result" and fall through to the uncategorized
//! terminal state.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for classification operations
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `AI_TIMEOUT_SECS`: Request timeout in seconds (default: 30)

mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use types::{AiCategorization, TxnContext};

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Classify a single transaction against the category vocabulary
    async fn classify_transaction(
        &self,
        txn: &TxnContext,
        categories: &[String],
    ) -> Result<AiCategorization>;

    /// Classify a batch of transactions; one slot per input, None on failure
    async fn classify_batch(
        &self,
        txns: &[TxnContext],
        categories: &[String],
    ) -> Vec<Option<AiCategorization>>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify_transaction(
        &self,
        txn: &TxnContext,
        categories: &[String],
    ) -> Result<AiCategorization> {
        match self {
            AIClient::Ollama(b) => b.classify_transaction(txn, categories).await,
            AIClient::Mock(b) => b.classify_transaction(txn, categories).await,
        }
    }

    async fn classify_batch(
        &self,
        txns: &[TxnContext],
        categories: &[String],
    ) -> Vec<Option<AiCategorization>> {
        match self {
            AIClient::Ollama(b) => b.classify_batch(txns, categories).await,
            AIClient::Mock(b) => b.classify_batch(txns, categories).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_classify() {
        let client = AIClient::mock();
        let txn = TxnContext {
            merchant: "ZOMATO ONLINE".to_string(),
            description: "UPI-ZOMATO".to_string(),
            amount: 320.0,
            txn_type: "debit".to_string(),
            mode: "UPI".to_string(),
        };
        let result = client
            .classify_transaction(&txn, &["FOOD".to_string()])
            .await
            .unwrap();
        assert_eq!(result.category, "FOOD");
    }
}
