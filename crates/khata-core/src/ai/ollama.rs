//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. Prompts embed the transaction
//! fields and the full category vocabulary; responses are free text with an
//! embedded JSON payload. Every call carries a bounded timeout and failures
//! surface as errors here; the orchestrator degrades them to "uncategorized"
//! rather than letting them abort a batch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::parsing::{parse_batch_categorization, parse_categorization};
use super::types::{AiCategorization, TxnContext};
use super::AIBackend;

/// Transactions per batch request, to respect model payload limits
const BATCH_SIZE: usize = 10;

/// Default request timeout in seconds (override with AI_TIMEOUT_SECS)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl Clone for OllamaBackend {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
        }
    }
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        let timeout = std::env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);

        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

fn single_prompt(txn: &TxnContext, categories: &[String]) -> String {
    format!(
        r#"You are a financial transaction categorizer. Analyze this transaction and return ONLY a JSON object.

Transaction Details:
- Merchant: {merchant}
- Description: {description}
- Amount: ₹{amount}
- Type: {txn_type}
- Mode: {mode}

Available Categories: {categories}

Rules:
1. Choose the MOST appropriate category
2. Consider merchant name first, then description
3. Return confidence between 0.0 and 1.0
4. Be conservative with confidence (0.7-0.9 typical)

Response format (MUST be valid JSON):
{{"category": "CATEGORY_NAME", "confidence": 0.85}}"#,
        merchant = txn.merchant,
        description = txn.description,
        amount = txn.amount,
        txn_type = txn.txn_type,
        mode = txn.mode,
        categories = categories.join(", "),
    )
}

fn batch_prompt(txns: &[TxnContext], categories: &[String]) -> String {
    let transaction_list = txns
        .iter()
        .enumerate()
        .map(|(i, txn)| {
            format!(
                "{}. Merchant: {}, Description: {}, Amount: ₹{}, Type: {}",
                i + 1,
                txn.merchant,
                txn.description,
                txn.amount,
                txn.txn_type,
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Categorize these {count} transactions. Return ONLY a JSON array.

Transactions:
{transaction_list}

Available Categories: {categories}

Response format (MUST be valid JSON array):
[
  {{"index": 1, "category": "FOOD", "confidence": 0.9}},
  {{"index": 2, "category": "TRANSPORT", "confidence": 0.85}}
]"#,
        count = txns.len(),
        categories = categories.join(", "),
    )
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn classify_transaction(
        &self,
        txn: &TxnContext,
        categories: &[String],
    ) -> Result<AiCategorization> {
        let response = self.generate(single_prompt(txn, categories)).await?;
        parse_categorization(&response)
    }

    async fn classify_batch(
        &self,
        txns: &[TxnContext],
        categories: &[String],
    ) -> Vec<Option<AiCategorization>> {
        let mut results = Vec::with_capacity(txns.len());

        for chunk in txns.chunks(BATCH_SIZE) {
            let chunk_results = match self.generate(batch_prompt(chunk, categories)).await {
                Ok(response) => match parse_batch_categorization(&response, chunk.len()) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!("Failed to parse AI batch response: {}", e);
                        vec![None; chunk.len()]
                    }
                },
                Err(e) => {
                    warn!("AI batch call failed: {}", e);
                    vec![None; chunk.len()]
                }
            };
            results.extend(chunk_results);
        }

        results
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txn() -> TxnContext {
        TxnContext {
            merchant: "SWIGGY ORDER".to_string(),
            description: "UPI-SWIGGY-987".to_string(),
            amount: 450.0,
            txn_type: "debit".to_string(),
            mode: "UPI".to_string(),
        }
    }

    #[test]
    fn test_single_prompt_embeds_fields_and_vocabulary() {
        let prompt = single_prompt(
            &sample_txn(),
            &["FOOD".to_string(), "TRANSPORT".to_string()],
        );
        assert!(prompt.contains("SWIGGY ORDER"));
        assert!(prompt.contains("UPI-SWIGGY-987"));
        assert!(prompt.contains("FOOD, TRANSPORT"));
        assert!(prompt.contains("debit"));
    }

    #[test]
    fn test_batch_prompt_numbers_transactions() {
        let txns = vec![sample_txn(), sample_txn()];
        let prompt = batch_prompt(&txns, &["FOOD".to_string()]);
        assert!(prompt.contains("1. Merchant: SWIGGY ORDER"));
        assert!(prompt.contains("2. Merchant: SWIGGY ORDER"));
        assert!(prompt.contains("these 2 transactions"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }
}
