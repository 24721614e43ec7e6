//! Mock backend for testing
//!
//! Returns predictable classifications for well-known Indian merchants
//! without a running LLM server.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{AiCategorization, TxnContext};
use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend; every classification fails
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }

    fn classify(&self, merchant: &str) -> AiCategorization {
        let m = merchant.to_uppercase();

        let (category, confidence) = if m.contains("SWIGGY") || m.contains("ZOMATO") {
            ("FOOD", 0.92)
        } else if m.contains("BIGBASKET") || m.contains("BLINKIT") || m.contains("DUNZO") {
            ("GROCERIES", 0.92)
        } else if m.contains("UBER") || m.contains("OLA") || m.contains("RAPIDO") {
            ("TRANSPORT", 0.9)
        } else if m.contains("AMAZON") || m.contains("FLIPKART") || m.contains("MYNTRA") {
            ("SHOPPING", 0.88)
        } else if m.contains("NETFLIX") || m.contains("HOTSTAR") || m.contains("SPOTIFY") {
            ("ENTERTAINMENT", 0.95)
        } else if m.contains("AIRTEL") || m.contains("JIO") || m.contains("VODAFONE") {
            ("UTILITIES", 0.9)
        } else if m.contains("APOLLO") || m.contains("PHARMACY") || m.contains("1MG") {
            ("HEALTHCARE", 0.9)
        } else if m.contains("IRCTC") || m.contains("MAKEMYTRIP") || m.contains("INDIGO") {
            ("TRAVEL", 0.9)
        } else if m.contains("ZERODHA") || m.contains("GROWW") {
            ("INVESTMENT", 0.92)
        } else {
            // Low confidence keeps unknown merchants below the learn threshold
            ("OTHER", 0.4)
        };

        AiCategorization {
            category: category.to_string(),
            confidence,
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_transaction(
        &self,
        txn: &TxnContext,
        _categories: &[String],
    ) -> Result<AiCategorization> {
        if !self.healthy {
            return Err(Error::InvalidData("mock backend is unhealthy".into()));
        }
        Ok(self.classify(&txn.merchant))
    }

    async fn classify_batch(
        &self,
        txns: &[TxnContext],
        _categories: &[String],
    ) -> Vec<Option<AiCategorization>> {
        txns.iter()
            .map(|txn| {
                if self.healthy {
                    Some(self.classify(&txn.merchant))
                } else {
                    None
                }
            })
            .collect()
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(merchant: &str) -> TxnContext {
        TxnContext {
            merchant: merchant.to_string(),
            description: merchant.to_string(),
            amount: 100.0,
            txn_type: "debit".to_string(),
            mode: "UPI".to_string(),
        }
    }

    #[tokio::test]
    async fn test_known_merchant() {
        let mock = MockBackend::new();
        let result = mock
            .classify_transaction(&ctx("SWIGGY ORDER 123"), &[])
            .await
            .unwrap();
        assert_eq!(result.category, "FOOD");
        assert!(result.confidence >= 0.9);
    }

    #[tokio::test]
    async fn test_unknown_merchant_low_confidence() {
        let mock = MockBackend::new();
        let result = mock
            .classify_transaction(&ctx("XYZABC 999"), &[])
            .await
            .unwrap();
        assert_eq!(result.category, "OTHER");
        assert!(result.confidence < 0.8);
    }

    #[tokio::test]
    async fn test_unhealthy_fails() {
        let mock = MockBackend::unhealthy();
        assert!(mock.classify_transaction(&ctx("SWIGGY"), &[]).await.is_err());
        assert!(!mock.health_check().await);

        let batch = mock.classify_batch(&[ctx("SWIGGY")], &[]).await;
        assert_eq!(batch, vec![None]);
    }
}
