//! AI backend request/response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

use crate::models::NormalizedTransaction;

/// Transaction fields sent to the AI backend for classification
#[derive(Debug, Clone)]
pub struct TxnContext {
    pub merchant: String,
    pub description: String,
    /// Unsigned magnitude
    pub amount: f64,
    pub txn_type: String,
    pub mode: String,
}

impl From<&NormalizedTransaction> for TxnContext {
    fn from(txn: &NormalizedTransaction) -> Self {
        Self {
            merchant: txn.merchant.clone(),
            description: txn.raw_description.clone(),
            amount: txn.amount,
            txn_type: txn.txn_type.to_string(),
            mode: txn.mode.to_string(),
        }
    }
}

/// A category decision from the AI backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCategorization {
    /// Category name from the supplied vocabulary
    pub category: String,
    /// Capped at 0.95 during parsing; the model is never fully certain
    pub confidence: f64,
}
