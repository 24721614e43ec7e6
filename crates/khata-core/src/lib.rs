//! Khata Core Library
//!
//! Shared functionality for the Khata bank statement analyzer:
//! - Database access and migrations
//! - Bank statement text parsers (HDFC, ICICI, SBI)
//! - Transaction normalization (dates, amounts, merchants, payment modes)
//! - Merchant mapping store with per-user and system-wide scopes
//! - Rule-based categorizer with keyword scoring
//! - Pluggable AI backends (Ollama, mock) as a categorization fallback
//! - Categorization orchestrator with learning writeback
//! - Statement processing pipeline with duplicate detection

pub mod ai;
pub mod categorize;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod seed;
pub mod statement;

/// Test utilities including the mock AI server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, AiCategorization, MockBackend, OllamaBackend, TxnContext};
pub use categorize::{BackfillResult, Categorizer, AI_LEARN_THRESHOLD, CONFIDENCE_THRESHOLD};
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    Bank, CategorizationResult, CategorizedBy, Category, MerchantMapping, NewTransaction,
    NormalizedTransaction, ParsedStatement, PaymentMode, RawLine, Statement, StatementPeriod,
    StatementStatus, StoredTransaction, TxnType,
};
pub use statement::{ProcessedStatement, StatementProcessor};
