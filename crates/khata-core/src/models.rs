//! Domain models for Khata

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Supported banks for statement import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bank {
    Hdfc,
    Icici,
    Sbi,
}

impl Bank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdfc => "HDFC",
            Self::Icici => "ICICI",
            Self::Sbi => "SBI",
        }
    }
}

impl std::str::FromStr for Bank {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HDFC" => Ok(Self::Hdfc),
            "ICICI" => Ok(Self::Icici),
            "SBI" => Ok(Self::Sbi),
            _ => Err(format!("Unknown bank: {}", s)),
        }
    }
}

impl std::fmt::Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Debit,
    Credit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment mode inferred from the transaction description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Upi,
    Card,
    Atm,
    /// Covers both NEFT and RTGS transfers
    Neft,
    Imps,
    Cash,
    #[default]
    Other,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Card => "CARD",
            Self::Atm => "ATM",
            Self::Neft => "NEFT",
            Self::Imps => "IMPS",
            Self::Cash => "CASH",
            Self::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UPI" => Ok(Self::Upi),
            "CARD" => Ok(Self::Card),
            "ATM" => Ok(Self::Atm),
            "NEFT" => Ok(Self::Neft),
            "IMPS" => Ok(Self::Imps),
            "CASH" => Ok(Self::Cash),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which stage produced a transaction's category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorizedBy {
    Rule,
    Ai,
    Manual,
}

impl CategorizedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Ai => "ai",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for CategorizedBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" => Ok(Self::Rule),
            "ai" => Ok(Self::Ai),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Unknown categorization source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorizedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statement processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementStatus {
    Parsing,
    Completed,
    Failed,
}

impl StatementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for StatementStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parsing" => Ok(Self::Parsing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown statement status: {}", s)),
        }
    }
}

impl std::fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw transaction row pulled out of statement text, before normalization
#[derive(Debug, Clone)]
pub struct RawLine {
    pub date_text: String,
    pub description_text: String,
    pub withdrawal_text: Option<String>,
    pub deposit_text: Option<String>,
    pub balance_text: Option<String>,
}

/// The date range a statement claims to cover (best-effort extraction)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// A transaction in canonical form
///
/// `amount` is always an unsigned magnitude; direction lives solely in
/// `txn_type`. A transaction with an unparseable date keeps `date: None`
/// and is retained, not dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub date: Option<NaiveDate>,
    /// Whitespace-collapsed merchant name, at most 100 characters
    pub merchant: String,
    pub raw_description: String,
    /// Unsigned magnitude
    pub amount: f64,
    pub txn_type: TxnType,
    pub mode: PaymentMode,
    pub balance_after: Option<f64>,
}

/// Output of parsing one statement's text
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub bank: Bank,
    pub transactions: Vec<NormalizedTransaction>,
    pub period: StatementPeriod,
}

/// A statement upload record
///
/// Failed statements are kept (status=failed, error_message populated) so the
/// user can see what was uploaded and why it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub user_id: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    /// SHA-256 of the statement text, for duplicate upload detection
    pub file_hash: String,
    pub bank: Option<Bank>,
    pub period: StatementPeriod,
    pub status: StatementStatus,
    pub transactions_count: i64,
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A categorized transaction as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub user_id: Option<String>,
    pub statement_id: i64,
    pub bank: Bank,
    pub date: Option<NaiveDate>,
    pub merchant: String,
    pub raw_description: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub mode: PaymentMode,
    pub balance_after: Option<f64>,
    pub category: Option<String>,
    pub category_confidence: Option<f64>,
    pub categorized_by: Option<CategorizedBy>,
    /// Set when the user manually overrides the category
    pub category_overridden_at: Option<DateTime<Utc>>,
    /// Hash for row-level deduplication
    pub import_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be stored (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Option<String>,
    pub statement_id: i64,
    pub bank: Bank,
    pub date: Option<NaiveDate>,
    pub merchant: String,
    pub raw_description: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub mode: PaymentMode,
    pub balance_after: Option<f64>,
    pub category: Option<String>,
    pub category_confidence: Option<f64>,
    pub categorized_by: Option<CategorizedBy>,
    pub import_hash: String,
}

/// A learned merchant → category association
///
/// Scoped to a user or shared system-wide (user_id None). User-scoped
/// mappings take priority over system-wide ones during lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub id: i64,
    /// Lowercase, trimmed
    pub merchant: String,
    /// Uppercase
    pub category: String,
    pub confidence: f64,
    pub times_matched: i64,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A spending category with its keyword set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Unique uppercase identifier
    pub name: String,
    /// Lowercase keywords used by the rule engine
    pub keywords: Vec<String>,
    pub is_system: bool,
    pub user_id: Option<String>,
}

/// Outcome of categorizing one transaction
///
/// The all-None triple is the valid "uncategorized" terminal state, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub categorized_by: Option<CategorizedBy>,
}

impl CategorizationResult {
    pub fn uncategorized() -> Self {
        Self {
            category: None,
            confidence: None,
            categorized_by: None,
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_round_trip() {
        for bank in [Bank::Hdfc, Bank::Icici, Bank::Sbi] {
            assert_eq!(bank.as_str().parse::<Bank>().unwrap(), bank);
        }
        assert!("KOTAK".parse::<Bank>().is_err());
    }

    #[test]
    fn test_payment_mode_round_trip() {
        assert_eq!("upi".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert_eq!("NEFT".parse::<PaymentMode>().unwrap(), PaymentMode::Neft);
        assert_eq!(PaymentMode::Other.as_str(), "OTHER");
    }

    #[test]
    fn test_uncategorized_triple() {
        let result = CategorizationResult::uncategorized();
        assert!(result.is_uncategorized());
        assert!(result.confidence.is_none());
        assert!(result.categorized_by.is_none());
    }
}
