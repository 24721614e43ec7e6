//! Transaction normalization: dates, amounts, merchant names, payment modes
//!
//! Converts raw parsed fields into the canonical transaction shape. Amounts
//! are normalized to unsigned magnitudes; direction is carried separately as
//! the transaction type.

use chrono::NaiveDate;

use crate::models::{NormalizedTransaction, PaymentMode, RawLine, TxnType};

/// Maximum stored length of a merchant name
const MERCHANT_MAX_LEN: usize = 100;

/// Keywords that mark a credit when no withdrawal/deposit column decides
const CREDIT_KEYWORDS: [&str; 5] = ["credit", "deposit", "salary", "refund", "reversal"];

/// Keywords that mark a debit when no withdrawal/deposit column decides
const DEBIT_KEYWORDS: [&str; 4] = ["debit", "withdrawal", "payment", "purchase"];

/// Parse a date string in the formats Indian bank statements use
///
/// Tried in order: DD/MM/YYYY, DD/MM/YY, DD-MM-YYYY, DD MMM YYYY,
/// DD-MMM-YYYY, then ISO as a fallback. Returns None for anything
/// unparseable; callers retain such transactions with a null date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // DD MMM YYYY / DD-MMM-YYYY with an explicit month lookup so the match
    // is case-insensitive regardless of locale
    let parts: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() == 3 {
        if let (Ok(day), Some(month), Ok(year)) = (
            parts[0].parse::<u32>(),
            month_number(parts[1]),
            parts[2].parse::<i32>(),
        ) {
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Three-letter month name to month number
fn month_number(s: &str) -> Option<u32> {
    match s.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Parse an amount string to an unsigned magnitude
///
/// Strips currency symbols, thousands separators, whitespace, and enclosing
/// parentheses. Parenthesized amounts still parse as positive magnitudes;
/// direction must come from the withdrawal/deposit column, not parenthesis
/// convention. Unparseable input yields 0.0, never an error.
pub fn parse_amount(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',' | '(' | ')') && !c.is_whitespace())
        .collect();

    cleaned.parse::<f64>().map(f64::abs).unwrap_or(0.0)
}

/// Normalize a merchant name: trim, collapse whitespace runs, truncate
///
/// Empty input becomes the literal placeholder "Unknown". Idempotent.
pub fn normalize_merchant(merchant: &str) -> String {
    let collapsed = merchant.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "Unknown".to_string();
    }
    collapsed.chars().take(MERCHANT_MAX_LEN).collect()
}

/// Infer transaction direction
///
/// Explicit withdrawal/deposit columns win; then credit keywords are checked
/// before debit keywords; the arithmetic sign of the amount is the last
/// resort (negative = debit).
pub fn detect_txn_type(
    withdrawal: Option<&str>,
    deposit: Option<&str>,
    description: &str,
    amount: f64,
) -> TxnType {
    if withdrawal.map(parse_amount).unwrap_or(0.0) > 0.0 {
        return TxnType::Debit;
    }
    if deposit.map(parse_amount).unwrap_or(0.0) > 0.0 {
        return TxnType::Credit;
    }

    let desc = description.to_lowercase();
    if CREDIT_KEYWORDS.iter().any(|kw| desc.contains(kw)) {
        return TxnType::Credit;
    }
    if DEBIT_KEYWORDS.iter().any(|kw| desc.contains(kw)) {
        return TxnType::Debit;
    }

    if amount < 0.0 {
        TxnType::Debit
    } else {
        TxnType::Credit
    }
}

/// Infer the payment mode from description markers, in priority order
pub fn detect_payment_mode(description: &str) -> PaymentMode {
    let desc = description.to_lowercase();

    if ["upi", "paytm", "phonepe", "gpay"]
        .iter()
        .any(|kw| desc.contains(kw))
    {
        return PaymentMode::Upi;
    }
    if desc.contains("atm") {
        return PaymentMode::Atm;
    }
    if desc.contains("card") || desc.contains("pos") {
        return PaymentMode::Card;
    }
    if desc.contains("neft") || desc.contains("rtgs") {
        // RTGS collapses into the NEFT mode value
        return PaymentMode::Neft;
    }
    if desc.contains("imps") {
        return PaymentMode::Imps;
    }
    if desc.contains("cash") {
        return PaymentMode::Cash;
    }

    PaymentMode::Other
}

/// Normalize a raw parsed line into the canonical transaction shape
pub fn normalize_line(raw: &RawLine) -> NormalizedTransaction {
    let withdrawal = raw.withdrawal_text.as_deref().map(parse_amount).unwrap_or(0.0);
    let deposit = raw.deposit_text.as_deref().map(parse_amount).unwrap_or(0.0);

    let (amount, txn_type) = if withdrawal > 0.0 {
        (withdrawal, TxnType::Debit)
    } else if deposit > 0.0 {
        (deposit, TxnType::Credit)
    } else {
        (
            0.0,
            detect_txn_type(
                raw.withdrawal_text.as_deref(),
                raw.deposit_text.as_deref(),
                &raw.description_text,
                0.0,
            ),
        )
    };

    NormalizedTransaction {
        date: parse_date(&raw.date_text),
        merchant: normalize_merchant(&raw.description_text),
        raw_description: raw.description_text.clone(),
        amount,
        txn_type,
        mode: detect_payment_mode(&raw.description_text),
        balance_after: raw.balance_text.as_deref().map(parse_amount),
    }
}
