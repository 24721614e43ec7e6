//! Rule-based categorizer
//!
//! An ordered decision cascade that short-circuits on the first confident
//! hit: income shortcut, transfer shortcut, then weighted keyword scoring
//! against the category vocabulary. Returns None when nothing matches so the
//! caller can escalate to the AI fallback.

use tracing::debug;

use crate::models::{
    CategorizationResult, CategorizedBy, Category, NormalizedTransaction, PaymentMode, TxnType,
};

const INCOME_KEYWORDS: [&str; 5] = ["salary", "income", "refund", "cashback", "reward"];
const TRANSFER_KEYWORDS: [&str; 3] = ["transfer", "self", "wallet"];

/// Keyword hits in the merchant name count double
const MERCHANT_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

struct BestMatch<'a> {
    category: &'a str,
    matched_keywords: u32,
    score: u32,
}

fn rule_result(category: &str, confidence: f64) -> CategorizationResult {
    CategorizationResult {
        category: Some(category.to_string()),
        confidence: Some(confidence),
        categorized_by: Some(CategorizedBy::Rule),
    }
}

/// Categorize a transaction using keyword heuristics
///
/// `categories` must be in stable name order; ties between equally-scored
/// categories resolve to the first one scanned, so the ordering is what
/// makes the outcome deterministic.
pub fn categorize(
    txn: &NormalizedTransaction,
    categories: &[Category],
) -> Option<CategorizationResult> {
    let merchant = txn.merchant.to_lowercase();
    let description = txn.raw_description.to_lowercase();

    // Income shortcut wins over everything, regardless of keyword tables
    if txn.txn_type == TxnType::Credit
        && INCOME_KEYWORDS.iter().any(|kw| description.contains(kw))
    {
        return Some(rule_result("INCOME", 0.95));
    }

    // Transfer shortcut for bank-to-bank modes
    if matches!(txn.mode, PaymentMode::Neft | PaymentMode::Imps)
        && TRANSFER_KEYWORDS.iter().any(|kw| description.contains(kw))
    {
        return Some(rule_result("TRANSFER", 0.90));
    }

    // Weighted keyword scoring; only a strictly greater score replaces the
    // current best
    let mut best: Option<BestMatch> = None;
    for category in categories {
        if category.keywords.is_empty() {
            continue;
        }

        let mut score = 0;
        let mut matched_keywords = 0;
        for keyword in &category.keywords {
            if merchant.contains(keyword.as_str()) {
                score += MERCHANT_WEIGHT;
                matched_keywords += 1;
            }
            if description.contains(keyword.as_str()) {
                score += DESCRIPTION_WEIGHT;
                matched_keywords += 1;
            }
        }

        if score > 0 && best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(BestMatch {
                category: &category.name,
                matched_keywords,
                score,
            });
        }
    }

    let best = best?;

    // Confidence from match strength
    let confidence = if best.matched_keywords >= 3 {
        0.95
    } else if best.matched_keywords == 2 {
        0.85
    } else if best.score >= MERCHANT_WEIGHT {
        // Single hit that included the merchant name
        0.80
    } else {
        // Single description-only hit
        0.65
    };

    debug!(
        merchant = %txn.merchant,
        category = best.category,
        score = best.score,
        confidence,
        "Rule match"
    );

    Some(rule_result(best.category, confidence))
}
