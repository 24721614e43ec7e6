//! Categorization orchestrator
//!
//! Composes the per-transaction decision pipeline: merchant mapping lookup
//! (user scope preferred), then the rule engine, then the AI fallback, each
//! stage short-circuiting once it clears the confidence threshold. Rule hits
//! are always written back to the mapping store so future statements resolve
//! on the cheap first stage; AI hits are written back only above the learn
//! threshold. Nothing in this pipeline raises for a single transaction; the
//! all-None triple is the valid terminal state.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient, TxnContext};
use crate::db::Database;
use crate::error::Result;
use crate::models::{
    CategorizationResult, CategorizedBy, Category, NormalizedTransaction, StoredTransaction,
};

pub mod rules;

/// Minimum confidence at which a stage's answer is accepted without
/// escalating to the next, more expensive stage
pub const CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Minimum AI confidence that is learned into the mapping store
pub const AI_LEARN_THRESHOLD: f64 = 0.8;

/// Result of a backfill run over stored transactions
#[derive(Debug, Clone, Default)]
pub struct BackfillResult {
    pub processed: i64,
    pub categorized: i64,
    pub by_rule: i64,
    pub by_ai: i64,
    pub uncategorized: i64,
}

/// Categorization pipeline with an explicit category cache
///
/// The cache is owned here and cleared with [`Categorizer::invalidate`]
/// after the vocabulary is seeded or edited; there is no ambient global
/// state.
pub struct Categorizer<'a> {
    db: &'a Database,
    ai: Option<&'a AIClient>,
    categories: Mutex<Option<Vec<Category>>>,
}

impl<'a> Categorizer<'a> {
    /// Create a new categorizer with an optional AI client
    pub fn new(db: &'a Database, ai: Option<&'a AIClient>) -> Self {
        Self {
            db,
            ai,
            categories: Mutex::new(None),
        }
    }

    /// Drop the cached category vocabulary (call after seeding)
    pub fn invalidate(&self) {
        *self.categories.lock().unwrap() = None;
    }

    /// Load the system categories, cached after the first call
    ///
    /// The db returns them in stable name order, which the rule engine
    /// relies on for deterministic tie-breaks.
    fn categories(&self) -> Result<Vec<Category>> {
        let mut cache = self.categories.lock().unwrap();
        if let Some(ref categories) = *cache {
            return Ok(categories.clone());
        }
        let categories = self.db.list_system_categories()?;
        *cache = Some(categories.clone());
        Ok(categories)
    }

    fn category_names(&self) -> Result<Vec<String>> {
        Ok(self.categories()?.into_iter().map(|c| c.name).collect())
    }

    /// Run the mapping and rule stages; Some only when a stage cleared the
    /// confidence threshold
    fn resolve_without_ai(
        &self,
        txn: &NormalizedTransaction,
        user_id: Option<&str>,
    ) -> Result<Option<CategorizationResult>> {
        // Stage 1: learned merchant mapping, user scope preferred
        if let Some(mapping) = self.db.find_mapping(&txn.merchant, user_id)? {
            if mapping.confidence >= CONFIDENCE_THRESHOLD {
                debug!(
                    merchant = %txn.merchant,
                    category = %mapping.category,
                    "Mapping hit"
                );
                return Ok(Some(CategorizationResult {
                    category: Some(mapping.category),
                    confidence: Some(mapping.confidence),
                    categorized_by: Some(CategorizedBy::Rule),
                }));
            }
        }

        // Stage 2: rule engine. Every rule hit is learned, even a weak one,
        // so the next statement resolves on the mapping stage directly.
        if let Some(result) = rules::categorize(txn, &self.categories()?) {
            if let (Some(category), Some(confidence)) = (&result.category, result.confidence) {
                self.db
                    .save_mapping(&txn.merchant, category, confidence, user_id)?;
                if confidence >= CONFIDENCE_THRESHOLD {
                    return Ok(Some(result));
                }
            }
        }

        Ok(None)
    }

    /// Learn a confident AI answer into the mapping store
    fn learn_ai_result(
        &self,
        merchant: &str,
        category: &str,
        confidence: f64,
        user_id: Option<&str>,
    ) -> Result<()> {
        if confidence >= AI_LEARN_THRESHOLD {
            self.db.save_mapping(merchant, category, confidence, user_id)?;
        }
        Ok(())
    }

    /// Categorize a single transaction
    pub async fn categorize_transaction(
        &self,
        txn: &NormalizedTransaction,
        user_id: Option<&str>,
    ) -> Result<CategorizationResult> {
        if let Some(result) = self.resolve_without_ai(txn, user_id)? {
            return Ok(result);
        }

        // Stage 3: AI fallback. Failures degrade to uncategorized; they
        // never surface to the caller.
        if let Some(ai) = self.ai {
            let names = self.category_names()?;
            match ai.classify_transaction(&TxnContext::from(txn), &names).await {
                Ok(answer) => {
                    self.learn_ai_result(&txn.merchant, &answer.category, answer.confidence, user_id)?;
                    return Ok(CategorizationResult {
                        category: Some(answer.category),
                        confidence: Some(answer.confidence),
                        categorized_by: Some(CategorizedBy::Ai),
                    });
                }
                Err(e) => {
                    warn!(merchant = %txn.merchant, "AI categorization failed: {}", e);
                }
            }
        }

        Ok(CategorizationResult::uncategorized())
    }

    /// Categorize a batch of transactions
    ///
    /// Mapping and rule stages run per transaction first; only the unresolved
    /// subset goes to the AI in chunked batch calls. AI answers merge back by
    /// original index within the submitted batch, since (merchant, date) is
    /// not a unique join key.
    pub async fn categorize_batch(
        &self,
        txns: &[NormalizedTransaction],
        user_id: Option<&str>,
    ) -> Result<Vec<CategorizationResult>> {
        let mut results: Vec<CategorizationResult> = Vec::with_capacity(txns.len());
        let mut pending: Vec<usize> = Vec::new();

        for (i, txn) in txns.iter().enumerate() {
            match self.resolve_without_ai(txn, user_id)? {
                Some(result) => results.push(result),
                None => {
                    results.push(CategorizationResult::uncategorized());
                    pending.push(i);
                }
            }
        }

        if !pending.is_empty() {
            if let Some(ai) = self.ai {
                info!(count = pending.len(), "Batch AI categorization for unresolved transactions");

                let names = self.category_names()?;
                let contexts: Vec<TxnContext> =
                    pending.iter().map(|&i| TxnContext::from(&txns[i])).collect();
                let answers = ai.classify_batch(&contexts, &names).await;

                for (slot, answer) in pending.iter().zip(answers) {
                    if let Some(answer) = answer {
                        self.learn_ai_result(
                            &txns[*slot].merchant,
                            &answer.category,
                            answer.confidence,
                            user_id,
                        )?;
                        results[*slot] = CategorizationResult {
                            category: Some(answer.category),
                            confidence: Some(answer.confidence),
                            categorized_by: Some(CategorizedBy::Ai),
                        };
                    }
                }
            }
        }

        info!(
            total = results.len(),
            categorized = results.iter().filter(|r| !r.is_uncategorized()).count(),
            "Batch categorization completed"
        );

        Ok(results)
    }

    /// Manually set a transaction's category
    ///
    /// Records confidence 1.0 with manual provenance and unconditionally
    /// overwrites the merchant mapping at 1.0, the strongest learning
    /// signal the system has. Only another manual override weakens it.
    pub fn set_manual_category(
        &self,
        transaction_id: i64,
        category: &str,
    ) -> Result<StoredTransaction> {
        let txn = self.db.get_transaction(transaction_id)?;
        self.db
            .update_transaction_category(transaction_id, category, 1.0, CategorizedBy::Manual)?;
        self.db
            .save_mapping(&txn.merchant, category, 1.0, txn.user_id.as_deref())?;
        self.db.get_transaction(transaction_id)
    }

    /// Re-run categorization over stored uncategorized transactions
    pub async fn backfill(&self, user_id: Option<&str>, limit: i64) -> Result<BackfillResult> {
        let stored = self.db.list_uncategorized_transactions(user_id, limit)?;
        let txns: Vec<NormalizedTransaction> = stored.iter().map(to_normalized).collect();

        let decisions = self.categorize_batch(&txns, user_id).await?;

        let mut result = BackfillResult {
            processed: stored.len() as i64,
            ..Default::default()
        };

        for (txn, decision) in stored.iter().zip(decisions) {
            match (decision.category, decision.confidence, decision.categorized_by) {
                (Some(category), Some(confidence), Some(by)) => {
                    self.db
                        .update_transaction_category(txn.id, &category, confidence, by)?;
                    result.categorized += 1;
                    match by {
                        CategorizedBy::Ai => result.by_ai += 1,
                        _ => result.by_rule += 1,
                    }
                }
                _ => result.uncategorized += 1,
            }
        }

        Ok(result)
    }
}

/// Project a stored transaction back into its canonical shape
fn to_normalized(txn: &StoredTransaction) -> NormalizedTransaction {
    NormalizedTransaction {
        date: txn.date,
        merchant: txn.merchant.clone(),
        raw_description: txn.raw_description.clone(),
        amount: txn.amount,
        txn_type: txn.txn_type,
        mode: txn.mode,
        balance_after: txn.balance_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMode, TxnType};
    use crate::seed;

    fn txn(merchant: &str, description: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            date: chrono::NaiveDate::from_ymd_opt(2024, 11, 5),
            merchant: merchant.to_string(),
            raw_description: description.to_string(),
            amount: 450.0,
            txn_type: TxnType::Debit,
            mode: PaymentMode::Upi,
            balance_after: None,
        }
    }

    fn seeded_db() -> Database {
        let db = Database::in_memory().unwrap();
        seed::seed_categories(&db).unwrap();
        db
    }

    #[tokio::test]
    async fn test_mapping_stage_short_circuits() {
        let db = seeded_db();
        db.save_mapping("netflix premium", "CUSTOM", 0.9, Some("user-1"))
            .unwrap();

        // The mock AI would say ENTERTAINMENT; a confident mapping means the
        // AI stage is never reached
        let ai = AIClient::mock();
        let categorizer = Categorizer::new(&db, Some(&ai));

        let result = categorizer
            .categorize_transaction(&txn("NETFLIX PREMIUM", "NETFLIX PREMIUM"), Some("user-1"))
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("CUSTOM"));
        assert_eq!(result.categorized_by, Some(CategorizedBy::Rule));
    }

    #[tokio::test]
    async fn test_low_confidence_mapping_is_not_accepted() {
        let db = seeded_db();
        db.conn()
            .unwrap()
            .execute(
                "INSERT INTO merchant_mappings (merchant, category, confidence, user_id)
                 VALUES ('mystery shop', 'SHOPPING', 0.5, '')",
                [],
            )
            .unwrap();

        let categorizer = Categorizer::new(&db, None);
        let result = categorizer
            .categorize_transaction(&txn("MYSTERY SHOP", "MYSTERY SHOP"), None)
            .await
            .unwrap();
        // Below threshold and no other stage matched
        assert!(result.is_uncategorized());
    }

    #[tokio::test]
    async fn test_rule_hit_is_learned() {
        let db = seeded_db();
        let categorizer = Categorizer::new(&db, None);

        let result = categorizer
            .categorize_transaction(&txn("SWIGGY ORDER", "UPI-SWIGGY-987"), Some("user-1"))
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("FOOD"));

        // Writeback happened, future lookups hit the mapping stage
        let mapping = db
            .find_mapping("SWIGGY ORDER", Some("user-1"))
            .unwrap()
            .unwrap();
        assert_eq!(mapping.category, "FOOD");
    }

    #[tokio::test]
    async fn test_ai_fallback_and_learning() {
        let db = seeded_db();
        let ai = AIClient::mock();
        let categorizer = Categorizer::new(&db, Some(&ai));

        // "DUNZO DAILY" has no rule keyword but the mock AI knows it
        let result = categorizer
            .categorize_transaction(&txn("DUNZO DAILY 42", "DUNZO DAILY 42"), None)
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("GROCERIES"));
        assert_eq!(result.categorized_by, Some(CategorizedBy::Ai));

        // Confidence 0.92 >= 0.8, so it was learned
        assert!(db.find_mapping("DUNZO DAILY 42", None).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_weak_ai_result_is_not_learned() {
        let db = seeded_db();
        let ai = AIClient::mock();
        let categorizer = Categorizer::new(&db, Some(&ai));

        // Unknown merchant: mock answers OTHER at 0.4
        let result = categorizer
            .categorize_transaction(&txn("QQWWEE 11", "QQWWEE 11"), None)
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("OTHER"));
        assert!(db.find_mapping("QQWWEE 11", None).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_ai_means_uncategorized() {
        let db = seeded_db();
        let categorizer = Categorizer::new(&db, None);

        let result = categorizer
            .categorize_transaction(&txn("QQWWEE 11", "QQWWEE 11"), None)
            .await
            .unwrap();
        assert!(result.is_uncategorized());
    }

    #[tokio::test]
    async fn test_unhealthy_ai_never_aborts() {
        let db = seeded_db();
        let ai = AIClient::Mock(crate::ai::MockBackend::unhealthy());
        let categorizer = Categorizer::new(&db, Some(&ai));

        let result = categorizer
            .categorize_transaction(&txn("QQWWEE 11", "QQWWEE 11"), None)
            .await
            .unwrap();
        assert!(result.is_uncategorized());
    }

    #[tokio::test]
    async fn test_batch_only_sends_unresolved_to_ai() {
        let db = seeded_db();
        let ai = AIClient::mock();
        let categorizer = Categorizer::new(&db, Some(&ai));

        let txns = vec![
            txn("SWIGGY ORDER", "UPI-SWIGGY-987"), // rules
            txn("DUNZO DAILY 42", "DUNZO DAILY 42"), // AI
            txn("QQWWEE 11", "QQWWEE 11"),         // AI, weak
        ];

        let results = categorizer.categorize_batch(&txns, None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].categorized_by, Some(CategorizedBy::Rule));
        assert_eq!(results[1].category.as_deref(), Some("GROCERIES"));
        assert_eq!(results[1].categorized_by, Some(CategorizedBy::Ai));
        assert_eq!(results[2].category.as_deref(), Some("OTHER"));
    }

    #[tokio::test]
    async fn test_manual_override_sticks() {
        let db = seeded_db();
        let statement_id = db.create_statement(Some("u1"), "nov.pdf", 0, "h1").unwrap();
        db.bulk_insert_transactions(&[crate::models::NewTransaction {
            user_id: Some("u1".to_string()),
            statement_id,
            bank: crate::models::Bank::Hdfc,
            date: chrono::NaiveDate::from_ymd_opt(2024, 11, 5),
            merchant: "XYZ MART".to_string(),
            raw_description: "XYZ MART".to_string(),
            amount: 100.0,
            txn_type: TxnType::Debit,
            mode: PaymentMode::Upi,
            balance_after: None,
            category: None,
            category_confidence: None,
            categorized_by: None,
            import_hash: "txh1".to_string(),
        }])
        .unwrap();
        let id = db.list_transactions_for_statement(statement_id).unwrap()[0].id;

        let categorizer = Categorizer::new(&db, None);
        let updated = categorizer.set_manual_category(id, "groceries").unwrap();
        assert_eq!(updated.category.as_deref(), Some("GROCERIES"));
        assert_eq!(updated.categorized_by, Some(CategorizedBy::Manual));
        assert_eq!(updated.category_confidence, Some(1.0));

        // Mapping was overwritten at full confidence
        let mapping = db.find_mapping("XYZ MART", Some("u1")).unwrap().unwrap();
        assert_eq!(mapping.category, "GROCERIES");
        assert_eq!(mapping.confidence, 1.0);

        // A later rule-stage categorization of a new XYZ MART transaction
        // resolves on the manual mapping and does not downgrade it
        let result = categorizer
            .categorize_transaction(&txn("XYZ MART", "XYZ MART"), Some("u1"))
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("GROCERIES"));
        let mapping = db.find_mapping("XYZ MART", Some("u1")).unwrap().unwrap();
        assert_eq!(mapping.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_invalidate_reloads_categories() {
        let db = Database::in_memory().unwrap();
        let categorizer = Categorizer::new(&db, None);

        // No categories yet: nothing matches
        let result = categorizer
            .categorize_transaction(&txn("SWIGGY ORDER", "SWIGGY"), None)
            .await
            .unwrap();
        assert!(result.is_uncategorized());

        // Seed and invalidate; same transaction now matches
        seed::seed_categories(&db).unwrap();
        categorizer.invalidate();
        let result = categorizer
            .categorize_transaction(&txn("SWIGGY ORDER", "SWIGGY"), None)
            .await
            .unwrap();
        assert_eq!(result.category.as_deref(), Some("FOOD"));
    }

    #[tokio::test]
    async fn test_backfill() {
        let db = seeded_db();
        let statement_id = db.create_statement(None, "nov.pdf", 0, "h1").unwrap();
        let mk = |merchant: &str, hash: &str| crate::models::NewTransaction {
            user_id: None,
            statement_id,
            bank: crate::models::Bank::Hdfc,
            date: chrono::NaiveDate::from_ymd_opt(2024, 11, 5),
            merchant: merchant.to_string(),
            raw_description: merchant.to_string(),
            amount: 100.0,
            txn_type: TxnType::Debit,
            mode: PaymentMode::Upi,
            balance_after: None,
            category: None,
            category_confidence: None,
            categorized_by: None,
            import_hash: hash.to_string(),
        };
        db.bulk_insert_transactions(&[mk("SWIGGY ORDER", "h-a"), mk("QQWWEE 11", "h-b")])
            .unwrap();

        let categorizer = Categorizer::new(&db, None);
        let result = categorizer.backfill(None, 100).await.unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.categorized, 1);
        assert_eq!(result.by_rule, 1);
        assert_eq!(result.uncategorized, 1);
    }
}
