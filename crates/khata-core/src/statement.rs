//! Statement processing pipeline
//!
//! Takes a statement's extracted text end to end: duplicate detection by
//! content hash, bank detection and parsing, normalization, batch
//! categorization, chunked bulk insert, and the status transition on the
//! statement record. A failed statement is kept with status=failed and the
//! error message retained so the user can see what was uploaded and why it
//! failed.

use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::ai::AIClient;
use crate::categorize::Categorizer;
use crate::db::{import_hash, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Statement};
use crate::parse::parse_statement;

/// Outcome of processing one statement upload
#[derive(Debug, Clone)]
pub struct ProcessedStatement {
    pub statement: Statement,
    pub inserted: usize,
    /// Rows skipped as duplicates of already-stored transactions
    pub skipped: usize,
    pub categorized: usize,
    pub uncategorized: usize,
}

/// End-to-end statement processor
pub struct StatementProcessor<'a> {
    db: &'a Database,
    categorizer: Categorizer<'a>,
}

impl<'a> StatementProcessor<'a> {
    /// Create a processor with an optional AI fallback client
    pub fn new(db: &'a Database, ai: Option<&'a AIClient>) -> Self {
        Self {
            db,
            categorizer: Categorizer::new(db, ai),
        }
    }

    /// Access the underlying categorizer (for cache invalidation after
    /// seeding)
    pub fn categorizer(&self) -> &Categorizer<'a> {
        &self.categorizer
    }

    /// Process one uploaded statement's extracted text
    ///
    /// Duplicate uploads (same content hash for the same user) are rejected
    /// with a conflict naming the original upload date, before any record is
    /// created. Failures after record creation flip the statement to failed
    /// and propagate.
    pub async fn process(
        &self,
        text: &str,
        file_name: &str,
        user_id: Option<&str>,
    ) -> Result<ProcessedStatement> {
        let file_hash = hex::encode(Sha256::digest(text.as_bytes()));

        if let Some(existing) = self.db.find_statement_by_hash(&file_hash, user_id)? {
            return Err(Error::Conflict(format!(
                "This statement has already been uploaded. Uploaded on {}",
                existing.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            )));
        }

        let statement_id = self.db.create_statement(
            user_id,
            file_name,
            text.len() as i64,
            &file_hash,
        )?;
        info!(statement_id, file_name, "Processing statement upload");

        match self.run_pipeline(statement_id, text, user_id).await {
            Ok(processed) => Ok(processed),
            Err(e) => {
                error!(statement_id, "Statement processing failed: {}", e);
                self.db.mark_statement_failed(statement_id, &e.to_string())?;
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        statement_id: i64,
        text: &str,
        user_id: Option<&str>,
    ) -> Result<ProcessedStatement> {
        let parsed = parse_statement(text)?;

        let decisions = self
            .categorizer
            .categorize_batch(&parsed.transactions, user_id)
            .await?;

        let new_txns: Vec<NewTransaction> = parsed
            .transactions
            .iter()
            .zip(&decisions)
            .map(|(txn, decision)| NewTransaction {
                user_id: user_id.map(|u| u.to_string()),
                statement_id,
                bank: parsed.bank,
                date: txn.date,
                merchant: txn.merchant.clone(),
                raw_description: txn.raw_description.clone(),
                amount: txn.amount,
                txn_type: txn.txn_type,
                mode: txn.mode,
                balance_after: txn.balance_after,
                category: decision.category.clone(),
                category_confidence: decision.confidence,
                categorized_by: decision.categorized_by,
                import_hash: import_hash(
                    user_id,
                    txn.date,
                    &txn.raw_description,
                    txn.amount,
                    txn.txn_type,
                ),
            })
            .collect();

        let insert = self.db.bulk_insert_transactions(&new_txns)?;
        self.db.mark_statement_completed(
            statement_id,
            parsed.bank,
            &parsed.period,
            insert.inserted as i64,
        )?;

        let categorized = decisions.iter().filter(|d| !d.is_uncategorized()).count();
        info!(
            statement_id,
            bank = %parsed.bank,
            inserted = insert.inserted,
            skipped = insert.skipped,
            categorized,
            "Statement processed"
        );

        Ok(ProcessedStatement {
            statement: self.db.get_statement(statement_id)?,
            inserted: insert.inserted,
            skipped: insert.skipped,
            categorized,
            uncategorized: decisions.len() - categorized,
        })
    }

    /// Delete a statement and its transactions, enforcing ownership
    pub fn delete_statement(&self, statement_id: i64, user_id: Option<&str>) -> Result<()> {
        let statement = self.db.get_statement(statement_id)?;
        if statement.user_id.as_deref() != user_id {
            return Err(Error::InvalidData(
                "you can only delete your own statements".to_string(),
            ));
        }
        self.db.delete_statement(statement_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatementStatus, TxnType};
    use crate::seed;

    const HDFC_TEXT: &str = "HDFC BANK Ltd.\n\
        Statement from 01/11/2024 to 30/11/2024\n\
        Date  Narration  Withdrawal  Deposit  Balance\n\
        05/11/2024  SWIGGY ORDER  450.00    5200.00\n\
        07/11/2024  NEFT SALARY CREDIT  0.00  75,000.00  80,200.00\n";

    fn seeded_db() -> Database {
        let db = Database::in_memory().unwrap();
        seed::seed_all(&db).unwrap();
        db
    }

    #[tokio::test]
    async fn test_process_statement() {
        let db = seeded_db();
        let processor = StatementProcessor::new(&db, None);

        let processed = processor
            .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
            .await
            .unwrap();

        assert_eq!(processed.statement.status, StatementStatus::Completed);
        assert_eq!(processed.statement.bank, Some(crate::models::Bank::Hdfc));
        assert_eq!(processed.inserted, 2);
        assert_eq!(processed.skipped, 0);
        // SWIGGY resolves via the rule keywords; the salary credit hits the
        // income shortcut
        assert_eq!(processed.categorized, 2);

        let txns = db
            .list_transactions_for_statement(processed.statement.id)
            .unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].txn_type, TxnType::Debit);
        assert_eq!(txns[0].amount, 450.0);
        assert_eq!(txns[0].balance_after, Some(5200.0));
        assert_eq!(txns[1].category.as_deref(), Some("INCOME"));
    }

    #[tokio::test]
    async fn test_duplicate_upload_conflicts() {
        let db = seeded_db();
        let processor = StatementProcessor::new(&db, None);

        processor
            .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
            .await
            .unwrap();

        let err = processor
            .process(HDFC_TEXT, "nov-again.pdf", Some("user-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.to_string().contains("Uploaded on"));

        // No duplicate statement record, no duplicate transactions
        assert_eq!(db.list_statements(Some("user-1"), 10).unwrap().len(), 1);

        // The same content from another user is not a conflict
        processor
            .process(HDFC_TEXT, "nov.pdf", Some("user-2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_transactions_marks_failed() {
        let db = seeded_db();
        let processor = StatementProcessor::new(&db, None);

        let err = processor
            .process("HDFC BANK Ltd.\nNothing to see here\n", "empty.pdf", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyStatement(_)));

        let statements = db.list_statements(None, 10).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].status, StatementStatus::Failed);
        assert!(statements[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("No transactions found"));
    }

    #[tokio::test]
    async fn test_unsupported_bank_marks_failed() {
        let db = seeded_db();
        let processor = StatementProcessor::new(&db, None);

        let err = processor
            .process("Kotak Mahindra Bank\n01/11/2024  X  1.00  2.00\n", "k.pdf", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedBank(_)));

        let statements = db.list_statements(None, 10).unwrap();
        assert_eq!(statements[0].status, StatementStatus::Failed);
    }

    #[tokio::test]
    async fn test_delete_statement_ownership() {
        let db = seeded_db();
        let processor = StatementProcessor::new(&db, None);

        let processed = processor
            .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
            .await
            .unwrap();

        let err = processor
            .delete_statement(processed.statement.id, Some("user-2"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));

        processor
            .delete_statement(processed.statement.id, Some("user-1"))
            .unwrap();
        assert!(db
            .list_transactions_for_statement(processed.statement.id)
            .unwrap()
            .is_empty());
    }
}
