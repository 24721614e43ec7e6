//! Transaction storage operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Bank, CategorizedBy, NewTransaction, PaymentMode, StoredTransaction, TxnType};

/// Rows inserted per bulk-insert chunk
const BULK_CHUNK_SIZE: usize = 500;

/// Result of a bulk insert
#[derive(Debug, Clone, Default)]
pub struct BulkInsertResult {
    pub inserted: usize,
    /// Rows skipped because an identical row already existed
    pub skipped: usize,
}

/// Generate a row-level deduplication hash
///
/// Scoped to the user so identical rows uploaded by different users do not
/// collide; overlapping statements from the same user dedup naturally.
pub fn import_hash(
    user_id: Option<&str>,
    date: Option<NaiveDate>,
    description: &str,
    amount: f64,
    txn_type: TxnType,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.unwrap_or("").as_bytes());
    hasher.update(date.map(|d| d.to_string()).unwrap_or_default().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(txn_type.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

const TXN_COLUMNS: &str = "id, user_id, statement_id, bank, date, merchant, raw_description, \
     amount, txn_type, mode, balance_after, category, category_confidence, categorized_by, \
     category_overridden_at, import_hash, created_at";

fn row_to_transaction(row: &Row) -> rusqlite::Result<StoredTransaction> {
    let bank: String = row.get(3)?;
    let date: Option<String> = row.get(4)?;
    let txn_type: String = row.get(8)?;
    let mode: String = row.get(9)?;
    let categorized_by: Option<String> = row.get(13)?;
    let overridden_at: Option<String> = row.get(14)?;
    let created_at: String = row.get(16)?;

    Ok(StoredTransaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        statement_id: row.get(2)?,
        bank: bank.parse().unwrap_or(Bank::Hdfc),
        date: date.and_then(|d| d.parse().ok()),
        merchant: row.get(5)?,
        raw_description: row.get(6)?,
        amount: row.get(7)?,
        txn_type: txn_type.parse().unwrap_or(TxnType::Debit),
        mode: mode.parse().unwrap_or(PaymentMode::Other),
        balance_after: row.get(10)?,
        category: row.get(11)?,
        category_confidence: row.get(12)?,
        categorized_by: categorized_by.and_then(|s| s.parse().ok()),
        category_overridden_at: overridden_at.map(|s| parse_datetime(&s)),
        import_hash: row.get(15)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Insert transactions in chunks with best-effort semantics
    ///
    /// Rows whose import_hash already exists are skipped; the rest of the
    /// chunk still commits. A uniqueness conflict never aborts the batch.
    pub fn bulk_insert_transactions(&self, txns: &[NewTransaction]) -> Result<BulkInsertResult> {
        let mut conn = self.conn()?;
        let mut result = BulkInsertResult::default();

        for chunk in txns.chunks(BULK_CHUNK_SIZE) {
            let tx = conn.transaction()?;
            for txn in chunk {
                let changed = tx.execute(
                    r#"
                    INSERT OR IGNORE INTO transactions
                        (user_id, statement_id, bank, date, merchant, raw_description,
                         amount, txn_type, mode, balance_after, category,
                         category_confidence, categorized_by, import_hash)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                    params![
                        txn.user_id,
                        txn.statement_id,
                        txn.bank.as_str(),
                        txn.date.map(|d| d.to_string()),
                        txn.merchant,
                        txn.raw_description,
                        txn.amount,
                        txn.txn_type.as_str(),
                        txn.mode.as_str(),
                        txn.balance_after,
                        txn.category,
                        txn.category_confidence,
                        txn.categorized_by.map(|c| c.as_str()),
                        txn.import_hash,
                    ],
                )?;
                if changed > 0 {
                    result.inserted += 1;
                } else {
                    result.skipped += 1;
                }
            }
            tx.commit()?;
        }

        debug!(
            inserted = result.inserted,
            skipped = result.skipped,
            "Transactions bulk inserted"
        );
        Ok(result)
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, id: i64) -> Result<StoredTransaction> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", TXN_COLUMNS);

        conn.query_row(&sql, params![id], row_to_transaction)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    /// List the transactions of a statement in insertion order
    pub fn list_transactions_for_statement(
        &self,
        statement_id: i64,
    ) -> Result<Vec<StoredTransaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions WHERE statement_id = ? ORDER BY id",
            TXN_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let txns = stmt
            .query_map(params![statement_id], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txns)
    }

    /// List a user's uncategorized transactions (for backfill)
    pub fn list_uncategorized_transactions(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<StoredTransaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions
             WHERE user_id IS ? AND category IS NULL
             ORDER BY id
             LIMIT ?",
            TXN_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let txns = stmt
            .query_map(params![user_id, limit], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txns)
    }

    /// Update a transaction's category fields
    ///
    /// `manual` marks the update as a user override and stamps
    /// category_overridden_at; automatic recategorization must not touch
    /// rows that carry that stamp.
    pub fn update_transaction_category(
        &self,
        id: i64,
        category: &str,
        confidence: f64,
        categorized_by: CategorizedBy,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = if categorized_by == CategorizedBy::Manual {
            conn.execute(
                r#"
                UPDATE transactions SET
                    category = ?,
                    category_confidence = ?,
                    categorized_by = ?,
                    category_overridden_at = CURRENT_TIMESTAMP
                WHERE id = ?
                "#,
                params![
                    category.trim().to_uppercase(),
                    confidence,
                    categorized_by.as_str(),
                    id
                ],
            )?
        } else {
            conn.execute(
                r#"
                UPDATE transactions SET
                    category = ?,
                    category_confidence = ?,
                    categorized_by = ?
                WHERE id = ? AND category_overridden_at IS NULL
                "#,
                params![
                    category.trim().to_uppercase(),
                    confidence,
                    categorized_by.as_str(),
                    id
                ],
            )?
        };

        if updated == 0 && categorized_by == CategorizedBy::Manual {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }
}
