//! Statement record operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Bank, Statement, StatementPeriod, StatementStatus};

const STATEMENT_COLUMNS: &str = "id, user_id, file_name, file_size, file_hash, bank, \
     period_from, period_to, status, transactions_count, error_message, uploaded_at, processed_at";

fn row_to_statement(row: &Row) -> rusqlite::Result<Statement> {
    let bank: Option<String> = row.get(5)?;
    let period_from: Option<String> = row.get(6)?;
    let period_to: Option<String> = row.get(7)?;
    let status: String = row.get(8)?;
    let uploaded_at: String = row.get(11)?;
    let processed_at: Option<String> = row.get(12)?;

    Ok(Statement {
        id: row.get(0)?,
        user_id: row.get(1)?,
        file_name: row.get(2)?,
        file_size: row.get(3)?,
        file_hash: row.get(4)?,
        bank: bank.and_then(|b| b.parse::<Bank>().ok()),
        period: StatementPeriod {
            from: period_from.and_then(|d| d.parse().ok()),
            to: period_to.and_then(|d| d.parse().ok()),
        },
        status: status.parse().unwrap_or(StatementStatus::Failed),
        transactions_count: row.get(9)?,
        error_message: row.get(10)?,
        uploaded_at: parse_datetime(&uploaded_at),
        processed_at: processed_at.map(|s| parse_datetime(&s)),
    })
}

impl Database {
    /// Create a new statement record in the parsing state
    pub fn create_statement(
        &self,
        user_id: Option<&str>,
        file_name: &str,
        file_size: i64,
        file_hash: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO statements (user_id, file_name, file_size, file_hash, status)
            VALUES (?, ?, ?, ?, 'parsing')
            "#,
            params![user_id, file_name, file_size, file_hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Look up a user's statement by content hash (duplicate detection)
    pub fn find_statement_by_hash(
        &self,
        file_hash: &str,
        user_id: Option<&str>,
    ) -> Result<Option<Statement>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM statements WHERE file_hash = ? AND user_id IS ?",
            STATEMENT_COLUMNS
        );

        let statement = conn
            .query_row(&sql, params![file_hash, user_id], row_to_statement)
            .optional()?;

        Ok(statement)
    }

    /// Get a statement by id
    pub fn get_statement(&self, id: i64) -> Result<Statement> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM statements WHERE id = ?", STATEMENT_COLUMNS);

        conn.query_row(&sql, params![id], row_to_statement)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("statement {}", id)))
    }

    /// Mark a statement completed with its parse results
    pub fn mark_statement_completed(
        &self,
        id: i64,
        bank: Bank,
        period: &StatementPeriod,
        transactions_count: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE statements SET
                status = 'completed',
                bank = ?,
                period_from = ?,
                period_to = ?,
                transactions_count = ?,
                error_message = NULL,
                processed_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                bank.as_str(),
                period.from.map(|d| d.to_string()),
                period.to.map(|d| d.to_string()),
                transactions_count,
                id,
            ],
        )?;
        Ok(())
    }

    /// Mark a statement failed, retaining the error message for the user
    pub fn mark_statement_failed(&self, id: i64, error_message: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE statements SET
                status = 'failed',
                error_message = ?,
                processed_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![error_message, id],
        )?;
        Ok(())
    }

    /// List a user's statements, most recent first
    pub fn list_statements(&self, user_id: Option<&str>, limit: i64) -> Result<Vec<Statement>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM statements
             WHERE user_id IS ?
             ORDER BY uploaded_at DESC, id DESC
             LIMIT ?",
            STATEMENT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let statements = stmt
            .query_map(params![user_id, limit], row_to_statement)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(statements)
    }

    /// Delete a statement and all of its transactions
    pub fn delete_statement(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM transactions WHERE statement_id = ?", params![id])?;
        let deleted = tx.execute("DELETE FROM statements WHERE id = ?", params![id])?;
        tx.commit()?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("statement {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let db = Database::in_memory().unwrap();

        let id = db
            .create_statement(Some("user-1"), "nov.pdf", 1024, "abc123")
            .unwrap();

        let statement = db.get_statement(id).unwrap();
        assert_eq!(statement.user_id.as_deref(), Some("user-1"));
        assert_eq!(statement.file_name, "nov.pdf");
        assert_eq!(statement.status, StatementStatus::Parsing);
        assert!(statement.bank.is_none());
        assert!(statement.processed_at.is_none());
    }

    #[test]
    fn test_find_by_hash_is_per_user() {
        let db = Database::in_memory().unwrap();

        db.create_statement(Some("user-1"), "nov.pdf", 1024, "abc123")
            .unwrap();

        assert!(db
            .find_statement_by_hash("abc123", Some("user-1"))
            .unwrap()
            .is_some());
        // Same content hash under a different user is not a duplicate
        assert!(db
            .find_statement_by_hash("abc123", Some("user-2"))
            .unwrap()
            .is_none());
        assert!(db.find_statement_by_hash("abc123", None).unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let db = Database::in_memory().unwrap();
        let id = db.create_statement(None, "nov.pdf", 0, "h1").unwrap();

        let period = StatementPeriod {
            from: chrono::NaiveDate::from_ymd_opt(2024, 11, 1),
            to: chrono::NaiveDate::from_ymd_opt(2024, 11, 30),
        };
        db.mark_statement_completed(id, Bank::Hdfc, &period, 12)
            .unwrap();

        let statement = db.get_statement(id).unwrap();
        assert_eq!(statement.status, StatementStatus::Completed);
        assert_eq!(statement.bank, Some(Bank::Hdfc));
        assert_eq!(statement.period, period);
        assert_eq!(statement.transactions_count, 12);
        assert!(statement.processed_at.is_some());
    }

    #[test]
    fn test_failed_statement_keeps_message() {
        let db = Database::in_memory().unwrap();
        let id = db.create_statement(None, "scan.pdf", 0, "h2").unwrap();

        db.mark_statement_failed(id, "No transactions found in HDFC statement")
            .unwrap();

        let statement = db.get_statement(id).unwrap();
        assert_eq!(statement.status, StatementStatus::Failed);
        assert!(statement
            .error_message
            .unwrap()
            .contains("No transactions found"));
    }

    #[test]
    fn test_delete_statement() {
        let db = Database::in_memory().unwrap();
        let id = db.create_statement(None, "nov.pdf", 0, "h3").unwrap();

        db.delete_statement(id).unwrap();
        assert!(matches!(db.get_statement(id), Err(Error::NotFound(_))));
        assert!(matches!(db.delete_statement(id), Err(Error::NotFound(_))));
    }
}
