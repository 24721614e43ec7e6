//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `statements` - Statement upload records and status transitions
//! - `transactions` - Transaction storage with chunked best-effort bulk insert
//! - `mappings` - Merchant mapping store (per-user and system-wide scopes)
//! - `categories` - Category vocabulary with keyword sets

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

mod categories;
mod mappings;
mod statements;
mod transactions;

pub use transactions::{import_hash, BulkInsertResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection would otherwise get its own private in-memory database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/khata_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory (faster for complex queries)
            PRAGMA temp_store = MEMORY;

            -- Statement upload records. Failed uploads stay around with
            -- status='failed' and the error message retained.
            CREATE TABLE IF NOT EXISTS statements (
                id INTEGER PRIMARY KEY,
                user_id TEXT,
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL DEFAULT 0,
                file_hash TEXT NOT NULL,
                bank TEXT,
                period_from TEXT,
                period_to TEXT,
                status TEXT NOT NULL DEFAULT 'parsing',
                transactions_count INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                uploaded_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                processed_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_statements_user ON statements(user_id, uploaded_at);
            CREATE INDEX IF NOT EXISTS idx_statements_hash ON statements(file_hash);

            -- Normalized, categorized transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id TEXT,
                statement_id INTEGER NOT NULL REFERENCES statements(id),
                bank TEXT NOT NULL,
                date TEXT,
                merchant TEXT NOT NULL,
                raw_description TEXT NOT NULL,
                amount REAL NOT NULL,
                txn_type TEXT NOT NULL,
                mode TEXT NOT NULL DEFAULT 'OTHER',
                balance_after REAL,
                category TEXT,
                category_confidence REAL,
                categorized_by TEXT,
                category_overridden_at DATETIME,
                import_hash TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_statement ON transactions(statement_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_category ON transactions(user_id, category);

            -- Learned merchant -> category associations.
            -- user_id '' is the system-wide scope: SQLite UNIQUE treats NULLs
            -- as distinct, which would break one-row-per-(merchant, scope).
            CREATE TABLE IF NOT EXISTS merchant_mappings (
                id INTEGER PRIMARY KEY,
                merchant TEXT NOT NULL,
                category TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 1.0,
                times_matched INTEGER NOT NULL DEFAULT 0,
                user_id TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (merchant, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_mappings_user ON merchant_mappings(user_id);

            -- Category vocabulary; keywords stored as a JSON array of
            -- lowercase strings. Same '' scope convention as mappings.
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                is_system INTEGER NOT NULL DEFAULT 0,
                user_id TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (name, user_id)
            );
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime("2024-11-05 10:30:00");
        assert_eq!(dt.to_rfc3339(), "2024-11-05T10:30:00+00:00");
    }
}
