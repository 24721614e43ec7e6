//! Merchant mapping store operations
//!
//! Mappings are keyed by (merchant, scope) where scope is a user id or the
//! system-wide scope. Lookups prefer the user-scoped row; saves are atomic
//! upserts so concurrent statement uploads serialize on the store itself.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::MerchantMapping;
use crate::normalize::normalize_merchant;

/// Scope column value for system-wide mappings
const SYSTEM_SCOPE: &str = "";

fn scope_of(user_id: Option<&str>) -> &str {
    user_id.unwrap_or(SYSTEM_SCOPE)
}

fn row_to_mapping(row: &Row) -> rusqlite::Result<MerchantMapping> {
    let user_id: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(MerchantMapping {
        id: row.get(0)?,
        merchant: row.get(1)?,
        category: row.get(2)?,
        confidence: row.get(3)?,
        times_matched: row.get(4)?,
        user_id: if user_id.is_empty() {
            None
        } else {
            Some(user_id)
        },
        created_at: parse_datetime(&created_at),
    })
}

const MAPPING_COLUMNS: &str =
    "id, merchant, category, confidence, times_matched, user_id, created_at";

impl Database {
    /// Find the mapping for a merchant, preferring the user scope
    ///
    /// The merchant is normalized to its lowercase-trimmed form first. When
    /// both a user-scoped and a system-wide row exist, the user-scoped one
    /// wins.
    pub fn find_mapping(
        &self,
        merchant: &str,
        user_id: Option<&str>,
    ) -> Result<Option<MerchantMapping>> {
        let conn = self.conn()?;
        let key = normalize_merchant(merchant).to_lowercase();

        // Non-empty user scope sorts after '' so DESC puts it first
        let sql = format!(
            "SELECT {} FROM merchant_mappings
             WHERE merchant = ? AND user_id IN (?, '')
             ORDER BY user_id DESC
             LIMIT 1",
            MAPPING_COLUMNS
        );

        let mapping = conn
            .query_row(&sql, params![key, scope_of(user_id)], row_to_mapping)
            .optional()?;

        Ok(mapping)
    }

    /// Save or update a merchant mapping (atomic upsert)
    ///
    /// On update the category and confidence are overwritten (not averaged)
    /// and times_matched is incremented; an insert starts times_matched at 1.
    pub fn save_mapping(
        &self,
        merchant: &str,
        category: &str,
        confidence: f64,
        user_id: Option<&str>,
    ) -> Result<MerchantMapping> {
        let conn = self.conn()?;
        let key = normalize_merchant(merchant).to_lowercase();
        let category = category.trim().to_uppercase();
        let scope = scope_of(user_id);

        conn.execute(
            r#"
            INSERT INTO merchant_mappings (merchant, category, confidence, times_matched, user_id)
            VALUES (?, ?, ?, 1, ?)
            ON CONFLICT (merchant, user_id) DO UPDATE SET
                category = excluded.category,
                confidence = excluded.confidence,
                times_matched = merchant_mappings.times_matched + 1
            "#,
            params![key, category, confidence, scope],
        )?;

        let sql = format!(
            "SELECT {} FROM merchant_mappings WHERE merchant = ? AND user_id = ?",
            MAPPING_COLUMNS
        );
        let mapping = conn.query_row(&sql, params![key, scope], row_to_mapping)?;

        tracing::debug!(
            merchant = %mapping.merchant,
            category = %mapping.category,
            times_matched = mapping.times_matched,
            "Merchant mapping saved"
        );

        Ok(mapping)
    }

    /// Bulk-seed system-wide mappings, insert-only
    ///
    /// Idempotent: existing (merchant, system) rows are never overwritten.
    /// Returns the number of rows actually inserted.
    pub fn seed_mappings(&self, entries: &[(&str, &str, f64)]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        for (merchant, category, confidence) in entries {
            let key = normalize_merchant(merchant).to_lowercase();
            let changed = tx.execute(
                r#"
                INSERT OR IGNORE INTO merchant_mappings
                    (merchant, category, confidence, times_matched, user_id)
                VALUES (?, ?, ?, 0, '')
                "#,
                params![key, category.trim().to_uppercase(), confidence],
            )?;
            inserted += changed;
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// List the mappings visible to a user (their own plus system-wide)
    pub fn list_mappings(&self, user_id: Option<&str>) -> Result<Vec<MerchantMapping>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM merchant_mappings
             WHERE user_id IN (?, '')
             ORDER BY merchant",
            MAPPING_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let mappings = stmt
            .query_map(params![scope_of(user_id)], row_to_mapping)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(mappings)
    }

    /// Delete a user-scoped mapping; returns whether a row was removed
    pub fn delete_user_mapping(&self, merchant: &str, user_id: &str) -> Result<bool> {
        if user_id.is_empty() {
            return Err(Error::InvalidData(
                "a user id is required to delete a mapping".to_string(),
            ));
        }

        let conn = self.conn()?;
        let key = normalize_merchant(merchant).to_lowercase();
        let deleted = conn.execute(
            "DELETE FROM merchant_mappings WHERE merchant = ? AND user_id = ?",
            params![key, user_id],
        )?;

        Ok(deleted > 0)
    }

    /// Most-used system-wide mappings
    pub fn top_merchants(&self, limit: i64) -> Result<Vec<MerchantMapping>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM merchant_mappings
             WHERE user_id = ''
             ORDER BY times_matched DESC, merchant
             LIMIT ?",
            MAPPING_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let mappings = stmt
            .query_map(params![limit], row_to_mapping)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(mappings)
    }
}
