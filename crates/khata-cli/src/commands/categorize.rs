//! Categorization commands

use std::path::Path;

use anyhow::Result;
use khata_core::Categorizer;

use super::{ai_from_env, open_db};

pub async fn cmd_categorize(
    db_path: &Path,
    user: Option<&str>,
    limit: i64,
    no_ai: bool,
) -> Result<()> {
    let db = open_db(db_path)?;
    let ai = ai_from_env(no_ai);

    let categorizer = Categorizer::new(&db, ai.as_ref());
    let result = categorizer.backfill(user, limit).await?;

    println!("Processed {} uncategorized transactions", result.processed);
    println!("  By rules/mappings: {}", result.by_rule);
    println!("  By AI: {}", result.by_ai);
    println!("  Still uncategorized: {}", result.uncategorized);

    Ok(())
}

pub fn cmd_set_category(db_path: &Path, transaction_id: i64, category: &str) -> Result<()> {
    let db = open_db(db_path)?;
    let categorizer = Categorizer::new(&db, None);

    let updated = categorizer.set_manual_category(transaction_id, category)?;
    println!(
        "Transaction {} ({}) set to {}",
        updated.id,
        updated.merchant,
        updated.category.as_deref().unwrap_or("-")
    );
    println!("Mapping for '{}' learned at confidence 1.0", updated.merchant);

    Ok(())
}
