//! Merchant mapping commands

use std::path::Path;

use anyhow::{bail, Result};

use super::open_db;

pub fn cmd_mappings_list(db_path: &Path, user: Option<&str>) -> Result<()> {
    let db = open_db(db_path)?;
    let mappings = db.list_mappings(user)?;

    if mappings.is_empty() {
        println!("No mappings found. Run 'khata init' to seed the defaults.");
        return Ok(());
    }

    println!(
        "{:<30} {:<15} {:>10} {:>8}  {}",
        "MERCHANT", "CATEGORY", "CONFIDENCE", "MATCHES", "SCOPE"
    );
    for m in mappings {
        println!(
            "{:<30} {:<15} {:>10.2} {:>8}  {}",
            m.merchant,
            m.category,
            m.confidence,
            m.times_matched,
            m.user_id.as_deref().unwrap_or("system"),
        );
    }

    Ok(())
}

pub fn cmd_mappings_set(
    db_path: &Path,
    merchant: &str,
    category: &str,
    user: Option<&str>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let mapping = db.save_mapping(merchant, category, 1.0, user)?;

    println!(
        "Mapped '{}' -> {} ({} scope)",
        mapping.merchant,
        mapping.category,
        mapping.user_id.as_deref().unwrap_or("system"),
    );

    Ok(())
}

pub fn cmd_mappings_delete(db_path: &Path, merchant: &str, user: Option<&str>) -> Result<()> {
    let Some(user) = user else {
        bail!("mappings delete requires --user (system mappings are not deletable)");
    };

    let db = open_db(db_path)?;
    if db.delete_user_mapping(merchant, user)? {
        println!("Deleted mapping for '{}'", merchant);
    } else {
        println!("No user mapping found for '{}'", merchant);
    }

    Ok(())
}

pub fn cmd_mappings_top(db_path: &Path, limit: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let top = db.top_merchants(limit)?;

    println!("{:<30} {:<15} {:>8}", "MERCHANT", "CATEGORY", "MATCHES");
    for m in top {
        println!(
            "{:<30} {:<15} {:>8}",
            m.merchant, m.category, m.times_matched
        );
    }

    Ok(())
}
