//! Statement commands

use std::path::Path;

use anyhow::Result;
use khata_core::StatementProcessor;

use super::open_db;

pub fn cmd_statements_list(db_path: &Path, user: Option<&str>, limit: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let statements = db.list_statements(user, limit)?;

    if statements.is_empty() {
        println!("No statements uploaded yet.");
        return Ok(());
    }

    println!(
        "{:<5} {:<25} {:<7} {:<10} {:>6}  {}",
        "ID", "FILE", "BANK", "STATUS", "TXNS", "UPLOADED"
    );
    for s in statements {
        println!(
            "{:<5} {:<25} {:<7} {:<10} {:>6}  {}",
            s.id,
            s.file_name,
            s.bank.map(|b| b.as_str()).unwrap_or("-"),
            s.status.as_str(),
            s.transactions_count,
            s.uploaded_at.format("%Y-%m-%d %H:%M"),
        );
        if let Some(ref message) = s.error_message {
            println!("      error: {}", message);
        }
    }

    Ok(())
}

pub fn cmd_statements_show(db_path: &Path, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let statement = db.get_statement(id)?;
    let txns = db.list_transactions_for_statement(id)?;

    println!(
        "Statement {} ({}, {})",
        statement.id,
        statement.file_name,
        statement.status
    );

    println!(
        "{:<5} {:<12} {:<30} {:>12} {:<7} {:<6} {}",
        "ID", "DATE", "MERCHANT", "AMOUNT", "TYPE", "MODE", "CATEGORY"
    );
    for t in txns {
        println!(
            "{:<5} {:<12} {:<30} {:>12.2} {:<7} {:<6} {}",
            t.id,
            t.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            t.merchant,
            t.amount,
            t.txn_type.as_str(),
            t.mode.as_str(),
            t.category.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

pub fn cmd_statements_delete(db_path: &Path, id: i64, user: Option<&str>) -> Result<()> {
    let db = open_db(db_path)?;
    let processor = StatementProcessor::new(&db, None);

    processor.delete_statement(id, user)?;
    println!("Deleted statement {} and its transactions", id);

    Ok(())
}
