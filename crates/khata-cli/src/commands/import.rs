//! Statement import command

use std::path::Path;

use anyhow::{Context, Result};
use khata_core::StatementProcessor;

use super::{ai_from_env, open_db};

pub async fn cmd_import(
    db_path: &Path,
    file: &Path,
    user: Option<&str>,
    no_ai: bool,
) -> Result<()> {
    let db = open_db(db_path)?;
    let ai = ai_from_env(no_ai);

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let processor = StatementProcessor::new(&db, ai.as_ref());
    let processed = processor.process(&text, &file_name, user).await?;

    let statement = &processed.statement;
    println!("Imported {}", statement.file_name);
    if let Some(bank) = statement.bank {
        println!("  Bank: {}", bank);
    }
    match (statement.period.from, statement.period.to) {
        (Some(from), Some(to)) => println!("  Period: {} to {}", from, to),
        _ => println!("  Period: unknown"),
    }
    println!("  Transactions: {} inserted, {} duplicates skipped", processed.inserted, processed.skipped);
    println!(
        "  Categorized: {} ({} uncategorized)",
        processed.categorized, processed.uncategorized
    );

    Ok(())
}
