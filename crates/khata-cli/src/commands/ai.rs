//! AI backend commands

use std::path::Path;

use anyhow::{bail, Result};
use khata_core::ai::{AIBackend, TxnContext};
use khata_core::AIClient;

use super::open_db;

fn client() -> Result<AIClient> {
    match AIClient::from_env() {
        Some(client) => Ok(client),
        None => bail!("No AI backend configured. Set OLLAMA_HOST (and optionally OLLAMA_MODEL), or AI_BACKEND=mock."),
    }
}

pub async fn cmd_ai_health() -> Result<()> {
    let client = client()?;

    println!("Backend: {} ({})", client.host(), client.model());
    if client.health_check().await {
        println!("Status: reachable");
    } else {
        println!("Status: NOT reachable");
    }

    Ok(())
}

pub async fn cmd_ai_test(
    db_path: &Path,
    merchant: &str,
    description: Option<&str>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let client = client()?;

    let categories = db.system_category_names()?;
    if categories.is_empty() {
        bail!("No categories seeded. Run 'khata init' first.");
    }

    let txn = TxnContext {
        merchant: merchant.to_string(),
        description: description.unwrap_or(merchant).to_string(),
        amount: 0.0,
        txn_type: "debit".to_string(),
        mode: "OTHER".to_string(),
    };

    match client.classify_transaction(&txn, &categories).await {
        Ok(answer) => println!(
            "{} -> {} (confidence {:.2})",
            merchant, answer.category, answer.confidence
        ),
        Err(e) => println!("Classification failed: {}", e),
    }

    Ok(())
}
