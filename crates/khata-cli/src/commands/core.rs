//! Database initialization command

use std::path::Path;

use anyhow::Result;
use khata_core::seed;

use super::open_db;

pub fn cmd_init(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let summary = seed::seed_all(&db)?;

    println!("Database initialized at {}", db.path());
    println!("  Categories seeded: {}", summary.categories_created);
    println!("  Merchant mappings seeded: {}", summary.mappings_created);

    Ok(())
}
