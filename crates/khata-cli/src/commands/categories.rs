//! Category commands

use std::path::Path;

use anyhow::Result;
use khata_core::seed;

use super::open_db;

pub fn cmd_categories_list(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let categories = db.list_system_categories()?;

    if categories.is_empty() {
        println!("No categories found. Run 'khata categories seed' first.");
        return Ok(());
    }

    for category in categories {
        if category.keywords.is_empty() {
            println!("{}", category.name);
        } else {
            println!("{}: {}", category.name, category.keywords.join(", "));
        }
    }

    Ok(())
}

pub fn cmd_categories_seed(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let summary = seed::seed_all(&db)?;

    println!(
        "Seeded {} categories and {} merchant mappings",
        summary.categories_created, summary.mappings_created
    );

    Ok(())
}
