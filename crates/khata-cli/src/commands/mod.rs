//! Command implementations
//!
//! Each submodule implements one CLI command group. Shared helpers for
//! opening the database and constructing the AI client live here.

mod ai;
mod categories;
mod categorize;
mod core;
mod import;
mod mappings;
mod statements;

pub use ai::{cmd_ai_health, cmd_ai_test};
pub use categories::{cmd_categories_list, cmd_categories_seed};
pub use categorize::{cmd_categorize, cmd_set_category};
pub use core::cmd_init;
pub use import::cmd_import;
pub use mappings::{cmd_mappings_delete, cmd_mappings_list, cmd_mappings_set, cmd_mappings_top};
pub use statements::{cmd_statements_delete, cmd_statements_list, cmd_statements_show};

use std::path::Path;

use anyhow::Result;
use khata_core::{AIClient, Database};

/// Open (and migrate) the database at the given path
pub fn open_db(path: &Path) -> Result<Database> {
    Ok(Database::new(&path.to_string_lossy())?)
}

/// Build the AI client from the environment, unless disabled
pub fn ai_from_env(no_ai: bool) -> Option<AIClient> {
    if no_ai {
        return None;
    }

    let client = AIClient::from_env();
    if client.is_none() {
        tracing::warn!(
            "No AI backend configured (set OLLAMA_HOST, or AI_BACKEND=mock); \
             transactions the rules cannot resolve will stay uncategorized"
        );
    }
    client
}
