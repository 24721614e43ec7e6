//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Khata - Turn bank statement PDFs into categorized transactions
#[derive(Parser)]
#[command(name = "khata")]
#[command(about = "Self-hosted bank statement analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "khata.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// User scope for per-user data (statements, mappings)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed categories + merchant mappings
    Init,

    /// Import a bank statement from its extracted text
    Import {
        /// Text file with the statement's extracted PDF text
        #[arg(short, long)]
        file: PathBuf,

        /// Skip the AI fallback stage
        #[arg(long)]
        no_ai: bool,
    },

    /// Re-run categorization over uncategorized transactions
    Categorize {
        /// Maximum number of transactions to process
        #[arg(short, long, default_value = "100")]
        limit: i64,

        /// Skip the AI fallback stage
        #[arg(long)]
        no_ai: bool,
    },

    /// Manually set a transaction's category (strongest learning signal)
    SetCategory {
        /// Transaction ID
        transaction_id: i64,
        /// Category name (e.g., "FOOD")
        category: String,
    },

    /// Manage merchant mappings (list, set, delete, top)
    Mappings {
        #[command(subcommand)]
        action: Option<MappingsAction>,
    },

    /// Manage categories (list, seed)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage statements (list, show, delete)
    Statements {
        #[command(subcommand)]
        action: Option<StatementsAction>,
    },

    /// Test the AI backend configuration
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },
}

#[derive(Subcommand)]
pub enum MappingsAction {
    /// List mappings visible to the current user scope
    List,

    /// Create or overwrite a mapping at full confidence
    Set {
        /// Merchant name
        merchant: String,
        /// Category name
        category: String,
    },

    /// Delete a user-scoped mapping (requires --user)
    Delete {
        /// Merchant name
        merchant: String,
    },

    /// Show the most-used system-wide mappings
    Top {
        /// Number of results
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List system categories and their keywords
    List,

    /// Seed the default categories and common merchants
    Seed,
}

#[derive(Subcommand)]
pub enum StatementsAction {
    /// List uploaded statements
    List {
        /// Number of results
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show a statement's transactions
    Show {
        /// Statement ID
        id: i64,
    },

    /// Delete a statement and its transactions
    Delete {
        /// Statement ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Check whether the configured AI backend is reachable
    Health,

    /// Classify a merchant through the configured AI backend
    Test {
        /// Merchant name
        merchant: String,

        /// Raw description (defaults to the merchant name)
        #[arg(short, long)]
        description: Option<String>,
    },
}
