//! Khata CLI - Bank statement analyzer
//!
//! Usage:
//!   khata init                       Initialize database and seed defaults
//!   khata import --file TEXT         Import a statement (auto-detects bank)
//!   khata categorize                 Backfill uncategorized transactions
//!   khata statements list            Show uploaded statements
//!   khata mappings list              Show learned merchant mappings

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import { file, no_ai } => {
            commands::cmd_import(&cli.db, &file, user, no_ai).await
        }
        Commands::Categorize { limit, no_ai } => {
            commands::cmd_categorize(&cli.db, user, limit, no_ai).await
        }
        Commands::SetCategory {
            transaction_id,
            category,
        } => commands::cmd_set_category(&cli.db, transaction_id, &category),
        Commands::Mappings { action } => match action {
            None | Some(MappingsAction::List) => commands::cmd_mappings_list(&cli.db, user),
            Some(MappingsAction::Set { merchant, category }) => {
                commands::cmd_mappings_set(&cli.db, &merchant, &category, user)
            }
            Some(MappingsAction::Delete { merchant }) => {
                commands::cmd_mappings_delete(&cli.db, &merchant, user)
            }
            Some(MappingsAction::Top { limit }) => commands::cmd_mappings_top(&cli.db, limit),
        },
        Commands::Categories { action } => match action {
            None | Some(CategoriesAction::List) => commands::cmd_categories_list(&cli.db),
            Some(CategoriesAction::Seed) => commands::cmd_categories_seed(&cli.db),
        },
        Commands::Statements { action } => match action {
            None | Some(StatementsAction::List { limit: 20 }) => {
                commands::cmd_statements_list(&cli.db, user, 20)
            }
            Some(StatementsAction::List { limit }) => {
                commands::cmd_statements_list(&cli.db, user, limit)
            }
            Some(StatementsAction::Show { id }) => commands::cmd_statements_show(&cli.db, id),
            Some(StatementsAction::Delete { id }) => {
                commands::cmd_statements_delete(&cli.db, id, user)
            }
        },
        Commands::Ai { action } => match action {
            AiAction::Health => commands::cmd_ai_health().await,
            AiAction::Test {
                merchant,
                description,
            } => commands::cmd_ai_test(&cli.db, &merchant, description.as_deref()).await,
        },
    }
}
