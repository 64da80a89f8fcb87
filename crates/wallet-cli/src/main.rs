//! Wallet CLI - Personal finance tracker
//!
//! Usage:
//!   wallet init                                   Initialize database
//!   wallet users add alice                        Register a user
//!   wallet import --user alice --account 1 --file ops.csv
//!   wallet balance --user alice --account 1       Monthly balance
//!   wallet serve --port 3000                      Start web server

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

    let db_path = commands::resolve_db_path(cli.db.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Serve { port, host } => commands::cmd_serve(&db_path, &host, port).await,
        Commands::Users { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                UsersAction::Add { login, password } => {
                    commands::cmd_users_add(&db, &login, password.as_deref()).map(|_| ())
                }
                UsersAction::List => commands::cmd_users_list(&db),
            }
        }
        Commands::Accounts { user, action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                Some(AccountsAction::Add { name }) => {
                    commands::cmd_accounts_add(&db, &user, &name).map(|_| ())
                }
                None => commands::cmd_accounts_list(&db, &user),
            }
        }
        Commands::Categories { user, action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                Some(CategoriesAction::Add {
                    name,
                    category_type,
                }) => commands::cmd_categories_add(&db, &user, &name, &category_type).map(|_| ()),
                None => commands::cmd_categories_list(&db, &user),
            }
        }
        Commands::Import {
            user,
            account,
            file,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_import(&db, &user, account, &file).map(|_| ())
        }
        Commands::Balance {
            user,
            account,
            month,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_balance(&db, &user, account, month.as_deref()).map(|_| ())
        }
    }
}
