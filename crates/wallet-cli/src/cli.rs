//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Wallet - Track accounts, operations and monthly balances
#[derive(Parser)]
#[command(name = "wallet")]
#[command(about = "Self-hosted personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to $WALLET_DB, then the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    ///
    /// Requires WALLET_SECRET_KEY for signing access tokens. Optional:
    /// WALLET_TOKEN_TTL (seconds) and WALLET_ALLOWED_ORIGINS (comma separated).
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// List or add accounts of a user
    Accounts {
        /// Owner login
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// List or add categories of a user
    Categories {
        /// Owner login
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Bulk import operations from a CSV file
    ///
    /// Rows: created_on,amount,category,description (no header). Negative
    /// amounts are expenses. Category is a numeric key or a name; unknown
    /// names are created.
    Import {
        /// Owner login
        #[arg(short, long)]
        user: String,

        /// Account ID to import into
        #[arg(short, long)]
        account: i64,

        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the monthly balance of an account
    Balance {
        /// Owner login
        #[arg(short, long)]
        user: String,

        /// Account ID
        #[arg(short, long)]
        account: i64,

        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Register a user
    Add {
        /// Login name
        login: String,

        /// Password (falls back to WALLET_PASSWORD)
        #[arg(long)]
        password: Option<String>,
    },

    /// List users
    List,
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// Register an account
    Add {
        /// Account name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Category type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        category_type: String,
    },
}
