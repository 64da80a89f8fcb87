//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, find_user)
//! - `users` - User registration and listing
//! - `accounts` - Account listing, registration and balances
//! - `categories` - Category listing and creation
//! - `import` - Bulk CSV import of operations
//! - `serve` - Web server command

pub mod accounts;
pub mod categories;
pub mod core;
pub mod import;
pub mod serve;
pub mod users;

// Re-export command functions for main.rs
pub use accounts::*;
pub use categories::*;
pub use core::*;
pub use import::*;
pub use serve::*;
pub use users::*;
