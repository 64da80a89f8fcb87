//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod auth;
pub mod categories;
pub mod operations;

// Re-export all handlers for use in router
pub use accounts::*;
pub use auth::*;
pub use categories::*;
pub use operations::*;
