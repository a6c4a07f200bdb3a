//! Database layer for data persistence and access.
//!
//! ```text
//! api::handlers  ->  db::handlers (repositories)  ->  db::models  ->  PostgreSQL
//! ```
//!
//! - [`handlers`]: repository implementations
//! - [`models`]: request and response records for each table
//! - [`errors`]: database error classification
//!
//! Schema changes live in `migrations/` as reversible pairs and are applied through
//! [`crate::migrate`].

pub mod errors;
pub mod handlers;
pub mod models;
