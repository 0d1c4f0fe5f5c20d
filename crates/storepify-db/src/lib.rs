//! Database access for Storepify
//!
//! Queries are composed with `sea-query`, rendered for SQLite and executed
//! through an `sqlx` pool. Rows can be read either into typed models
//! (`sqlx::FromRow`) or into dynamic [`Record`]s, which the admin uses to
//! list arbitrary tables. Every statement executed inside a
//! [`capture::capture`] scope is recorded for the debug toolbar.

pub mod capture;
pub mod connection;
pub mod error;
pub mod record;

pub use capture::{CapturedQuery, QueryLog};
pub use connection::{Database, DbTransaction};
pub use error::{DbError, DbResult};
pub use record::{Record, row_to_record};

pub use sqlx::migrate::Migrator;
