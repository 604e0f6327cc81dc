//! Chat store core library
//!
//! This crate owns the persistent data model for a chat application:
//! users, their conversations with an AI assistant, message history,
//! attached files, OAuth-linked identities, and GitHub App installation
//! metadata. Data lives in SQLite; the schema (including every foreign
//! key, cascade edge, and closed enum set) is applied through versioned
//! migrations and enforced by the engine itself.
//!
//! - `model`: typed records and closed enums for each table
//! - `storage`: connection pooling and schema migrations
//! - `repository`: insert/query/delete operations per entity
//! - `error`: constraint-violation taxonomy surfaced to callers

pub mod error;
pub mod model;
pub mod repository;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::storage::{Database, DatabaseConfig};
}
