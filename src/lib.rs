//! # mendeley-shelf - read access to a Mendeley Desktop library
//!
//! Mendeley Desktop keeps its library in SQLite with loosely typed columns:
//! booleans sometimes land as the words `"true"`/`"false"` in integer
//! columns, and no foreign keys are declared.
//!
//! mendeley-shelf provides:
//! - A repair pass that rewrites boolean literals to integers, in place
//! - Declared associations between documents, folders and shared collections
//! - Queries for the alive documents of a named folder or shared collection
//! - A codec between Mendeley's note markup and plain text

pub mod config;
pub mod markup;
pub mod model;
pub mod query;
pub mod relations;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use model::{Document, Named, Record};
pub use query::{DocumentQuery, QueryEngine};
pub use storage::{Library, OpenOptions, RepairPolicy, RepairReport, SchemaSource};

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for library operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("No Mendeley database location known for platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Unrepairable values in integer columns: {0}")]
    Unrepairable(String),
}
