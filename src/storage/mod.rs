//! Storage Layer - the Mendeley SQLite store
//!
//! Opening a library is two phases on two connections:
//! - repair: a read-write connection runs the type-coercion pass in one
//!   transaction, commits, and closes
//! - query: a long-lived read-only session serves every composed query
//!
//! Submodules:
//! - `schema`: declared column types per table
//! - `repair`: boolean-literal repair pass and its report
//! - `sqlite`: the `Library` handle

pub mod repair;
pub mod schema;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod fixture;

pub use repair::{Anomaly, Repair, RepairPolicy, RepairReport, TableReport};
pub use schema::{ColumnSpec, DeclaredType, SchemaSource, TableSchema};
pub use sqlite::{Library, LibraryStats, OpenOptions, repair_database};
