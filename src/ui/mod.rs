//! Terminal output for the `shelf` binary

pub mod output;
pub mod table;
pub mod theme;

pub use output::{empty, error, header, info, section, success, warn};
pub use table::{documents_table, named_table, repair_table};
pub use theme::palette;
