//! Query layer - joins over declared associations

pub mod builder;
pub mod engine;

pub use builder::{ComposedQuery, JoinBuilder};
pub use engine::{DocumentQuery, QueryEngine};
