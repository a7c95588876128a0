//! Schema inspection
//!
//! SQLite treats declared column types as affinity hints, and Mendeley's
//! tables lean on that. The declared type is still the only evidence of what
//! a column is meant to hold, so the repair pass classifies columns by it.
//!
//! Two sources of declared types:
//! - `PRAGMA table_info` (structured reflection, the default)
//! - tokenizing the `CREATE TABLE` text stored in `sqlite_master`. Best-effort
//!   only: constraint clauses containing commas are not understood and the
//!   fragments they produce end up classified as `VARCHAR`.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where declared column types are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSource {
    #[default]
    Reflect,
    Ddl,
}

impl SchemaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaSource::Reflect => "reflect",
            SchemaSource::Ddl => "ddl",
        }
    }
}

impl FromStr for SchemaSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reflect" | "pragma" => Ok(SchemaSource::Reflect),
            "ddl" | "sql" => Ok(SchemaSource::Ddl),
            _ => Err(Error::Config(format!("Unknown schema source: {}", s))),
        }
    }
}

/// A column's declared type token, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredType(String);

impl DeclaredType {
    /// Catch-all for columns with no usable type token
    pub fn varchar() -> Self {
        Self("VARCHAR".to_string())
    }

    pub fn new(token: &str) -> Self {
        let token = token.trim().to_uppercase();
        if token.is_empty() || token == "NULL" {
            Self::varchar()
        } else {
            Self(token)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `INT...` family or a boolean: values must coerce to an integer
    pub fn is_integer_like(&self) -> bool {
        self.0.starts_with("INT") || self.0 == "BOOL" || self.0 == "BOOLEAN"
    }
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub declared: DeclaredType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self { name: name.into(), declared }
    }
}

/// Columns of one table, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn integer_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.declared.is_integer_like())
    }
}

/// Classify the columns of every user table in the store.
pub fn inspect(conn: &Connection, source: SchemaSource) -> Result<Vec<TableSchema>> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut schemas = Vec::with_capacity(tables.len());
    for (name, ddl) in tables {
        let columns = match source {
            SchemaSource::Reflect => table_columns(conn, &name)?,
            SchemaSource::Ddl => parse_column_defs(ddl.as_deref().unwrap_or_default()),
        };
        tracing::debug!("{}: {} column(s) via {}", name, columns.len(), source.as_str());
        schemas.push(TableSchema { name, columns });
    }
    Ok(schemas)
}

/// Reflect a table's columns. An unknown table yields an empty list.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnSpec>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let declared: Option<String> = row.get(1)?;
            Ok(ColumnSpec::new(name, first_token(declared.as_deref().unwrap_or_default())))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Split the body of a `CREATE TABLE` statement into column specs.
///
/// Each comma-separated fragment contributes one spec: the first token is the
/// name, the second the declared type. Malformed input never errors; the
/// worst case is a column classified as `VARCHAR`.
pub fn parse_column_defs(ddl: &str) -> Vec<ColumnSpec> {
    let (Some(open), Some(close)) = (ddl.find('('), ddl.rfind(')')) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }

    ddl[open + 1..close]
        .split(',')
        .filter_map(|fragment| {
            let mut tokens = fragment.split_whitespace();
            let name = unquote(tokens.next()?);
            let declared = tokens.next().map(DeclaredType::new).unwrap_or_else(DeclaredType::varchar);
            Some(ColumnSpec::new(name, declared))
        })
        .collect()
}

/// Quote an identifier for interpolation into SQL
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn first_token(declared: &str) -> DeclaredType {
    declared
        .split_whitespace()
        .next()
        .map(DeclaredType::new)
        .unwrap_or_else(DeclaredType::varchar)
}

fn unquote(name: &str) -> &str {
    name.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
}
