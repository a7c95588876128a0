//! Type-coercion repair pass
//!
//! Mendeley Desktop stores some booleans as the words `"true"`/`"false"` in
//! columns declared `INTEGER`/`BOOL`. SQLite accepts that; strict consumers
//! do not. The pass scans every integer-like column, rewrites the two known
//! literals to `1`/`0`, and reports every other value it cannot coerce.
//!
//! All updates run in one transaction. Re-running the pass over repaired
//! data finds nothing to do.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use super::schema::{TableSchema, quote_ident};
use crate::model::blob_literal;
use crate::{Error, Result};

/// Literals rewritten to their integer equivalent
pub const BOOLEAN_LITERALS: &[(&str, i64)] = &[("true", 1), ("false", 0)];

/// What to do when integer-like columns hold values no literal maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairPolicy {
    /// Commit the boolean repairs and report the rest
    #[default]
    Lenient,
    /// Roll the whole pass back and fail
    Strict,
}

impl FromStr for RepairPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(RepairPolicy::Lenient),
            "strict" => Ok(RepairPolicy::Strict),
            _ => Err(Error::Config(format!("Unknown repair policy: {}", s))),
        }
    }
}

/// One issued update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    pub column: String,
    pub literal: String,
    pub replacement: i64,
    pub rows_updated: usize,
}

/// Distinct values in an integer-like column that were left alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub table: String,
    pub column: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows_scanned: usize,
    pub repairs: Vec<Repair>,
    pub anomalies: Vec<Anomaly>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }
}

/// Outcome of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub tables: Vec<TableReport>,
}

impl RepairReport {
    /// No unrepairable values anywhere
    pub fn is_clean(&self) -> bool {
        self.unrepairable().next().is_none()
    }

    pub fn unrepairable(&self) -> impl Iterator<Item = &Anomaly> {
        self.tables.iter().flat_map(|t| t.anomalies.iter())
    }

    pub fn repairs(&self) -> impl Iterator<Item = (&str, &Repair)> {
        self.tables
            .iter()
            .flat_map(|t| t.repairs.iter().map(move |r| (t.table.as_str(), r)))
    }

    pub fn rows_updated(&self) -> usize {
        self.repairs().map(|(_, r)| r.rows_updated).sum()
    }

    pub fn rows_scanned(&self) -> usize {
        self.tables.iter().map(|t| t.rows_scanned).sum()
    }
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repair Report:")?;
        writeln!(f, "  Tables: {}", self.tables.len())?;
        writeln!(f, "  Rows scanned: {}", self.rows_scanned())?;
        writeln!(f, "  Rows updated: {}", self.rows_updated())?;
        write!(f, "  Unrepairable columns: {}", self.unrepairable().count())
    }
}

/// Would SQLite's value survive an integer conversion?
///
/// NULL is never an offender. Reals convert by truncation; text and blobs
/// must hold a decimal integer, surrounding whitespace allowed.
pub fn coerces_to_integer(value: ValueRef<'_>) -> bool {
    match value {
        ValueRef::Null | ValueRef::Integer(_) => true,
        ValueRef::Real(f) => f.is_finite(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => std::str::from_utf8(bytes)
            .map(|s| s.trim().parse::<i64>().is_ok())
            .unwrap_or(false),
    }
}

pub fn boolean_replacement(literal: &str) -> Option<i64> {
    BOOLEAN_LITERALS
        .iter()
        .find(|(word, _)| *word == literal)
        .map(|(_, value)| *value)
}

/// Scan and repair every table, committing once at the end.
pub fn run(conn: &mut Connection, schemas: &[TableSchema], policy: RepairPolicy) -> Result<RepairReport> {
    let tx = conn.transaction()?;

    let mut report = RepairReport::default();
    for schema in schemas {
        report.tables.push(repair_table(&tx, schema)?);
    }

    if policy == RepairPolicy::Strict && !report.is_clean() {
        tx.rollback()?;
        let summary: Vec<String> = report
            .unrepairable()
            .map(|a| format!("{}.{} {:?}", a.table, a.column, a.values))
            .collect();
        return Err(Error::Unrepairable(summary.join(", ")));
    }

    tx.commit()?;
    tracing::info!(
        "Repair pass: {} table(s), {} row(s) updated, {} unrepairable column(s)",
        report.tables.len(),
        report.rows_updated(),
        report.unrepairable().count()
    );
    Ok(report)
}

fn repair_table(conn: &Connection, schema: &TableSchema) -> Result<TableReport> {
    let mut report = TableReport::new(&schema.name);
    if schema.integer_columns().next().is_none() {
        return Ok(report);
    }

    let table = quote_ident(&schema.name);
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", table))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    // Declared columns that exist in the result set; DDL junk falls out here
    let targets: Vec<usize> = schema
        .integer_columns()
        .filter_map(|c| names.iter().position(|n| n.eq_ignore_ascii_case(&c.name)))
        .collect();

    let mut offending: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        report.rows_scanned += 1;
        for &idx in &targets {
            let value = row.get_ref(idx)?;
            if !coerces_to_integer(value) {
                offending.entry(idx).or_default().insert(describe(value));
            }
        }
    }
    drop(rows);
    drop(stmt);

    tracing::debug!("{}: scanned {} row(s)", schema.name, report.rows_scanned);

    for (idx, values) in offending {
        let column = &names[idx];
        let quoted = quote_ident(column);
        let mut unrepairable = Vec::new();

        for value in values {
            let Some(replacement) = boolean_replacement(&value) else {
                unrepairable.push(value);
                continue;
            };
            let sql = format!("UPDATE {table} SET {quoted} = ?1 WHERE {quoted} = ?2");
            tracing::debug!("{} [{} -> {}]", sql, value, replacement);
            let rows_updated = conn.execute(&sql, params![replacement, value])?;
            report.repairs.push(Repair {
                column: column.clone(),
                literal: value,
                replacement,
                rows_updated,
            });
        }

        if !unrepairable.is_empty() {
            tracing::warn!("{}.{} holds non-integer values: {:?}", schema.name, column, unrepairable);
            report.anomalies.push(Anomaly {
                table: schema.name.clone(),
                column: column.clone(),
                values: unrepairable,
            });
        }
    }

    Ok(report)
}

fn describe(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => blob_literal(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{self, SchemaSource};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE Documents (id INTEGER PRIMARY KEY, title VARCHAR, onlyReference BOOL, deletionPending BOOL, favourite INTEGER);
            INSERT INTO Documents VALUES (1, 'a', 'false', 'true', 0);
            INSERT INTO Documents VALUES (2, 'b', 'true', 'false', 'yes');
            INSERT INTO Documents VALUES (3, 'true', 0, NULL, 2.0);
            INSERT INTO Documents VALUES (4, 'd', 'false', 0, ' 7 ');
            "#,
        )
        .unwrap();
        conn
    }

    fn pass(conn: &mut Connection, policy: RepairPolicy) -> Result<RepairReport> {
        let schemas = schema::inspect(conn, SchemaSource::Reflect).unwrap();
        run(conn, &schemas, policy)
    }

    fn column(conn: &Connection, name: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT quote({}) FROM Documents ORDER BY id", name))
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_coerces_to_integer() {
        assert!(coerces_to_integer(ValueRef::Null));
        assert!(coerces_to_integer(ValueRef::Integer(4)));
        assert!(coerces_to_integer(ValueRef::Real(1.5)));
        assert!(!coerces_to_integer(ValueRef::Real(f64::NAN)));
        assert!(coerces_to_integer(ValueRef::Text(b" -12 ")));
        assert!(!coerces_to_integer(ValueRef::Text(b"true")));
        assert!(!coerces_to_integer(ValueRef::Text(b"1.0")));
        assert!(!coerces_to_integer(ValueRef::Blob(&[0xFF])));
    }

    #[test]
    fn test_boolean_literals_rewritten() {
        let mut conn = store();
        let report = pass(&mut conn, RepairPolicy::Lenient).unwrap();

        assert_eq!(column(&conn, "onlyReference"), ["0", "1", "0", "0"]);
        assert_eq!(column(&conn, "deletionPending"), ["1", "0", "NULL", "0"]);
        // VARCHAR columns are never touched
        assert_eq!(column(&conn, "title"), ["'a'", "'b'", "'true'", "'d'"]);

        let only_reference: usize = report
            .repairs()
            .filter(|(_, r)| r.column == "onlyReference")
            .map(|(_, r)| r.rows_updated)
            .sum();
        assert_eq!(only_reference, 3);
        assert_eq!(report.rows_updated(), 5);
        assert_eq!(report.rows_scanned(), 4);
    }

    #[test]
    fn test_unknown_values_reported_not_modified() {
        let mut conn = store();
        let report = pass(&mut conn, RepairPolicy::Lenient).unwrap();

        assert!(!report.is_clean());
        let anomalies: Vec<_> = report.unrepairable().collect();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].table, "Documents");
        assert_eq!(anomalies[0].column, "favourite");
        assert_eq!(anomalies[0].values, ["yes"]);

        assert_eq!(column(&conn, "favourite")[1], "'yes'");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut conn = store();
        let first = pass(&mut conn, RepairPolicy::Lenient).unwrap();
        let snapshot: Vec<_> = ["onlyReference", "deletionPending", "favourite"]
            .iter()
            .map(|c| column(&conn, c))
            .collect();

        let second = pass(&mut conn, RepairPolicy::Lenient).unwrap();
        let again: Vec<_> = ["onlyReference", "deletionPending", "favourite"]
            .iter()
            .map(|c| column(&conn, c))
            .collect();

        assert_eq!(snapshot, again);
        assert_eq!(second.rows_updated(), 0);
        assert_eq!(
            first.unrepairable().collect::<Vec<_>>(),
            second.unrepairable().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_strict_policy_rolls_back() {
        let mut conn = store();
        let err = pass(&mut conn, RepairPolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::Unrepairable(ref s) if s.contains("favourite")));

        // Nothing committed
        assert_eq!(column(&conn, "onlyReference"), ["'false'", "'true'", "0", "'false'"]);
    }

    #[test]
    fn test_strict_policy_passes_clean_store() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Folders (id INTEGER PRIMARY KEY, name VARCHAR, expanded BOOL);
             INSERT INTO Folders VALUES (1, 'x', 'true');",
        )
        .unwrap();
        let report = pass(&mut conn, RepairPolicy::Strict).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.rows_updated(), 1);
    }

    #[test]
    fn test_ddl_source_ignores_constraint_fragments() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE DocumentFolders (documentId INTEGER NOT NULL, folderId INTEGER NOT NULL, PRIMARY KEY (documentId, folderId));
             INSERT INTO DocumentFolders VALUES (1, 'true');",
        )
        .unwrap();
        let schemas = schema::inspect(&conn, SchemaSource::Ddl).unwrap();
        let report = run(&mut conn, &schemas, RepairPolicy::Lenient).unwrap();
        assert_eq!(report.rows_updated(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("STRICT".parse::<RepairPolicy>().unwrap(), RepairPolicy::Strict);
        assert!("maybe".parse::<RepairPolicy>().is_err());
    }
}
