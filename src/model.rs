//! Row types read out of the Mendeley store
//!
//! Mendeley's tables are wide and vary between desktop releases, so rows are
//! carried as a [`Record`] (column name → JSON value) and the few columns the
//! query layer relies on are lifted into typed fields.

use rusqlite::{Row, Statement};
use rusqlite::types::ValueRef;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::relations::ALIVE;

/// One row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Read every column of a result row
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let stmt: &Statement<'_> = row.as_ref();
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut fields = Map::new();
        for (idx, name) in names.into_iter().enumerate() {
            fields.insert(name, json_value(row.get_ref(idx)?));
        }
        Ok(Self(fields))
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// A flag is set when it compares equal to 1 under SQLite's rules for
    /// values without affinity: integer 1 or real 1.0. Text and NULL never are.
    pub fn flag(&self, column: &str) -> bool {
        match self.get(column) {
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            _ => false,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A row of the `Documents` table.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: Option<String>,
    /// Mendeley's publication type (`JournalArticle`, `Book`, ...)
    pub kind: Option<String>,
    pub year: Option<i64>,
    /// Every column of the row, including the ones lifted above
    pub fields: Record,
}

impl Document {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Self::from_record(Record::from_row(row)?)
            .ok_or_else(|| rusqlite::Error::InvalidColumnName("id".to_string()))
    }

    /// Lift a generic record into a document; `None` when it has no integer id.
    pub fn from_record(fields: Record) -> Option<Self> {
        let id = fields.get_i64("id")?;
        Some(Self {
            id,
            title: fields.get_str("title").map(str::to_string),
            kind: fields.get_str("type").map(str::to_string),
            year: fields.get_i64("year"),
            fields,
        })
    }

    pub fn only_reference(&self) -> bool {
        self.fields.flag("onlyReference")
    }

    pub fn deletion_pending(&self) -> bool {
        self.fields.flag("deletionPending")
    }

    /// Same predicate the query layer renders into SQL
    pub fn is_alive(&self) -> bool {
        ALIVE.matches(&self.fields)
    }
}

/// A named container: a `Groups` (shared collection) or `Folders` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Named {
    pub id: i64,
    pub name: String,
}

impl Named {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        })
    }
}

/// Render a blob the way SQLite spells blob literals
pub(crate) fn blob_literal(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!("X'{hex}'")
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(blob_literal(b)),
    }
}
