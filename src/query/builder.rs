//! Typed join builder
//!
//! Walks declared [`Association`]s from a starting entity and renders one
//! `SELECT` over the last entity reached. Each step gets its own alias
//! (`t0`, `t1`, ...), so filters always apply to the entity current at the
//! time they are added.

use rusqlite::types::Value;

use crate::relations::{ALIVE, Association, Entity};
use crate::storage::schema::quote_ident;
use crate::{Error, Result};

/// Rendered SQL and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct JoinBuilder {
    start: Entity,
    steps: Vec<Association>,
    conditions: Vec<String>,
    params: Vec<Value>,
    distinct: bool,
}

impl JoinBuilder {
    pub fn from(start: Entity) -> Self {
        Self {
            start,
            steps: Vec::new(),
            conditions: Vec::new(),
            params: Vec::new(),
            distinct: false,
        }
    }

    /// Entity the next filter or join applies to
    pub fn current(&self) -> Entity {
        self.steps.last().map(|a| a.to).unwrap_or(self.start)
    }

    fn alias(step: usize) -> String {
        format!("t{}", step)
    }

    fn current_alias(&self) -> String {
        Self::alias(self.steps.len())
    }

    /// `current.column = value`
    pub fn filter_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        let condition = format!(
            "{}.{} = ?{}",
            self.current_alias(),
            quote_ident(column),
            self.params.len()
        );
        self.conditions.push(condition);
        self
    }

    /// Follow an association out of the current entity.
    pub fn join(mut self, assoc: Association) -> Result<Self> {
        if assoc.from != self.current() {
            return Err(Error::Binding(format!(
                "association {} starts at {}, not {}",
                assoc.name,
                assoc.from,
                self.current()
            )));
        }
        self.steps.push(assoc);
        Ok(self)
    }

    /// Keep only alive documents; the current entity must be Documents.
    pub fn alive(mut self) -> Result<Self> {
        if self.current() != Entity::Document {
            return Err(Error::Binding(format!(
                "alive filter applies to {}, not {}",
                Entity::Document,
                self.current()
            )));
        }
        let condition = ALIVE.sql(&self.current_alias());
        self.conditions.push(condition);
        Ok(self)
    }

    /// Collapse rows reached along more than one path
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn build(&self) -> ComposedQuery {
        let mut sql = format!(
            "SELECT {}{}.* FROM {} AS {}",
            if self.distinct { "DISTINCT " } else { "" },
            self.current_alias(),
            quote_ident(self.start.table()),
            Self::alias(0)
        );

        for (idx, assoc) in self.steps.iter().enumerate() {
            let from_alias = Self::alias(idx);
            let to_alias = Self::alias(idx + 1);
            sql.push_str(&format!(
                " JOIN {} AS {} ON {}",
                quote_ident(assoc.to.table()),
                to_alias,
                assoc.on_clause(&from_alias, &to_alias)
            ));
        }

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        ComposedQuery {
            sql,
            params: self.params.clone(),
        }
    }
}
