//! Relationship binding
//!
//! Mendeley's catalog declares no foreign keys. The joins the query layer
//! walks are declared here as a static table of key pairs; [`Relations::bind`]
//! checks them once against the reflected schema when a library is opened.
//!
//! Associations:
//! - `contributors`: Documents.id → DocumentContributors.documentId (one-to-many)
//! - `url`: Documents.id → DocumentUrls.documentId (one-to-one)
//! - `tags`: Documents.id → DocumentTags.documentId (one-to-many)
//! - Folders.id → DocumentFolders.folderId, DocumentFolders.documentId → Documents.id
//! - Groups.id → RemoteDocuments.groupId, RemoteDocuments.documentId → Documents.id

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::model::Record;
use crate::storage::schema::{self, quote_ident};
use crate::{Error, Result};

/// Tables the query layer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Entity {
    Document,
    Group,
    Folder,
    RemoteDocument,
    DocumentFolder,
    DocumentContributor,
    DocumentUrl,
    DocumentTag,
}

impl Entity {
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Document => "Documents",
            Entity::Group => "Groups",
            Entity::Folder => "Folders",
            Entity::RemoteDocument => "RemoteDocuments",
            Entity::DocumentFolder => "DocumentFolders",
            Entity::DocumentContributor => "DocumentContributors",
            Entity::DocumentUrl => "DocumentUrls",
            Entity::DocumentTag => "DocumentTags",
        }
    }

    pub fn all() -> &'static [Entity] {
        &[
            Entity::Document,
            Entity::Group,
            Entity::Folder,
            Entity::RemoteDocument,
            Entity::DocumentFolder,
            Entity::DocumentContributor,
            Entity::DocumentUrl,
            Entity::DocumentTag,
        ]
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
}

/// A join key pair: `from.from_key = to.to_key`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Association {
    pub name: &'static str,
    pub from: Entity,
    pub from_key: &'static str,
    pub to: Entity,
    pub to_key: &'static str,
    pub cardinality: Cardinality,
}

impl Association {
    /// `ON` condition joining `to_alias` onto `from_alias`
    pub fn on_clause(&self, from_alias: &str, to_alias: &str) -> String {
        format!(
            "{}.{} = {}.{}",
            to_alias,
            quote_ident(self.to_key),
            from_alias,
            quote_ident(self.from_key)
        )
    }
}

pub const CONTRIBUTORS: Association = Association {
    name: "contributors",
    from: Entity::Document,
    from_key: "id",
    to: Entity::DocumentContributor,
    to_key: "documentId",
    cardinality: Cardinality::OneToMany,
};

pub const URL: Association = Association {
    name: "url",
    from: Entity::Document,
    from_key: "id",
    to: Entity::DocumentUrl,
    to_key: "documentId",
    cardinality: Cardinality::OneToOne,
};

pub const TAGS: Association = Association {
    name: "tags",
    from: Entity::Document,
    from_key: "id",
    to: Entity::DocumentTag,
    to_key: "documentId",
    cardinality: Cardinality::OneToMany,
};

pub const FOLDER_ENTRIES: Association = Association {
    name: "folder_entries",
    from: Entity::Folder,
    from_key: "id",
    to: Entity::DocumentFolder,
    to_key: "folderId",
    cardinality: Cardinality::OneToMany,
};

pub const FOLDER_ENTRY_DOCUMENT: Association = Association {
    name: "folder_entry_document",
    from: Entity::DocumentFolder,
    from_key: "documentId",
    to: Entity::Document,
    to_key: "id",
    cardinality: Cardinality::ManyToOne,
};

pub const GROUP_ENTRIES: Association = Association {
    name: "group_entries",
    from: Entity::Group,
    from_key: "id",
    to: Entity::RemoteDocument,
    to_key: "groupId",
    cardinality: Cardinality::OneToMany,
};

pub const REMOTE_DOCUMENT: Association = Association {
    name: "remote_document",
    from: Entity::RemoteDocument,
    from_key: "documentId",
    to: Entity::Document,
    to_key: "id",
    cardinality: Cardinality::ManyToOne,
};

pub const ASSOCIATIONS: &[Association] = &[
    CONTRIBUTORS,
    URL,
    TAGS,
    FOLDER_ENTRIES,
    FOLDER_ENTRY_DOCUMENT,
    GROUP_ENTRIES,
    REMOTE_DOCUMENT,
];

/// Look up a declared association by name
pub fn association(name: &str) -> Option<&'static Association> {
    ASSOCIATIONS.iter().find(|a| a.name == name)
}

/// Conjunction of "flag is not set" over document lifecycle flags.
///
/// NULL counts as unset. Rendered into SQL and evaluated over records from
/// the same flag list so both sides agree.
#[derive(Debug, Clone, Copy)]
pub struct FlagsUnset {
    pub flags: &'static [&'static str],
}

impl FlagsUnset {
    pub fn sql(&self, alias: &str) -> String {
        self.flags
            .iter()
            .map(|flag| format!("IFNULL({}.{}, 0) != 1", alias, quote_ident(flag)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.flags.iter().all(|flag| !record.flag(flag))
    }
}

/// A document is alive unless it is reference-only or pending deletion
pub const ALIVE: FlagsUnset = FlagsUnset {
    flags: &["onlyReference", "deletionPending"],
};

/// Reflected columns of every bound table.
#[derive(Debug, Clone)]
pub struct Relations {
    columns: HashMap<Entity, Vec<String>>,
}

impl Relations {
    /// Reflect every entity's columns and check the declared keys exist.
    /// Reads only the catalog.
    pub fn bind(conn: &Connection) -> Result<Self> {
        let mut columns = HashMap::new();
        for entity in Entity::all() {
            let names: Vec<String> = schema::table_columns(conn, entity.table())?
                .into_iter()
                .map(|c| c.name)
                .collect();
            if names.is_empty() {
                return Err(Error::Binding(format!("table {} not found", entity)));
            }
            columns.insert(*entity, names);
        }

        let relations = Self { columns };
        for assoc in ASSOCIATIONS {
            relations.require(assoc.from, assoc.from_key)?;
            relations.require(assoc.to, assoc.to_key)?;
        }
        for flag in ALIVE.flags {
            relations.require(Entity::Document, flag)?;
        }

        tracing::debug!("Bound {} association(s) over {} table(s)", ASSOCIATIONS.len(), relations.columns.len());
        Ok(relations)
    }

    pub fn columns(&self, entity: Entity) -> &[String] {
        self.columns.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_column(&self, entity: Entity, column: &str) -> bool {
        self.columns(entity).iter().any(|c| c == column)
    }

    fn require(&self, entity: Entity, column: &str) -> Result<()> {
        if self.has_column(entity, column) {
            Ok(())
        } else {
            Err(Error::Binding(format!("column {}.{} not found", entity, column)))
        }
    }
}
