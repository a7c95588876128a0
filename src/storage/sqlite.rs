//! Library handle over a Mendeley SQLite file

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Row, params_from_iter};

use super::repair::{self, RepairPolicy, RepairReport};
use super::schema::{self, SchemaSource, quote_ident};
use crate::config;
use crate::model::{Document, Named, Record};
use crate::query::{ComposedQuery, JoinBuilder};
use crate::relations::{self, ALIVE, Association, Entity, Relations};
use crate::{Error, Result};

/// How a library is opened
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub policy: RepairPolicy,
    pub schema_source: SchemaSource,
    /// Wait this long on a locked database (Mendeley Desktop may be running)
    pub busy_timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            policy: RepairPolicy::default(),
            schema_source: SchemaSource::default(),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Run the repair pass on its own read-write connection.
///
/// The connection is closed before returning; callers open the query
/// session afterwards.
pub fn repair_database(path: &Path, options: &OpenOptions) -> Result<RepairReport> {
    ensure_exists(path)?;

    let mut conn = Connection::open(path)?;
    conn.busy_timeout(options.busy_timeout)?;

    let schemas = schema::inspect(&conn, options.schema_source)?;
    let report = repair::run(&mut conn, &schemas, options.policy)?;

    conn.close().map_err(|(_, e)| e)?;
    Ok(report)
}

/// Read-only query session plus the relationships bound over it.
pub struct Library {
    conn: Connection,
    relations: Relations,
    path: PathBuf,
}

impl Library {
    /// Repair the file, then open the query session on it.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<(Self, RepairReport)> {
        let report = repair_database(path, options)?;
        let library = Self::open_repaired(path, options)?;
        Ok((library, report))
    }

    /// Resolve the account's database path for this OS, then [`Library::open`].
    pub fn from_account(account: &str, options: &OpenOptions) -> Result<(Self, RepairReport)> {
        let path = config::account_database_path(account)?;
        Self::open(&path, options)
    }

    /// Open the query session without a repair pass.
    ///
    /// Queries assume repaired data; use this only on a file that has
    /// already been through [`repair_database`].
    pub fn open_repaired(path: &Path, options: &OpenOptions) -> Result<Self> {
        ensure_exists(path)?;

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.pragma_update(None, "query_only", "ON")?;

        let relations = Relations::bind(&conn)?;
        tracing::info!("Opened library {}", path.display());

        Ok(Self {
            conn,
            relations,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// Execute a composed query, mapping every row.
    pub fn query<T, F>(&self, query: &ComposedQuery, f: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        tracing::debug!("{}", query.sql);
        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), f)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }

    pub fn count(&self, query: &ComposedQuery) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM ({})", query.sql);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(query.params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Named containers ==========

    /// All shared collections (Groups rows)
    pub fn groups(&self) -> Result<Vec<Named>> {
        self.named(Entity::Group)
    }

    /// All local folders
    pub fn folders(&self) -> Result<Vec<Named>> {
        self.named(Entity::Folder)
    }

    fn named(&self, entity: Entity) -> Result<Vec<Named>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name, id", quote_ident(entity.table()));
        let mut stmt = self.conn.prepare(&sql)?;
        let named = stmt
            .query_map([], Named::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(named)
    }

    // ========== Document attachments ==========

    /// Rows reached from a document over a Document-rooted association
    pub fn attachments(&self, doc: &Document, assoc: Association) -> Result<Vec<Record>> {
        let query = JoinBuilder::from(Entity::Document)
            .filter_eq(assoc.from_key, doc.fields.get_i64(assoc.from_key).unwrap_or(doc.id))
            .join(assoc)?
            .build();
        self.query(&query, Record::from_row)
    }

    pub fn contributors(&self, doc: &Document) -> Result<Vec<Record>> {
        self.attachments(doc, relations::CONTRIBUTORS)
    }

    pub fn url(&self, doc: &Document) -> Result<Option<Record>> {
        Ok(self.attachments(doc, relations::URL)?.into_iter().next())
    }

    pub fn tags(&self, doc: &Document) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self
            .attachments(doc, relations::TAGS)?
            .iter()
            .filter_map(|r| r.get_str("tag").map(str::to_string))
            .collect();
        tags.sort();
        Ok(tags)
    }

    /// Get library statistics
    pub fn stats(&self) -> Result<LibraryStats> {
        let documents = self.count_table(Entity::Document)?;
        let alive: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} AS d WHERE {}",
                quote_ident(Entity::Document.table()),
                ALIVE.sql("d")
            ),
            [],
            |row| row.get(0),
        )?;

        Ok(LibraryStats {
            documents,
            alive: alive as usize,
            folders: self.count_table(Entity::Folder)?,
            groups: self.count_table(Entity::Group)?,
        })
    }

    fn count_table(&self, entity: Entity) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(entity.table()));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::DatabaseNotFound(path.display().to_string()))
    }
}

/// Library statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct LibraryStats {
    pub documents: usize,
    pub alive: usize,
    pub folders: usize,
    pub groups: usize,
}

impl fmt::Display for LibraryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Library Statistics:")?;
        writeln!(f, "  Documents: {}", self.documents)?;
        writeln!(f, "  Alive: {}", self.alive)?;
        writeln!(f, "  Folders: {}", self.folders)?;
        write!(f, "  Shared collections: {}", self.groups)
    }
}
