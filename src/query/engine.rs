//! Query engine implementation
//!
//! The two supported read queries:
//! - documents in a named shared collection: Groups → RemoteDocuments → Documents
//! - documents in a named folder: Folders → DocumentFolders → Documents
//!
//! Both keep alive documents only and return each document once. A name
//! matching no row gives an empty result; a name shared by several rows
//! matches all of them.

use super::builder::{ComposedQuery, JoinBuilder};
use crate::Result;
use crate::model::Document;
use crate::relations::{
    Entity, FOLDER_ENTRIES, FOLDER_ENTRY_DOCUMENT, GROUP_ENTRIES, REMOTE_DOCUMENT,
};
use crate::storage::Library;

/// A composed, not yet executed, document query
pub struct DocumentQuery<'a> {
    library: &'a Library,
    query: ComposedQuery,
}

impl<'a> DocumentQuery<'a> {
    pub fn sql(&self) -> &str {
        &self.query.sql
    }

    pub fn composed(&self) -> &ComposedQuery {
        &self.query
    }

    /// Execute and collect; order is whatever the store returns
    pub fn fetch(&self) -> Result<Vec<Document>> {
        self.library.query(&self.query, Document::from_row)
    }

    pub fn count(&self) -> Result<usize> {
        self.library.count(&self.query)
    }
}

/// Query engine over an opened library
pub struct QueryEngine<'a> {
    library: &'a Library,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(library: &'a Library) -> Self {
        Self { library }
    }

    /// Alive documents in every shared collection named `name`
    pub fn documents_from_shared_collection(&self, name: &str) -> Result<DocumentQuery<'a>> {
        let query = JoinBuilder::from(Entity::Group)
            .filter_eq("name", name.to_string())
            .join(GROUP_ENTRIES)?
            .join(REMOTE_DOCUMENT)?
            .alive()?
            .distinct()
            .build();
        Ok(self.document_query(query))
    }

    /// Alive documents in every folder named `name`
    pub fn documents_from_folder(&self, name: &str) -> Result<DocumentQuery<'a>> {
        let query = JoinBuilder::from(Entity::Folder)
            .filter_eq("name", name.to_string())
            .join(FOLDER_ENTRIES)?
            .join(FOLDER_ENTRY_DOCUMENT)?
            .alive()?
            .distinct()
            .build();
        Ok(self.document_query(query))
    }

    /// Every alive document in the library
    pub fn alive_documents(&self) -> Result<DocumentQuery<'a>> {
        let query = JoinBuilder::from(Entity::Document).alive()?.build();
        Ok(self.document_query(query))
    }

    fn document_query(&self, query: ComposedQuery) -> DocumentQuery<'a> {
        DocumentQuery {
            library: self.library,
            query,
        }
    }
}
