//! A small Mendeley-shaped library for tests
//!
//! Folders: 1 Thesis, 2 Reading, 3 Thesis (duplicate name), 4 Empty
//! Groups: 1 Lab Shared, 2 Other Lab
//!
//! | doc | flags (onlyReference, deletionPending) | membership                 |
//! |-----|----------------------------------------|----------------------------|
//! | 1   | 0, 0                                   | Thesis#1                   |
//! | 2   | 0, 'true'                              | Thesis#1                   |
//! | 3   | 1, 0                                   | Thesis#1                   |
//! | 4   | NULL, NULL                             | Thesis#3                   |
//! | 5   | 'false', 'false'                       | Reading, Lab Shared        |
//! | 6   | 0, 0                                   | Thesis#1, Thesis#3         |
//! | 7   | 0, 0                                   | Lab Shared                 |
//! | 8   | 0, 0                                   | Other Lab                  |
//! | 9   | 0, 0, favourite = 'yes'                | Reading                    |
//! | 10  | 'true', 0                              | Lab Shared                 |

use std::path::PathBuf;

use rusqlite::Connection;
use tempfile::TempDir;

pub const SCHEMA: &str = r#"
CREATE TABLE Documents (id INTEGER PRIMARY KEY AUTOINCREMENT, type VARCHAR NOT NULL, title VARCHAR, year INTEGER, onlyReference BOOL, deletionPending BOOL, favourite BOOL);
CREATE TABLE Folders (id INTEGER PRIMARY KEY AUTOINCREMENT, uuid VARCHAR, name VARCHAR NOT NULL, parentId INTEGER);
CREATE TABLE DocumentFolders (documentId INTEGER NOT NULL, folderId INTEGER NOT NULL, status VARCHAR, PRIMARY KEY (documentId, folderId));
CREATE TABLE Groups (id INTEGER PRIMARY KEY AUTOINCREMENT, remoteId INTEGER, name VARCHAR, isPrivate BOOL);
CREATE TABLE RemoteDocuments (documentId INTEGER NOT NULL, remoteId INTEGER, groupId INTEGER, PRIMARY KEY (documentId));
CREATE TABLE DocumentContributors (id INTEGER PRIMARY KEY AUTOINCREMENT, documentId INTEGER NOT NULL, contribution VARCHAR NOT NULL, firstNames VARCHAR, lastName VARCHAR NOT NULL);
CREATE TABLE DocumentUrls (documentId INTEGER NOT NULL, position INTEGER NOT NULL, url VARCHAR NOT NULL, PRIMARY KEY (documentId, position));
CREATE TABLE DocumentTags (documentId INTEGER NOT NULL, tag VARCHAR NOT NULL, PRIMARY KEY (documentId, tag));
"#;

pub const SEED: &str = r#"
INSERT INTO Folders VALUES (1, 'f1', 'Thesis', NULL);
INSERT INTO Folders VALUES (2, 'f2', 'Reading', NULL);
INSERT INTO Folders VALUES (3, 'f3', 'Thesis', 2);
INSERT INTO Folders VALUES (4, 'f4', 'Empty', NULL);

INSERT INTO Groups VALUES (1, 501, 'Lab Shared', 'false');
INSERT INTO Groups VALUES (2, 502, 'Other Lab', 'true');

INSERT INTO Documents VALUES (1, 'JournalArticle', 'Alive in thesis', 2009, 0, 0, 0);
INSERT INTO Documents VALUES (2, 'JournalArticle', 'Pending deletion', 2010, 0, 'true', 0);
INSERT INTO Documents VALUES (3, 'Book', 'Reference only', 2001, 1, 0, 0);
INSERT INTO Documents VALUES (4, 'Book', 'Null flags', NULL, NULL, NULL, NULL);
INSERT INTO Documents VALUES (5, 'JournalArticle', 'Reading and shared', 2012, 'false', 'false', 'true');
INSERT INTO Documents VALUES (6, 'Thesis', 'In both thesis folders', 2015, 0, 0, 0);
INSERT INTO Documents VALUES (7, 'JournalArticle', 'Shared only', 2016, 0, 0, 0);
INSERT INTO Documents VALUES (8, 'JournalArticle', 'Other lab paper', 2017, 0, 0, 0);
INSERT INTO Documents VALUES (9, 'Report', 'Odd favourite', 2018, 0, 0, 'yes');
INSERT INTO Documents VALUES (10, 'Report', 'Shared reference', 2019, 'true', 0, 0);

INSERT INTO DocumentFolders VALUES (1, 1, NULL);
INSERT INTO DocumentFolders VALUES (2, 1, NULL);
INSERT INTO DocumentFolders VALUES (3, 1, NULL);
INSERT INTO DocumentFolders VALUES (4, 3, NULL);
INSERT INTO DocumentFolders VALUES (5, 2, NULL);
INSERT INTO DocumentFolders VALUES (6, 1, NULL);
INSERT INTO DocumentFolders VALUES (6, 3, NULL);
INSERT INTO DocumentFolders VALUES (9, 2, NULL);

INSERT INTO RemoteDocuments VALUES (5, 9005, 1);
INSERT INTO RemoteDocuments VALUES (7, 9007, 1);
INSERT INTO RemoteDocuments VALUES (8, 9008, 2);
INSERT INTO RemoteDocuments VALUES (10, 9010, 1);

INSERT INTO DocumentContributors VALUES (1, 1, 'DocumentAuthor', 'Ada', 'Lovelace');
INSERT INTO DocumentContributors VALUES (2, 1, 'DocumentAuthor', 'Charles', 'Babbage');
INSERT INTO DocumentContributors VALUES (3, 5, 'DocumentEditor', 'Grace', 'Hopper');

INSERT INTO DocumentUrls VALUES (1, 0, 'https://example.org/alive.pdf');

INSERT INTO DocumentTags VALUES (1, 'engines');
INSERT INTO DocumentTags VALUES (1, 'history');
"#;

/// Write the fixture into a fresh temp directory. Keep the `TempDir` alive
/// for as long as the file is needed.
pub fn library_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("someone@www.mendeley.com.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute_batch(SEED).unwrap();
    conn.close().unwrap();
    (dir, path)
}
