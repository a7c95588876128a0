use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::{OpenOptions, RepairPolicy, SchemaSource};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShelfConfig {
    pub database: Option<String>,
    pub account: Option<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub schema_source: SchemaSource,
}

impl ShelfConfig {
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            policy: if self.strict { RepairPolicy::Strict } else { RepairPolicy::Lenient },
            schema_source: self.schema_source,
            ..OpenOptions::default()
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("shelf.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ShelfConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ShelfConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// File name Mendeley Desktop gives an account's database
pub fn database_file_name(account: &str) -> String {
    format!("{}@www.mendeley.com.sqlite", account)
}

/// Where Mendeley Desktop keeps an account's database on this OS
pub fn account_database_path(account: &str) -> Result<PathBuf> {
    account_database_path_on(std::env::consts::OS, account)
}

pub fn account_database_path_on(os: &str, account: &str) -> Result<PathBuf> {
    let base = match os {
        "linux" => dirs::home_dir().map(|home| {
            home.join(".local")
                .join("share")
                .join("data")
                .join("Mendeley Ltd.")
                .join("Mendeley Desktop")
        }),
        "macos" => dirs::home_dir().map(|home| {
            home.join("Library")
                .join("Application Support")
                .join("Mendeley Desktop")
        }),
        "windows" => dirs::data_local_dir().map(|local| local.join("Mendeley Ltd").join("Mendeley Desktop")),
        other => return Err(Error::UnsupportedPlatform(other.to_string())),
    };

    let base = base.ok_or_else(|| Error::Config("unable to locate the home directory".to_string()))?;
    Ok(base.join(database_file_name(account)))
}

/// Pick the database file: an explicit path wins, else derive one from the
/// account name. The result must exist.
pub fn resolve_database_path(path: Option<&Path>, account: Option<&str>) -> Result<PathBuf> {
    let path = match (path, account) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(account)) => account_database_path(account)?,
        (None, None) => {
            return Err(Error::Config(
                "either a database path or an account name is required".to_string(),
            ));
        }
    };

    if !path.is_file() {
        return Err(Error::DatabaseNotFound(path.display().to_string()));
    }
    Ok(path)
}
