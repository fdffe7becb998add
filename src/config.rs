use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::tables::MAX_BATCH_SIZE;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

fn default_server() -> PathBuf {
    PathBuf::from(".")
}

fn default_default_database() -> String {
    "master".to_string()
}

fn default_database() -> String {
    "ase_config".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

/// Everything a single import run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub file_path: PathBuf,
    /// Data directory holding one `.db3` file per database
    #[serde(default = "default_server")]
    pub server: PathBuf,
    /// Server-level database holding the catalog of provisioned databases
    #[serde(default = "default_default_database")]
    pub default_database: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// SQLite VFS to open connections through, platform default when absent
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            file_path: PathBuf::new(),
            server: default_server(),
            default_database: default_default_database(),
            database: default_database(),
            driver: None,
            batch_size: default_batch_size(),
            sample_size: default_sample_size(),
        }
    }
}

impl ImportConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read config file {}", path.display()))?;

        serde_json::from_str(&config)
            .with_context(|| format!("Couldn't parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut error_string = String::new();

        if self.file_path.as_os_str().is_empty() {
            error_string += "\tNo JSON file to import was given\n";
        }

        if self.batch_size == 0 {
            error_string += "\tBatch size must be greater than 0\n";
        } else if self.batch_size > MAX_BATCH_SIZE {
            error_string += &format!(
                "\tBatch size {} is too high, maximum is {}\n",
                self.batch_size, MAX_BATCH_SIZE
            );
        }

        for (field, name) in [
            ("database", &self.database),
            ("default_database", &self.default_database),
        ] {
            if let Err(err) = validate_database_name(name) {
                error_string += &format!("\t{}: {}\n", field, err);
            }
        }

        if self.database == self.default_database {
            error_string += &format!(
                "\tTarget database can't be the server default database ({})\n",
                self.default_database
            );
        }

        if matches!(&self.driver, Some(driver) if driver.trim().is_empty()) {
            error_string += "\tDriver name can't be blank\n";
        }

        if error_string.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(error_string))
        }
    }
}

//SQLite schema names that ATTACH can never take
const RESERVED_SCHEMA_NAMES: [&str; 2] = ["main", "temp"];

//Database names end up both as file names and as schema aliases in ATTACH statements
fn validate_database_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("database name can't be empty"));
    }

    if RESERVED_SCHEMA_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        return Err(anyhow!("'{}' is reserved by SQLite", name));
    }

    if let Some(invalid) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(anyhow!(
            "'{}' contains '{}', only ASCII letters, digits, '_' and '-' are allowed",
            name,
            invalid
        ));
    }

    Ok(())
}
