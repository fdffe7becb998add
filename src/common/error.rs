use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("JSON file not found at: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Couldn't read JSON file {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Couldn't parse JSON file {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed document at '{path}': {reason}")]
    MalformedInput { path: String, reason: String },

    #[error(
        "Couldn't connect to database [{database}] on server [{server}]: {source}\n\
         Make sure:\n\
         \t1. The server data directory exists and is writable by this user\n\
         \t2. The driver (SQLite VFS) name is available on this platform\n\
         \t3. The database has been provisioned before connecting to it"
    )]
    Connection {
        server: String,
        database: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Schema setup failed while {action}: {source}")]
    Schema {
        action: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Batch insert failed after {committed}/{total} rows were committed: {source}")]
    Load {
        committed: usize,
        total: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Couldn't build SQL statement: {0}")]
    Statement(String),

    #[error("Verification query failed: {0}")]
    Report(#[source] rusqlite::Error),
}

impl ImportError {
    pub(crate) fn schema(action: impl Into<String>, source: rusqlite::Error) -> Self {
        ImportError::Schema {
            action: action.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ImportError::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
