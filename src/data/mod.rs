use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::common::{ImportError, Result};
use crate::config::ImportConfig;

pub mod read;
pub mod schema;
pub mod tables;
pub mod write;

const DATABASE_EXTENSION: &str = "db3";

/// The database server: a data directory with one SQLite file per database,
/// opened through an optional VFS ("driver").
#[derive(Clone, Debug, PartialEq)]
pub struct Server {
    data_dir: PathBuf,
    driver: Option<String>,
}

/// Connection to the server-level default database, where the catalog lives.
pub struct ServerConnection {
    conn: Connection,
    server: Server,
}

impl Server {
    pub fn new(data_dir: impl Into<PathBuf>, driver: Option<String>) -> Self {
        Server {
            data_dir: data_dir.into(),
            driver,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.server.clone(), config.driver.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_file(&self, database: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", database, DATABASE_EXTENSION))
    }

    /// Connects to the default database, creating its file on first use.
    pub fn connect_server(&self, default_database: &str) -> Result<ServerConnection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = self.open(default_database, flags)?;

        Ok(ServerConnection {
            conn,
            server: self.clone(),
        })
    }

    /// Connects to an already provisioned database. Fails if it doesn't exist.
    pub fn connect(&self, database: &str) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        self.open(database, flags)
    }

    fn open(&self, database: &str, flags: OpenFlags) -> Result<Connection> {
        let path = self.database_file(database);

        let conn = match &self.driver {
            Some(vfs) => Connection::open_with_flags_and_vfs(&path, flags, vfs.as_str()),
            None => Connection::open_with_flags(&path, flags),
        }
        .map_err(|source| ImportError::Connection {
            server: self.data_dir.display().to_string(),
            database: database.to_string(),
            source,
        })?;

        info!(
            "Connected to server [{}] -> database [{}]",
            self.data_dir.display(),
            database
        );
        Ok(conn)
    }
}

impl ServerConnection {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn close(self) {
        close(self.conn, "server");
    }
}

/// Releases a connection, logging instead of failing if SQLite refuses.
pub fn close(conn: Connection, label: &str) {
    match conn.close() {
        Ok(()) => debug!("Closed {} connection", label),
        Err((_conn, err)) => warn!("Couldn't close {} connection cleanly: {}", label, err),
    }
}
