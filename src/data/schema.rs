use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use crate::common::{ImportError, Result};
use crate::data::{tables, ServerConnection};

/// Makes sure `database` exists on the server, creating it only when the
/// catalog doesn't know it or its file went missing.
///
/// Creation goes through `ATTACH`, which SQLite rejects inside a
/// transaction, so the server connection has to be in autocommit mode.
#[instrument(skip(server_conn))]
pub fn ensure_database(server_conn: &ServerConnection, database: &str) -> Result<()> {
    let conn = server_conn.connection();
    let file = server_conn.server().database_file(database);
    let file_name = file.to_string_lossy().to_string();

    conn.execute(tables::CATALOG_TABLE, [])
        .map_err(|err| ImportError::schema("preparing the database catalog", err))?;

    let registered: bool = conn
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM databases WHERE name = ?1);",
            [database],
            |row| row.get(0),
        )
        .map_err(|err| ImportError::schema("reading the database catalog", err))?;

    if registered && file.exists() {
        info!("Database '{}' is ready", database);
        return Ok(());
    }

    let creating = format!("creating database '{}'", database);

    conn.execute("ATTACH DATABASE ?1 AS ?2;", params![file_name, database])
        .map_err(|err| ImportError::schema(creating.clone(), err))?;
    conn.execute("DETACH DATABASE ?1;", [database])
        .map_err(|err| ImportError::schema(creating.clone(), err))?;

    conn.execute(
        "INSERT OR REPLACE INTO databases (name, file) VALUES (?1, ?2);",
        params![database, file_name],
    )
    .map_err(|err| ImportError::schema(creating, err))?;

    debug!("Registered {} in the catalog", file_name);
    info!("Database '{}' created", database);
    Ok(())
}

/// Drops the tags table if present and creates it again, empty.
#[instrument(skip(conn))]
pub fn ensure_table(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|err| ImportError::schema("starting table setup", err))?;

    tx.execute(tables::DROP_TAGS_TABLE, [])
        .map_err(|err| ImportError::schema("dropping table 'tags'", err))?;
    tx.execute(tables::TAGS_TABLE, [])
        .map_err(|err| ImportError::schema("creating table 'tags'", err))?;

    tx.commit()
        .map_err(|err| ImportError::schema("committing table setup", err))?;

    info!("Table '{}' is ready", tables::TAGS);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Server;

    fn table_columns(conn: &Connection) -> Vec<String> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('tags');").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn ensure_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(dir.path(), None);
        let server_conn = server.connect_server("master").unwrap();

        ensure_database(&server_conn, "ase_config").unwrap();
        ensure_database(&server_conn, "ase_config").unwrap();

        let registered: i64 = server_conn
            .connection()
            .query_row("SELECT COUNT(*) FROM databases;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(registered, 1);
        assert!(server.database_file("ase_config").exists());

        server_conn.close();
        server.connect("ase_config").unwrap();
    }

    #[test]
    fn ensure_database_recreates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(dir.path(), None);
        let server_conn = server.connect_server("master").unwrap();

        ensure_database(&server_conn, "ase_config").unwrap();
        std::fs::remove_file(server.database_file("ase_config")).unwrap();
        ensure_database(&server_conn, "ase_config").unwrap();

        assert!(server.database_file("ase_config").exists());
    }

    #[test]
    fn ensure_database_refuses_open_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(dir.path(), None);
        let server_conn = server.connect_server("master").unwrap();
        server_conn.connection().execute_batch("BEGIN;").unwrap();

        let err = ensure_database(&server_conn, "ase_config").unwrap_err();

        assert!(matches!(err, ImportError::Schema { .. }));
    }

    #[test]
    fn ensure_table_replaces_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(dir.path(), None);
        let server_conn = server.connect_server("master").unwrap();
        ensure_database(&server_conn, "ase_config").unwrap();
        server_conn.close();

        let mut conn = server.connect("ase_config").unwrap();
        conn.execute_batch("CREATE TABLE tags (legacy TEXT); INSERT INTO tags VALUES ('old');")
            .unwrap();

        ensure_table(&mut conn).unwrap();

        assert_eq!(
            table_columns(&conn),
            vec![
                "id",
                "channel_name",
                "device_name",
                "device_id_string",
                "tag_name",
                "address",
                "data_type",
                "scan_rate"
            ]
        );
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn ensure_table_reports_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::new(dir.path(), None);
        let server_conn = server.connect_server("master").unwrap();
        ensure_database(&server_conn, "ase_config").unwrap();
        server_conn.close();

        let mut conn = server.connect("ase_config").unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER); CREATE VIEW tags AS SELECT x FROM t;")
            .unwrap();

        let err = ensure_table(&mut conn).unwrap_err();

        assert!(matches!(err, ImportError::Schema { .. }));
    }
}
