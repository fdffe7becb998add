use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::common::Result;
use crate::config::ImportConfig;
use crate::data::{self, schema, write, write::LoadReport, Server};
use crate::extract;
use crate::model::TagRow;
use crate::report::{self, Summary};

#[derive(Clone, Debug, PartialEq)]
pub enum ImportOutcome {
    /// The export held no tags, the database was left untouched.
    NothingToImport,
    Imported { load: LoadReport, summary: Summary },
}

/// Runs one import: read and flatten the export, provision the database,
/// replace the table contents, then read the result back.
#[instrument(skip(config), fields(file = %config.file_path.display(), database = %config.database))]
pub fn run(config: &ImportConfig) -> Result<ImportOutcome> {
    info!("PHASE 1: Reading JSON file");
    let document = extract::read_document(&config.file_path)?;
    let rows = extract::extract(&document)?;
    drop(document);

    if rows.is_empty() {
        warn!("No tags found in JSON file. Nothing to insert");
        return Ok(ImportOutcome::NothingToImport);
    }

    info!("PHASE 2: Setting up database");
    let server = Server::from_config(config);

    //The target database may not exist yet, so it is provisioned from a
    //separate server-level connection that is closed before reconnecting
    let server_conn = server.connect_server(&config.default_database)?;
    let provisioned = schema::ensure_database(&server_conn, &config.database);
    server_conn.close();
    provisioned?;

    let mut conn = server.connect(&config.database)?;

    let result = load_and_summarize(&mut conn, &rows, config);
    data::close(conn, "database");

    let (load, summary) = result?;
    Ok(ImportOutcome::Imported { load, summary })
}

fn load_and_summarize(
    conn: &mut Connection,
    rows: &[TagRow],
    config: &ImportConfig,
) -> Result<(LoadReport, Summary)> {
    schema::ensure_table(conn)?;

    info!("PHASE 3: Inserting {} rows", rows.len());
    let load = write::load(conn, rows, config.batch_size)?;

    info!("PHASE 4: Verifying data");
    let summary = report::summarize(conn, config.sample_size)?;

    Ok((load, summary))
}
