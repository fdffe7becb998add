use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use sql_builder::SqlBuilder;
use tracing::{error, info, instrument, warn};

use crate::common::{ImportError, Result};
use crate::data::tables;
use crate::model::TagRow;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub deleted: usize,
    pub inserted: usize,
    pub batches: usize,
}

/// Empties the tags table and inserts `rows` in order, committing every
/// `batch_size` rows.
///
/// Batches are independent transactions: when one fails, the batches before
/// it stay in the table and the error carries how many rows made it.
#[instrument(skip(conn, rows), fields(rows = rows.len()))]
pub fn load(conn: &mut Connection, rows: &[TagRow], batch_size: usize) -> Result<LoadReport> {
    let total = rows.len();
    let batch_size = if batch_size > tables::MAX_BATCH_SIZE {
        warn!(
            "Batch size {} exceeds the statement parameter limit, using {}",
            batch_size,
            tables::MAX_BATCH_SIZE
        );
        tables::MAX_BATCH_SIZE
    } else {
        batch_size.max(1)
    };

    //At most two statement shapes: full batches and the remainder
    let full_batch = batch_size.min(total);
    let full_statement = if total > 0 {
        insert_statement(full_batch)?
    } else {
        String::new()
    };
    let last_statement = match total % batch_size {
        0 => None,
        remainder => Some(insert_statement(remainder)?),
    };

    let deleted = conn
        .execute(tables::CLEAR_TAGS, [])
        .map_err(|source| ImportError::Load {
            committed: 0,
            total,
            source,
        })?;
    info!("Cleared {} existing rows from '{}' table", deleted, tables::TAGS);

    let mut report = LoadReport {
        deleted,
        ..Default::default()
    };

    for batch in rows.chunks(batch_size) {
        let statement = match &last_statement {
            Some(statement) if batch.len() != full_batch => statement,
            _ => &full_statement,
        };

        if let Err(source) = insert_batch(conn, statement, batch) {
            error!(
                "Batch {} failed, {}/{} rows remain committed",
                report.batches + 1,
                report.inserted,
                total
            );
            return Err(ImportError::Load {
                committed: report.inserted,
                total,
                source,
            });
        }

        report.inserted += batch.len();
        report.batches += 1;
        info!("Inserted {}/{} rows", report.inserted, total);
    }

    info!("All {} rows inserted", report.inserted);
    Ok(report)
}

fn insert_batch(conn: &mut Connection, statement: &str, batch: &[TagRow]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        statement,
        params_from_iter(batch.iter().flat_map(TagRow::to_sql_values)),
    )?;
    tx.commit()
}

fn insert_statement(row_count: usize) -> Result<String> {
    let placeholders = ["?"; tables::TAG_COLUMNS.len()];

    let mut builder = SqlBuilder::insert_into(tables::TAGS);
    builder.fields(&tables::TAG_COLUMNS);
    for _ in 0..row_count {
        builder.values(&placeholders);
    }

    builder
        .sql()
        .map_err(|err| ImportError::Statement(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ensure_table;

    fn tags_connection() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_table(&mut conn).unwrap();
        conn
    }

    fn rows(count: usize) -> Vec<TagRow> {
        (0..count)
            .map(|i| TagRow {
                channel_name: Some(format!("channel_{}", i % 3)),
                device_name: Some("Meter_89".to_string()),
                device_id_string: Some("<10.0.0.89>.1".to_string()),
                tag_name: Some(format!("tag_{}", i)),
                address: Some(format!("4{:05}", i)),
                data_type: Some(8),
                scan_rate: Some(1000),
            })
            .collect()
    }

    fn stored_tag_names(conn: &Connection) -> Vec<Option<String>> {
        let mut stmt = conn.prepare("SELECT tag_name FROM tags ORDER BY id;").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn insert_statement_has_one_tuple_per_row() {
        let sql = insert_statement(2).unwrap();

        assert!(sql.starts_with("INSERT INTO tags"));
        assert!(sql.contains("device_id_string"));
        assert_eq!(sql.matches('?').count(), 14);
    }

    #[test]
    fn loads_in_batches() {
        let mut conn = tags_connection();
        let rows = rows(2500);

        let report = load(&mut conn, &rows, 1000).unwrap();

        assert_eq!(
            report,
            LoadReport {
                deleted: 0,
                inserted: 2500,
                batches: 3
            }
        );
        let names = stored_tag_names(&conn);
        assert_eq!(names.len(), 2500);
        assert_eq!(names[0].as_deref(), Some("tag_0"));
        assert_eq!(names[2499].as_deref(), Some("tag_2499"));
    }

    #[test]
    fn exact_multiple_of_batch_size() {
        let mut conn = tags_connection();

        let report = load(&mut conn, &rows(20), 10).unwrap();

        assert_eq!(report.batches, 2);
        assert_eq!(report.inserted, 20);
    }

    #[test]
    fn oversized_batch_is_capped() {
        let mut conn = tags_connection();
        let rows = rows(5000);

        let report = load(&mut conn, &rows, 40000).unwrap();

        assert_eq!(report.inserted, 5000);
        assert_eq!(report.batches, 2);
        assert_eq!(stored_tag_names(&conn).len(), 5000);
    }

    #[test]
    fn reload_replaces_previous_rows() {
        let mut conn = tags_connection();
        load(&mut conn, &rows(5), 1000).unwrap();

        let report = load(&mut conn, &rows(3), 1000).unwrap();

        assert_eq!(report.deleted, 5);
        assert_eq!(stored_tag_names(&conn).len(), 3);
    }

    #[test]
    fn zero_rows_only_clears() {
        let mut conn = tags_connection();
        load(&mut conn, &rows(4), 1000).unwrap();

        let report = load(&mut conn, &[], 1000).unwrap();

        assert_eq!(
            report,
            LoadReport {
                deleted: 4,
                inserted: 0,
                batches: 0
            }
        );
        assert!(stored_tag_names(&conn).is_empty());
    }

    #[test]
    fn absent_fields_are_stored_as_null() {
        let mut conn = tags_connection();

        load(&mut conn, &[TagRow::default()], 1000).unwrap();

        let (channel, data_type): (Option<String>, Option<i64>) = conn
            .query_row("SELECT channel_name, data_type FROM tags;", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(channel, None);
        assert_eq!(data_type, None);
    }

    #[test]
    fn failed_batch_keeps_earlier_batches() {
        let mut conn = tags_connection();
        conn.execute_batch(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON tags
             WHEN NEW.tag_name = 'poison'
             BEGIN SELECT RAISE(ABORT, 'poisoned tag'); END;",
        )
        .unwrap();

        let mut rows = rows(50);
        //Third batch of ten
        rows[25].tag_name = Some("poison".to_string());

        let err = load(&mut conn, &rows, 10).unwrap_err();

        assert!(matches!(
            err,
            ImportError::Load {
                committed: 20,
                total: 50,
                ..
            }
        ));
        assert!(err.to_string().contains("20/50"));
        assert_eq!(stored_tag_names(&conn).len(), 20);
    }
}
