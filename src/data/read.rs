use rusqlite::{Connection, Row};
use sql_builder::SqlBuilder;

use crate::common::{ImportError, Result};
use crate::data::tables;
use crate::model::{ChannelCount, StoredRow, TagRow};

fn build(builder: &SqlBuilder) -> Result<String> {
    builder
        .sql()
        .map_err(|err| ImportError::Statement(err.to_string()))
}

pub fn count_tags(conn: &Connection) -> Result<i64> {
    let query = build(SqlBuilder::select_from(tables::TAGS).field("COUNT(*)"))?;

    conn.query_row(&query, [], |row| row.get(0))
        .map_err(ImportError::Report)
}

/// First `limit` rows in whatever order the table hands them out.
pub fn sample_tags(conn: &Connection, limit: usize) -> Result<Vec<StoredRow>> {
    let query = build(
        SqlBuilder::select_from(tables::TAGS)
            .field("id")
            .fields(&tables::TAG_COLUMNS)
            .limit(limit),
    )?;

    query_stored_rows(conn, &query).map_err(ImportError::Report)
}

fn query_stored_rows(conn: &Connection, query: &str) -> rusqlite::Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(query)?;
    let mut rows = stmt.query([])?;

    let mut result = vec![];

    while let Some(row) = rows.next()? {
        result.push(stored_row(row)?);
    }

    Ok(result)
}

fn stored_row(row: &Row) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: row.get(0)?,
        row: TagRow {
            channel_name: row.get(1)?,
            device_name: row.get(2)?,
            device_id_string: row.get(3)?,
            tag_name: row.get(4)?,
            address: row.get(5)?,
            data_type: row.get(6)?,
            scan_rate: row.get(7)?,
        },
    })
}

/// Row count per channel, biggest first.
pub fn count_tags_per_channel(conn: &Connection) -> Result<Vec<ChannelCount>> {
    let query = build(
        SqlBuilder::select_from(tables::TAGS)
            .field("channel_name")
            .field("COUNT(*) AS tag_count")
            .group_by("channel_name")
            .order_desc("tag_count")
            .order_asc("channel_name"),
    )?;

    query_channel_counts(conn, &query).map_err(ImportError::Report)
}

fn query_channel_counts(conn: &Connection, query: &str) -> rusqlite::Result<Vec<ChannelCount>> {
    let mut stmt = conn.prepare(query)?;

    let counts = stmt
        .query_map([], |row| {
            Ok(ChannelCount {
                channel_name: row.get(0)?,
                tag_count: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_a_report_error() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(matches!(count_tags(&conn), Err(ImportError::Report(_))));
        assert!(matches!(sample_tags(&conn, 10), Err(ImportError::Report(_))));
        assert!(matches!(
            count_tags_per_channel(&conn),
            Err(ImportError::Report(_))
        ));
    }

    #[test]
    fn type_mismatch_is_a_report_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tags (id INTEGER PRIMARY KEY, channel_name, device_name,
             device_id_string, tag_name, address, data_type, scan_rate);
             INSERT INTO tags (channel_name, data_type) VALUES ('Line_1', 'eight');",
        )
        .unwrap();

        let err = sample_tags(&conn, 10).unwrap_err();

        assert!(matches!(err, ImportError::Report(_)));
        assert!(err.to_string().starts_with("Verification query failed"));
    }
}
