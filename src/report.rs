use std::fmt;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::common::Result;
use crate::data::read;
use crate::model::{ChannelCount, StoredRow};

const RULE_WIDTH: usize = 115;

/// Read-only snapshot of the tags table, printed at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: i64,
    pub sample: Vec<StoredRow>,
    pub per_channel: Vec<ChannelCount>,
}

#[instrument(skip(conn))]
pub fn summarize(conn: &Connection, sample_size: usize) -> Result<Summary> {
    Ok(Summary {
        total: read::count_tags(conn)?,
        sample: read::sample_tags(conn, sample_size)?,
        per_channel: read::count_tags_per_channel(conn)?,
    })
}

fn or_none(value: &Option<impl ToString>) -> String {
    value
        .as_ref()
        .map_or_else(|| "None".to_string(), ToString::to_string)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total rows in 'tags' table: {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Sample data (first {} rows):", self.sample.len())?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(
            f,
            "{:<6} {:<12} {:<22} {:<22} {:<30} {:<10} {:<6} {}",
            "ID", "Channel", "Device", "ID String", "Tag Name", "Address", "Type", "Rate"
        )?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;

        for stored in &self.sample {
            let row = &stored.row;
            writeln!(
                f,
                "{:<6} {:<12} {:<22} {:<22} {:<30} {:<10} {:<6} {}",
                stored.id,
                or_none(&row.channel_name),
                or_none(&row.device_name),
                or_none(&row.device_id_string),
                or_none(&row.tag_name),
                or_none(&row.address),
                or_none(&row.data_type),
                or_none(&row.scan_rate)
            )?;
        }
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;

        writeln!(f)?;
        write!(f, "Rows per channel:")?;
        for channel in &self.per_channel {
            write!(
                f,
                "\n   {}: {} tags",
                or_none(&channel.channel_name),
                channel.tag_count
            )?;
        }

        Ok(())
    }
}
