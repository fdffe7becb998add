use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

/// Property keys used by the configuration export.
pub mod keys {
    pub const PROJECT: &str = "project";
    pub const CHANNELS: &str = "channels";
    pub const DEVICES: &str = "devices";
    pub const TAGS: &str = "tags";

    pub const NAME: &str = "common.ALLTYPES_NAME";
    pub const DEVICE_ID_STRING: &str = "servermain.DEVICE_ID_STRING";
    pub const TAG_ADDRESS: &str = "servermain.TAG_ADDRESS";
    pub const TAG_DATA_TYPE: &str = "servermain.TAG_DATA_TYPE";
    pub const TAG_SCAN_RATE: &str = "servermain.TAG_SCAN_RATE_MILLISECONDS";
}

/// One tag flattened together with its channel and device ancestry.
///
/// Every field is optional: a key missing from the export ends up as NULL
/// in the table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub channel_name: Option<String>,
    pub device_name: Option<String>,
    pub device_id_string: Option<String>,
    pub tag_name: Option<String>,
    pub address: Option<String>,
    pub data_type: Option<i64>,
    pub scan_rate: Option<i64>,
}

impl TagRow {
    /// Column values in table order, ready to be bound to an insert.
    pub fn to_sql_values(&self) -> [SqlValue; 7] {
        [
            text_value(&self.channel_name),
            text_value(&self.device_name),
            text_value(&self.device_id_string),
            text_value(&self.tag_name),
            text_value(&self.address),
            self.data_type.map_or(SqlValue::Null, SqlValue::Integer),
            self.scan_rate.map_or(SqlValue::Null, SqlValue::Integer),
        ]
    }
}

fn text_value(value: &Option<String>) -> SqlValue {
    match value {
        Some(text) => SqlValue::Text(text.clone()),
        None => SqlValue::Null,
    }
}

/// A row read back from the table, including its assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: i64,
    #[serde(flatten)]
    pub row: TagRow,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCount {
    pub channel_name: Option<String>,
    pub tag_count: i64,
}
