use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::common::{ImportError, Result};
use crate::model::{keys, TagRow};

const UTF8_BOM: char = '\u{feff}';

/// Reads and parses the export at `path`. A leading byte order mark is ignored.
#[instrument]
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ImportError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let unreadable = |source: std::io::Error| ImportError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let size_mb = std::fs::metadata(path).map_err(unreadable)?.len() as f64 / (1024.0 * 1024.0);
    info!("Reading JSON file ({:.1} MB)", size_mb);

    let text = std::fs::read_to_string(path).map_err(unreadable)?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);

    let document = serde_json::from_str(text).map_err(|source| ImportError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("JSON deserialized");
    Ok(document)
}

/// Flattens the channel/device/tag hierarchy into rows, depth first and in
/// document order.
pub fn extract(document: &Value) -> Result<Vec<TagRow>> {
    let root = document
        .as_object()
        .ok_or_else(|| ImportError::malformed("$", "document root is not an object"))?;

    let project = match root.get(keys::PROJECT) {
        None | Some(Value::Null) => return Ok(vec![]),
        Some(Value::Object(project)) => project,
        Some(_) => {
            return Err(ImportError::malformed(
                format!("$.{}", keys::PROJECT),
                "expected an object",
            ))
        }
    };

    let channels_path = format!("$.{}.{}", keys::PROJECT, keys::CHANNELS);
    let channels = children(project, keys::CHANNELS, &channels_path)?;
    info!("Found {} channels in JSON", channels.len());

    let mut rows = vec![];

    for (channel_index, channel) in channels.iter().enumerate() {
        let channel_path = format!("{}[{}]", channels_path, channel_index);
        let channel = as_node(channel, &channel_path)?;
        let channel_name = text(channel, keys::NAME);

        let devices_path = format!("{}.{}", channel_path, keys::DEVICES);
        for (device_index, device) in children(channel, keys::DEVICES, &devices_path)?
            .iter()
            .enumerate()
        {
            let device_path = format!("{}[{}]", devices_path, device_index);
            let device = as_node(device, &device_path)?;
            let device_name = text(device, keys::NAME);
            let device_id_string = text(device, keys::DEVICE_ID_STRING);

            let tags_path = format!("{}.{}", device_path, keys::TAGS);
            for (tag_index, tag) in children(device, keys::TAGS, &tags_path)?
                .iter()
                .enumerate()
            {
                let tag = as_node(tag, &format!("{}[{}]", tags_path, tag_index))?;

                rows.push(TagRow {
                    channel_name: channel_name.clone(),
                    device_name: device_name.clone(),
                    device_id_string: device_id_string.clone(),
                    tag_name: text(tag, keys::NAME),
                    address: text(tag, keys::TAG_ADDRESS),
                    data_type: integer(tag, keys::TAG_DATA_TYPE),
                    scan_rate: integer(tag, keys::TAG_SCAN_RATE),
                });
            }
        }
    }

    info!("Extracted {} tag rows from JSON", rows.len());
    Ok(rows)
}

//Absent and null collections count as empty, anything else that isn't an array is rejected
fn children<'a>(node: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a [Value]> {
    match node.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ImportError::malformed(
            path,
            format!("expected an array, found {}", kind(other)),
        )),
    }
}

fn as_node<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ImportError::malformed(path, format!("expected an object, found {}", kind(value)))
    })
}

fn text(node: &Map<String, Value>, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn integer(node: &Map<String, Value>, key: &str) -> Option<i64> {
    node.get(key).and_then(Value::as_i64)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
