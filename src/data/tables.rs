pub const TAGS: &str = "tags";

pub const TAG_COLUMNS: [&str; 7] = [
    "channel_name",
    "device_name",
    "device_id_string",
    "tag_name",
    "address",
    "data_type",
    "scan_rate",
];

//SQLITE_MAX_VARIABLE_NUMBER default of the bundled SQLite (3.32 and later)
pub const MAX_BOUND_PARAMETERS: usize = 32766;

//Every batch is one INSERT binding a parameter per column per row
pub const MAX_BATCH_SIZE: usize = MAX_BOUND_PARAMETERS / TAG_COLUMNS.len();

pub const CATALOG_TABLE: &str = "CREATE TABLE IF NOT EXISTS databases (
                                name TEXT PRIMARY KEY,
                                file TEXT NOT NULL,
                                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
                            );";

pub const DROP_TAGS_TABLE: &str = "DROP TABLE IF EXISTS tags;";

pub const TAGS_TABLE: &str = "CREATE TABLE tags (
                                id INTEGER PRIMARY KEY AUTOINCREMENT,
                                channel_name VARCHAR(100),
                                device_name VARCHAR(100),
                                device_id_string VARCHAR(100),
                                tag_name VARCHAR(150),
                                address VARCHAR(50),
                                data_type INTEGER,
                                scan_rate INTEGER
                            );";

pub const CLEAR_TAGS: &str = "DELETE FROM tags;";
