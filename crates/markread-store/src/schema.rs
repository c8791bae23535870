/// Current layout, recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// One key/value row per stored pair. `value` is JSON text and `size` caches
/// the byte charge of the pair so usage queries never re-serialize.
pub const CREATE_ITEMS: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    size INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
