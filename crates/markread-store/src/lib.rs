pub mod database;
pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use database::Database;
pub use error::StoreError;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Default quota for the local store, matching the usual extension local-storage limit.
pub const DEFAULT_QUOTA_BYTES: u64 = 10 * 1024 * 1024;
