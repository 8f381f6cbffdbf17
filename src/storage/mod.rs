//! Local persistence: named JSON records and the spark collection built on them.

pub mod kv;
pub mod sparks;

pub use kv::{default_store_path, JsonFileStore, KeyValueStore, LocalStore, MemoryStore};
pub use sparks::{SparkPatch, SparkStore, PENDING_POST_KEY, SPARKS_KEY};
