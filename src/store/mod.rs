//! Persistence layer — key-value backends and the draft snapshot store.

pub mod file;
pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod snapshot;
pub mod traits;

pub use file::FileStore;
pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotStore};
pub use traits::KeyValueStore;
