//! Local fallback cache for the persistence adapter.
//!
//! Holds the most recently confirmed-good snapshot of the aggregate dataset,
//! served when every network attempt fails. A set always replaces the whole
//! aggregate; there are no partial-collection updates.

mod storage;

pub use storage::{MemoryStorage, SnapshotStorage, SqliteStorage};
