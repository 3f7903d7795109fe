//! Storage backends for provenance graphs
//!
//! Documents are stored through the `ProvStore` trait. `SqliteStore` is the
//! persistent implementation; `MemoryStore` keeps everything in process.

mod memory;
mod sqlite;
mod traits;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{OpenStore, ProvStore, StorageError, StorageResult};
pub use types::{
    ContainerId, Metadata, RawBundle, RawDocument, RawRecord, RecordId, StoredAttributes,
    SyntheticKind,
};
