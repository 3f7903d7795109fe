//! provgraph: PROV documents on graph storage
//!
//! Persists W3C PROV provenance documents (entities, activities, agents, the
//! relations between them and nested bundles) into a graph store that only
//! understands string-keyed nodes and edges, and rebuilds the same documents
//! from storage.
//!
//! # Core Concepts
//!
//! - **Documents and bundles**: a document holds records and named bundles;
//!   each bundle is stored in its own container and is also an entity node
//!   of the document
//! - **Metadata**: every stored node or edge carries its type, identifier,
//!   the namespaces it uses and the types of its attribute values
//! - **Synthetic records**: placeholder nodes for missing relation endpoints,
//!   bundle entity nodes and bundle-membership edges exist only in storage
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use provgraph::{ApiConfig, Document, MemoryStore, ProvApi, Record, RecordKind};
//!
//! let api = ProvApi::new(Arc::new(MemoryStore::new()), ApiConfig::default()).unwrap();
//!
//! let mut doc = Document::new();
//! let ex = doc.add_namespace("ex", "http://example.org/");
//! doc.add_record(Record::entity(ex.qualified("report")));
//! doc.add_record(Record::activity(ex.qualified("writing")));
//! doc.add_record(Record::relation(
//!     RecordKind::Generation,
//!     ex.qualified("report"),
//!     ex.qualified("writing"),
//! ));
//!
//! let id = api.create_document(&doc).unwrap();
//! assert_eq!(api.get_document(&id).unwrap(), doc);
//! ```

pub mod api;
pub mod config;
pub mod format;
pub mod mapping;
pub mod model;
pub mod storage;

pub use api::ProvApi;
pub use config::{ApiConfig, ConfigError, LogConfig};
pub use format::{BuiltinCodec, Format, FormatCodec, FormatError};
pub use mapping::{Materializer, ProvError, ProvResult, Reconstructor};
pub use model::{
    AttributeValue, Bundle, Document, FormalAttribute, FormalValue, Identifier, Literal,
    Namespace, NamespaceScope, NamespaceTable, QualifiedName, Record, RecordKind,
};
pub use storage::{
    ContainerId, MemoryStore, OpenStore, ProvStore, RawDocument, SqliteStore, StorageError,
    StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
