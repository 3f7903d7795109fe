//! Storage trait definitions

use super::types::{ContainerId, Metadata, RawDocument, RecordId, StoredAttributes};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Failed to create node: {0}")]
    CreateNode(String),

    #[error("Failed to create edge: {0}")]
    CreateEdge(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for provenance storage backends
///
/// A backend stores nodes and edges inside containers. Every document has
/// one root container (returned by `save_document`) and one container per
/// bundle (returned by `save_bundle`). Edges locate their endpoints by the
/// `identifier` recorded in the endpoint node's metadata.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait ProvStore: Send + Sync {
    /// Create an empty document and return its root container
    fn save_document(&self) -> StorageResult<ContainerId>;

    /// Create a bundle container inside a document.
    ///
    /// The bundle's entity node (carrying `attributes` and `metadata`) is
    /// stored in the document's root container so relations can point at it.
    fn save_bundle(
        &self,
        document_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<ContainerId>;

    /// Store a node in a container
    fn save_record(
        &self,
        container_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId>;

    /// Store an edge between two existing nodes, possibly in different
    /// containers. The edge belongs to `from_container`.
    fn save_relation(
        &self,
        from_container: &ContainerId,
        from_identifier: &str,
        to_container: &ContainerId,
        to_identifier: &str,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId>;

    /// Load every node and edge of a document, grouped by container
    fn get_document(&self, document_id: &ContainerId) -> StorageResult<RawDocument>;

    /// List the root containers of all stored documents
    fn list_documents(&self) -> StorageResult<Vec<ContainerId>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: ProvStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
