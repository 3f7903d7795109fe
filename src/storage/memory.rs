//! In-process storage backend

use super::traits::{ProvStore, StorageError, StorageResult};
use super::types::{
    ContainerId, Metadata, RawBundle, RawDocument, RawRecord, RecordId, StoredAttributes,
};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct StoredNode {
    id: RecordId,
    record: RawRecord,
    /// Set on the entity node of a bundle: the bundle's container
    represents: Option<ContainerId>,
}

#[derive(Debug, Clone)]
#[allow(dead_code)] // endpoints only show up in Debug output
struct StoredEdge {
    id: RecordId,
    from: RecordId,
    to: RecordId,
    record: RawRecord,
}

#[derive(Debug, Default)]
struct Container {
    /// Root container of the owning document (itself for a root)
    document: Option<ContainerId>,
    nodes: Vec<StoredNode>,
    edges: Vec<StoredEdge>,
    bundles: Vec<ContainerId>,
}

/// Store keeping every document in memory
///
/// Containers live in a `DashMap`; nodes and edges keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    containers: DashMap<ContainerId, Container>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in a container (bundle entity nodes included)
    pub fn node_count(&self, container_id: &ContainerId) -> usize {
        self.containers
            .get(container_id)
            .map(|c| c.nodes.len())
            .unwrap_or(0)
    }

    /// Number of edges owned by a container
    pub fn edge_count(&self, container_id: &ContainerId) -> usize {
        self.containers
            .get(container_id)
            .map(|c| c.edges.len())
            .unwrap_or(0)
    }

    fn find_node(&self, container_id: &ContainerId, identifier: &str) -> StorageResult<RecordId> {
        let container = self.containers.get(container_id).ok_or_else(|| {
            StorageError::CreateEdge(format!("unknown container {}", container_id))
        })?;
        container
            .nodes
            .iter()
            .find(|n| n.record.metadata.identifier == identifier)
            .map(|n| n.id.clone())
            .ok_or_else(|| {
                StorageError::CreateEdge(format!(
                    "no node {} in container {}",
                    identifier, container_id
                ))
            })
    }

    fn container_records(container: &Container) -> Vec<RawRecord> {
        container
            .nodes
            .iter()
            .filter(|n| n.represents.is_none())
            .map(|n| n.record.clone())
            .chain(container.edges.iter().map(|e| e.record.clone()))
            .collect()
    }
}

impl ProvStore for MemoryStore {
    fn save_document(&self) -> StorageResult<ContainerId> {
        let id = ContainerId::new();
        self.containers.insert(
            id.clone(),
            Container {
                document: Some(id.clone()),
                ..Default::default()
            },
        );
        Ok(id)
    }

    fn save_bundle(
        &self,
        document_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<ContainerId> {
        let bundle_id = ContainerId::new();
        {
            let mut document = self
                .containers
                .get_mut(document_id)
                .ok_or_else(|| StorageError::DocumentNotFound(document_id.to_string()))?;
            document.bundles.push(bundle_id.clone());
            document.nodes.push(StoredNode {
                id: RecordId::new(),
                record: RawRecord {
                    metadata: metadata.clone(),
                    attributes: attributes.clone(),
                },
                represents: Some(bundle_id.clone()),
            });
        }
        self.containers.insert(
            bundle_id.clone(),
            Container {
                document: Some(document_id.clone()),
                ..Default::default()
            },
        );
        Ok(bundle_id)
    }

    fn save_record(
        &self,
        container_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let mut container = self.containers.get_mut(container_id).ok_or_else(|| {
            StorageError::CreateNode(format!("unknown container {}", container_id))
        })?;
        let id = RecordId::new();
        container.nodes.push(StoredNode {
            id: id.clone(),
            record: RawRecord {
                metadata: metadata.clone(),
                attributes: attributes.clone(),
            },
            represents: None,
        });
        Ok(id)
    }

    fn save_relation(
        &self,
        from_container: &ContainerId,
        from_identifier: &str,
        to_container: &ContainerId,
        to_identifier: &str,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let from = self.find_node(from_container, from_identifier)?;
        let to = self.find_node(to_container, to_identifier)?;

        let mut container = self.containers.get_mut(from_container).ok_or_else(|| {
            StorageError::CreateEdge(format!("unknown container {}", from_container))
        })?;
        let id = RecordId::new();
        container.edges.push(StoredEdge {
            id: id.clone(),
            from,
            to,
            record: RawRecord {
                metadata: metadata.clone(),
                attributes: attributes.clone(),
            },
        });
        Ok(id)
    }

    fn get_document(&self, document_id: &ContainerId) -> StorageResult<RawDocument> {
        // Copy out of the root container before touching the bundle
        // containers so no two shard guards are held at once.
        let (records, bundle_nodes) = {
            let document = self
                .containers
                .get(document_id)
                .filter(|c| c.document.as_ref() == Some(document_id))
                .ok_or_else(|| StorageError::DocumentNotFound(document_id.to_string()))?;

            let bundle_nodes: Vec<(ContainerId, RawRecord)> = document
                .bundles
                .iter()
                .filter_map(|bundle_id| {
                    document
                        .nodes
                        .iter()
                        .find(|n| n.represents.as_ref() == Some(bundle_id))
                        .map(|n| (bundle_id.clone(), n.record.clone()))
                })
                .collect();
            (Self::container_records(&document), bundle_nodes)
        };

        let bundles = bundle_nodes
            .into_iter()
            .map(|(bundle_id, bundle_record)| RawBundle {
                bundle_record,
                records: self
                    .containers
                    .get(&bundle_id)
                    .map(|c| Self::container_records(&c))
                    .unwrap_or_default(),
            })
            .collect();

        Ok(RawDocument { records, bundles })
    }

    fn list_documents(&self) -> StorageResult<Vec<ContainerId>> {
        let mut ids: Vec<ContainerId> = self
            .containers
            .iter()
            .filter(|entry| entry.value().document.as_ref() == Some(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
