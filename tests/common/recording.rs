//! Store wrapper recording every save call

use provgraph::storage::{Metadata, RecordId, StoredAttributes};
use provgraph::{ContainerId, MemoryStore, ProvStore, RawDocument, StorageResult};
use std::sync::Mutex;

/// One call made to the store
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SaveDocument {
        id: ContainerId,
    },
    SaveBundle {
        id: ContainerId,
        identifier: String,
    },
    SaveRecord {
        container: ContainerId,
        identifier: String,
        prov_type: String,
    },
    SaveRelation {
        from_container: ContainerId,
        from: String,
        to_container: ContainerId,
        to: String,
        prov_type: String,
    },
}

/// A [`MemoryStore`] that remembers the order of save calls
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ProvStore for RecordingStore {
    fn save_document(&self) -> StorageResult<ContainerId> {
        let id = self.inner.save_document()?;
        self.push(Call::SaveDocument { id: id.clone() });
        Ok(id)
    }

    fn save_bundle(
        &self,
        document_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<ContainerId> {
        let id = self.inner.save_bundle(document_id, attributes, metadata)?;
        self.push(Call::SaveBundle {
            id: id.clone(),
            identifier: metadata.identifier.clone(),
        });
        Ok(id)
    }

    fn save_record(
        &self,
        container_id: &ContainerId,
        attributes: &StoredAttributes,
        metadata: &Metadata,
    ) -> StorageResult<RecordId> {
        let id = self.inner.save_record(container_id, attributes, metadata)?;
        self.push(Call::SaveRecord {
            container: container_id.clone(),
            identifier: metadata.identifier.clone(),
            prov_type: metadata.prov_type.clone(),
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
        let id = self.inner.save_relation(
            from_container,
            from_identifier,
            to_container,
            to_identifier,
            attributes,
            metadata,
        )?;
        self.push(Call::SaveRelation {
            from_container: from_container.clone(),
            from: from_identifier.to_string(),
            to_container: to_container.clone(),
            to: to_identifier.to_string(),
            prov_type: metadata.prov_type.clone(),
        });
        Ok(id)
    }

    fn get_document(&self, document_id: &ContainerId) -> StorageResult<RawDocument> {
        self.inner.get_document(document_id)
    }

    fn list_documents(&self) -> StorageResult<Vec<ContainerId>> {
        self.inner.list_documents()
    }
}
