//! Writing documents into a store
//!
//! Materialization runs in two passes. Pass 1 creates every container and
//! saves each container's elements, then its relations. Pass 2 saves the
//! `mentionOf` links, which may point into any bundle of the document and so
//! need every bundle container to exist first.

use super::error::{ProvError, ProvResult};
use super::metadata::{self, Extracted};
use crate::model::vocab;
use crate::model::{
    Bundle, Document, FormalAttribute, Identifier, NamespaceScope, QualifiedName, Record,
    RecordKind,
};
use crate::storage::{ContainerId, ProvStore};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Nodes already saved in one container: resolved identifier → stored identifier
type Declared = HashMap<QualifiedName, String>;

/// Drives a [`ProvStore`] to persist documents
pub struct Materializer<'s, S: ProvStore + ?Sized> {
    store: &'s S,
}

/// Per-call state shared by both passes
struct Run {
    document_id: ContainerId,
    /// Bundle identifier → bundle container
    bundles: HashMap<QualifiedName, ContainerId>,
    declared: HashMap<ContainerId, Declared>,
}

impl<'s, S: ProvStore + ?Sized> Materializer<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Persist `document` and return its root container id.
    ///
    /// The first failing save aborts the call; records saved before it stay
    /// in the store.
    pub fn materialize(&self, document: &Document) -> ProvResult<ContainerId> {
        let document_id = self.store.save_document()?;
        debug!(document = %document_id, bundles = document.bundles().len(), "materializing document");

        let mut run = Run {
            document_id: document_id.clone(),
            bundles: HashMap::new(),
            declared: HashMap::new(),
        };
        run.declared.insert(document_id.clone(), Declared::new());

        // Pass 1: containers, elements, relations
        for bundle in document.bundles() {
            self.save_bundle_entity(&mut run, bundle)?;
        }

        self.save_container(&mut run, &document_id, document.records(), &document.scope())?;

        for bundle in document.bundles() {
            let Some(bundle_qn) = bundle.identifier() else { continue };
            let container_id = run.bundles[bundle_qn].clone();
            let scope = document.scope_for(bundle);
            self.save_container(&mut run, &container_id, bundle.records(), &scope)?;
            self.save_memberships(&run, &container_id, bundle_qn, bundle, &scope)?;
        }

        // Pass 2: mention links across containers
        self.save_mentions(&mut run, &document_id, document.records(), &document.scope())?;
        for bundle in document.bundles() {
            let Some(bundle_qn) = bundle.identifier() else { continue };
            let container_id = run.bundles[bundle_qn].clone();
            self.save_mentions(&mut run, &container_id, bundle.records(), &document.scope_for(bundle))?;
        }

        debug!(document = %document_id, "document materialized");
        Ok(document_id)
    }

    fn save_bundle_entity(&self, run: &mut Run, bundle: &Bundle) -> ProvResult<()> {
        let bundle_qn = bundle.identifier().ok_or_else(|| {
            ProvError::InvalidArgumentType("bundle without identifier".to_string())
        })?;
        if run.bundles.contains_key(bundle_qn) {
            return Err(ProvError::InvalidArgumentType(format!(
                "duplicate bundle {}",
                bundle_qn
            )));
        }

        let Extracted { metadata, attributes } = metadata::bundle_entity(bundle_qn);
        let container_id = self
            .store
            .save_bundle(&run.document_id, &attributes, &metadata)?;
        debug!(bundle = %bundle_qn, container = %container_id, "saved bundle");

        run.declared
            .entry(run.document_id.clone())
            .or_default()
            .insert(bundle_qn.clone(), metadata.identifier);
        run.declared.insert(container_id.clone(), Declared::new());
        run.bundles.insert(bundle_qn.clone(), container_id);
        Ok(())
    }

    /// Pass 1 for one container: every element, then every relation except
    /// mention links
    fn save_container(
        &self,
        run: &mut Run,
        container_id: &ContainerId,
        records: &[Record],
        scope: &NamespaceScope<'_>,
    ) -> ProvResult<()> {
        for record in records.iter().filter(|r| r.kind().is_element()) {
            let Extracted { metadata, attributes } = metadata::extract(record, scope)?;
            let resolved = resolved_identifier(record, scope)?;
            self.store.save_record(container_id, &attributes, &metadata)?;
            run.declared
                .entry(container_id.clone())
                .or_default()
                .insert(resolved, metadata.identifier);
        }

        for record in records
            .iter()
            .filter(|r| r.kind().is_relation() && r.kind() != RecordKind::Mention)
        {
            let Extracted { metadata, attributes } = metadata::extract(record, scope)?;
            let from = self.endpoint(run, container_id, record.from_endpoint(), scope)?;
            let to = self.endpoint(run, container_id, record.to_endpoint(), scope)?;
            self.store.save_relation(
                container_id,
                &from,
                container_id,
                &to,
                &attributes,
                &metadata,
            )?;
        }
        Ok(())
    }

    /// Link every element of a bundle to the bundle's entity node
    fn save_memberships(
        &self,
        run: &Run,
        container_id: &ContainerId,
        bundle_qn: &QualifiedName,
        bundle: &Bundle,
        scope: &NamespaceScope<'_>,
    ) -> ProvResult<()> {
        let bundle_identifier = metadata::bundle_entity_identifier(bundle_qn);
        let Extracted { metadata, attributes } = metadata::bundle_membership();
        let declared = run.declared.get(container_id);

        for record in bundle.elements() {
            let resolved = resolved_identifier(record, scope)?;
            let Some(element) = declared.and_then(|d| d.get(&resolved)) else {
                continue;
            };
            self.store.save_relation(
                container_id,
                element,
                &run.document_id,
                &bundle_identifier,
                &attributes,
                &metadata,
            )?;
        }
        Ok(())
    }

    /// Pass 2 for one container
    fn save_mentions(
        &self,
        run: &mut Run,
        container_id: &ContainerId,
        records: &[Record],
        scope: &NamespaceScope<'_>,
    ) -> ProvResult<()> {
        for record in records.iter().filter(|r| r.kind() == RecordKind::Mention) {
            let Extracted { metadata, attributes } = metadata::extract(record, scope)?;

            let target_bundle = record
                .formal(FormalAttribute::Bundle)
                .and_then(|v| v.as_ref_identifier())
                .and_then(|id| scope.resolve(id));
            let target_container = match target_bundle
                .as_ref()
                .and_then(|qn| run.bundles.get(qn))
            {
                Some(id) => id.clone(),
                None => {
                    warn!(
                        bundle = ?target_bundle.as_ref().map(|qn| qn.to_string()),
                        "mention target bundle is not part of the document; linking to a placeholder"
                    );
                    container_id.clone()
                }
            };

            let from = self.endpoint(run, container_id, record.from_endpoint(), scope)?;
            let to = self.endpoint(run, &target_container, record.to_endpoint(), scope)?;
            self.store.save_relation(
                container_id,
                &from,
                &target_container,
                &to,
                &attributes,
                &metadata,
            )?;
        }
        Ok(())
    }

    /// Stored identifier of a relation endpoint in `container_id`, saving a
    /// placeholder node when the endpoint is unspecified or not declared there
    fn endpoint(
        &self,
        run: &mut Run,
        container_id: &ContainerId,
        endpoint: Option<&Identifier>,
        scope: &NamespaceScope<'_>,
    ) -> ProvResult<String> {
        let qn = match endpoint {
            Some(id) => scope.resolve(id).ok_or_else(|| {
                ProvError::InvalidProvRecord(format!("cannot resolve relation endpoint {}", id))
            })?,
            None => QualifiedName::prov(format!(
                "{}{}",
                vocab::UNKNOWN_IDENTIFIER_PREFIX,
                Uuid::new_v4()
            )),
        };

        let declared = run.declared.entry(container_id.clone()).or_default();
        if let Some(identifier) = declared.get(&qn) {
            return Ok(identifier.clone());
        }

        let Extracted { metadata, attributes } = metadata::placeholder(&qn);
        self.store.save_record(container_id, &attributes, &metadata)?;
        debug!(container = %container_id, identifier = %metadata.identifier, "saved placeholder node");
        declared.insert(qn, metadata.identifier.clone());
        Ok(metadata.identifier)
    }
}

/// The qualified identifier an element is declared under
fn resolved_identifier(record: &Record, scope: &NamespaceScope<'_>) -> ProvResult<QualifiedName> {
    match record.identifier() {
        Some(id) => scope.resolve(id).ok_or_else(|| {
            ProvError::InvalidProvRecord(format!("cannot resolve identifier {}", id))
        }),
        None => Ok(record.kind().prov_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SyntheticKind};

    fn example_document() -> Document {
        let mut doc = Document::new();
        doc.add_namespace("ex", "http://example.org/");
        doc
    }

    #[test]
    fn test_elements_and_relations_saved() {
        let mut doc = example_document();
        doc.add_record(Record::entity("ex:e1"));
        doc.add_record(Record::activity("ex:a1"));
        doc.add_record(Record::relation(RecordKind::Generation, "ex:e1", "ex:a1"));

        let store = MemoryStore::new();
        let id = Materializer::new(&store).materialize(&doc).unwrap();
        assert_eq!(store.node_count(&id), 2);
        assert_eq!(store.edge_count(&id), 1);
    }

    #[test]
    fn test_missing_endpoint_gets_one_placeholder() {
        let mut doc = example_document();
        doc.add_record(Record::entity("ex:e1"));
        doc.add_record(Record::new(RecordKind::Generation).with_formal(FormalAttribute::Entity, "ex:e1"));

        let store = MemoryStore::new();
        let id = Materializer::new(&store).materialize(&doc).unwrap();

        let raw = store.get_document(&id).unwrap();
        let unknown: Vec<_> = raw
            .records
            .iter()
            .filter(|r| r.metadata.prov_type == "prov:Unknown")
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].metadata.synthetic, Some(SyntheticKind::Placeholder));
        assert!(unknown[0].metadata.identifier.starts_with("prov:Unknown-"));
    }

    #[test]
    fn test_undeclared_endpoint_placeholder_is_shared() {
        let mut doc = example_document();
        doc.add_record(Record::entity("ex:e1"));
        doc.add_record(Record::relation(RecordKind::Derivation, "ex:e1", "ex:elsewhere"));
        doc.add_record(Record::relation(RecordKind::Alternate, "ex:e1", "ex:elsewhere"));

        let store = MemoryStore::new();
        let id = Materializer::new(&store).materialize(&doc).unwrap();
        assert_eq!(store.node_count(&id), 2);
        assert_eq!(store.edge_count(&id), 2);
    }

    #[test]
    fn test_bundle_members_link_to_bundle_entity() {
        let mut doc = example_document();
        let b1 = doc.qualified_name("ex:b1").unwrap();
        doc.add_bundle(
            Bundle::new(b1)
                .with_record(Record::entity("ex:e1"))
                .with_record(Record::agent("ex:ag"))
                .with_record(Record::relation(RecordKind::Attribution, "ex:e1", "ex:ag")),
        );
        // A top-level relation can point at the bundle itself
        doc.add_record(Record::agent("ex:publisher"));
        doc.add_record(Record::relation(RecordKind::Attribution, "ex:b1", "ex:publisher"));

        let store = MemoryStore::new();
        let id = Materializer::new(&store).materialize(&doc).unwrap();
        let raw = store.get_document(&id).unwrap();

        assert_eq!(raw.bundles.len(), 1);
        let memberships = raw.bundles[0]
            .records
            .iter()
            .filter(|r| r.metadata.synthetic == Some(SyntheticKind::BundleMembership))
            .count();
        assert_eq!(memberships, 2);
        // bundle entity node and the publisher, no placeholder
        assert_eq!(store.node_count(&id), 2);
    }

    #[test]
    fn test_bad_identifier_aborts() {
        let mut doc = example_document();
        doc.add_record(Record::entity("not:a:resolvable:value"));

        let store = MemoryStore::new();
        let result = Materializer::new(&store).materialize(&doc);
        assert!(matches!(result, Err(ProvError::InvalidProvRecord(_))));
    }
}
