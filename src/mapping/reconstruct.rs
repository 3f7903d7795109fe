//! Rebuilding documents from stored records

use super::codec;
use super::error::{ProvError, ProvResult};
use crate::model::vocab;
use crate::model::{
    Bundle, Document, FormalValue, Identifier, Namespace, NamespaceScope, NamespaceTable,
    QualifiedName, Record, RecordKind,
};
use crate::storage::{RawBundle, RawDocument, RawRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Turns the raw records of a stored document back into a [`Document`]
#[derive(Debug, Default)]
pub struct Reconstructor;

impl Reconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild a document, dropping placeholder nodes, bundle entity nodes,
    /// membership edges and records typed `prov:Unknown`
    pub fn reconstruct(&self, raw: RawDocument) -> ProvResult<Document> {
        let mut document = Document::new();

        for stored in &raw.records {
            register_namespaces(document.namespaces_mut(), &stored.metadata.namespaces);
            let record = {
                let record_table = table_from(&stored.metadata.namespaces);
                let scope = NamespaceScope::new(&record_table).with_fallback(document.namespaces());
                self.record(stored, &scope)?
            };
            if let Some(record) = record {
                document.add_record(record);
            }
        }

        for raw_bundle in &raw.bundles {
            let bundle = self.bundle(&mut document, raw_bundle)?;
            document.add_bundle(bundle);
        }

        debug!(
            records = document.records().len(),
            bundles = document.bundles().len(),
            "document reconstructed"
        );
        Ok(document)
    }

    fn bundle(&self, document: &mut Document, raw: &RawBundle) -> ProvResult<Bundle> {
        let node = &raw.bundle_record.metadata;
        register_namespaces(document.namespaces_mut(), &node.namespaces);

        let name = node
            .identifier
            .strip_prefix(vocab::BUNDLE_IDENTIFIER_PREFIX)
            .or_else(|| bundle_name(raw))
            .ok_or_else(|| {
                ProvError::InvalidArgumentType(format!("not a bundle identifier: {}", node.identifier))
            })?;
        let node_table = table_from(&node.namespaces);
        let identifier = NamespaceScope::new(&node_table)
            .with_fallback(document.namespaces())
            .resolve_str(name)
            .ok_or_else(|| ProvError::InvalidProvRecord(format!("cannot resolve bundle {}", name)))?;

        let mut bundle = Bundle::new(identifier);
        for stored in &raw.records {
            register_namespaces(bundle.namespaces_mut(), &stored.metadata.namespaces);
            let record = {
                let record_table = table_from(&stored.metadata.namespaces);
                let scope = NamespaceScope::new(&record_table)
                    .with_fallback(bundle.namespaces())
                    .with_fallback(document.namespaces());
                self.record(stored, &scope)?
            };
            if let Some(record) = record {
                bundle.add_record(record);
            }
        }
        Ok(bundle)
    }

    /// Rebuild one record, or `None` for records that are not part of the
    /// document
    fn record(&self, stored: &RawRecord, scope: &NamespaceScope<'_>) -> ProvResult<Option<Record>> {
        let metadata = &stored.metadata;
        if metadata.synthetic.is_some() {
            return Ok(None);
        }

        let prov_type = scope.resolve_str(&metadata.prov_type).ok_or_else(|| {
            ProvError::InvalidArgumentType(format!("unresolvable record type {}", metadata.prov_type))
        })?;
        let kind = RecordKind::from_prov_type(&prov_type).ok_or_else(|| {
            ProvError::InvalidArgumentType(format!("unknown record type {}", prov_type))
        })?;
        match kind {
            // Not reconstructible faithfully
            RecordKind::Unknown => return Ok(None),
            RecordKind::Bundle => {
                return Err(ProvError::InvalidArgumentType(
                    "bundle node stored as a record".to_string(),
                ))
            }
            _ => {}
        }

        let identifier = scope.resolve_str(&metadata.identifier).ok_or_else(|| {
            ProvError::InvalidProvRecord(format!("cannot resolve identifier {}", metadata.identifier))
        })?;

        let mut record = Record::new(kind);
        if identifier != prov_type {
            record = record.with_identifier(identifier);
        }

        let mut formal_keys = Vec::new();
        for attribute in kind.formal_attributes() {
            let key = attribute.qualified_name().to_string();
            let Some(value) = stored.attributes.get(&key) else {
                formal_keys.push(key);
                continue;
            };
            let value = if attribute.is_time() {
                FormalValue::parse_time(value).map_err(|e| {
                    ProvError::InvalidProvRecord(format!("invalid {} {}: {}", key, value, e))
                })?
            } else {
                let qn = scope.resolve_str(value).ok_or_else(|| {
                    ProvError::InvalidProvRecord(format!("cannot resolve {} {}", key, value))
                })?;
                FormalValue::Ref(Identifier::Qualified(qn))
            };
            record.set_formal(*attribute, Some(value));
            formal_keys.push(key);
        }

        for (key, value) in &stored.attributes {
            if formal_keys.contains(key) {
                continue;
            }
            let key_qn = scope.resolve_str(key).ok_or_else(|| {
                ProvError::InvalidProvRecord(format!("cannot resolve attribute key {}", key))
            })?;
            let tag = metadata.type_map.get(key).map(String::as_str);
            let value = codec::decode(value, tag, scope)?;
            record.set_attribute(key_qn, value);
        }

        Ok(Some(record))
    }
}

/// Namespace table holding exactly the given bindings
fn table_from(namespaces: &BTreeMap<String, String>) -> NamespaceTable {
    let mut table = NamespaceTable::new();
    register_namespaces(&mut table, namespaces);
    table
}

/// Add bindings to `table`; prefixes already bound keep their URI and an
/// empty prefix becomes the default namespace if none is set
fn register_namespaces(table: &mut NamespaceTable, namespaces: &BTreeMap<String, String>) {
    for (prefix, uri) in namespaces {
        if prefix.is_empty() {
            if table.default_namespace().is_none() {
                table.set_default(uri.as_str());
            }
        } else {
            table.register(&Namespace::new(prefix.as_str(), uri.as_str()));
        }
    }
}

/// Bundle identifier recorded on a bundle's entity node
fn bundle_name(raw: &RawBundle) -> Option<&str> {
    raw.bundle_record
        .attributes
        .get(&QualifiedName::prov(vocab::prov::BUNDLE_NAME).to_string())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Materializer;
    use crate::model::{AttributeValue, FormalAttribute, Literal};
    use crate::storage::{Metadata, MemoryStore, ProvStore, StoredAttributes, SyntheticKind};
    use chrono::DateTime;

    fn example_document() -> Document {
        let mut doc = Document::new();
        doc.add_namespace("ex", "http://example.org/");
        doc
    }

    fn round_trip(doc: &Document) -> Document {
        let store = MemoryStore::new();
        let id = Materializer::new(&store).materialize(doc).unwrap();
        Reconstructor::new()
            .reconstruct(store.get_document(&id).unwrap())
            .unwrap()
    }

    #[test]
    fn test_round_trip_top_level_records() {
        let mut doc = example_document();
        let time = DateTime::parse_from_rfc3339("2014-06-23T12:28:53.858+03:00").unwrap();
        doc.add_record(
            Record::entity("ex:e1")
                .with_attribute("ex:size", 3_i64)
                .with_attribute("prov:label", Literal::with_lang("report", "en")),
        );
        doc.add_record(Record::activity("ex:a1").with_formal(FormalAttribute::StartTime, time));
        let writer = doc.qualified_name("ex:writer").unwrap();
        doc.add_record(
            Record::relation(RecordKind::Generation, "ex:e1", "ex:a1")
                .with_formal(FormalAttribute::Time, time)
                .with_attribute("ex:role", writer),
        );
        let doc = resolve_all(doc);

        let back = round_trip(&doc);
        assert_eq!(back, doc);
        let generation = back.records().iter().find(|r| r.kind() == RecordKind::Generation).unwrap();
        assert!(generation.identifier().is_none());
    }

    #[test]
    fn test_placeholders_and_memberships_are_dropped() {
        let mut doc = example_document();
        let b1 = doc.qualified_name("ex:b1").unwrap();
        doc.add_bundle(
            Bundle::new(b1)
                .with_record(Record::entity("ex:e1"))
                .with_record(Record::relation(RecordKind::Derivation, "ex:e1", "ex:absent")),
        );

        let back = round_trip(&doc);
        let bundle = &back.bundles()[0];
        assert_eq!(bundle.identifier().unwrap().to_string(), "ex:b1");
        assert_eq!(bundle.record_count(), 2);
        assert!(bundle.records().iter().all(|r| r.kind() != RecordKind::Unknown));
        assert!(bundle.records().iter().all(|r| r.kind() != RecordKind::Association));
        assert!(back.records().is_empty());
    }

    #[test]
    fn test_record_namespaces_take_precedence() {
        let attrs = StoredAttributes::from([("ex:v".to_string(), "ex:target".to_string())]);
        let metadata = |uri: &str, id: &str| Metadata {
            prov_type: "prov:Entity".into(),
            identifier: id.into(),
            namespaces: BTreeMap::from([("ex".to_string(), uri.to_string())]),
            type_map: BTreeMap::from([("ex:v".to_string(), "prov:QUALIFIED_NAME".to_string())]),
            synthetic: None,
        };

        let store = MemoryStore::new();
        let doc_id = store.save_document().unwrap();
        store.save_record(&doc_id, &attrs, &metadata("http://one.org/", "ex:a")).unwrap();
        store.save_record(&doc_id, &attrs, &metadata("http://two.org/", "ex:b")).unwrap();

        let doc = Reconstructor::new()
            .reconstruct(store.get_document(&doc_id).unwrap())
            .unwrap();
        let b = &doc.records()[1];
        let Some(Identifier::Qualified(id)) = b.identifier() else {
            panic!("expected qualified identifier");
        };
        assert_eq!(id.uri(), "http://two.org/b");
        let value = b.attributes()[0].1.as_qualified_name().unwrap();
        assert_eq!(value.uri(), "http://two.org/target");
    }

    #[test]
    fn test_unknown_typed_record_is_skipped() {
        let store = MemoryStore::new();
        let doc_id = store.save_document().unwrap();
        let metadata = Metadata {
            prov_type: "prov:Unknown".into(),
            identifier: "prov:lost".into(),
            namespaces: BTreeMap::new(),
            type_map: BTreeMap::new(),
            synthetic: None,
        };
        store.save_record(&doc_id, &StoredAttributes::new(), &metadata).unwrap();

        let doc = Reconstructor::new()
            .reconstruct(store.get_document(&doc_id).unwrap())
            .unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_unknown_type_is_invalid_argument() {
        let raw = RawDocument {
            records: vec![RawRecord {
                metadata: Metadata {
                    prov_type: "prov:Widget".into(),
                    identifier: "prov:w".into(),
                    namespaces: BTreeMap::new(),
                    type_map: BTreeMap::new(),
                    synthetic: None,
                },
                attributes: StoredAttributes::new(),
            }],
            bundles: Vec::new(),
        };
        assert!(matches!(
            Reconstructor::new().reconstruct(raw),
            Err(ProvError::InvalidArgumentType(_))
        ));
    }

    #[test]
    fn test_bundle_name_attribute() {
        let store = MemoryStore::new();
        let doc_id = store.save_document().unwrap();
        let metadata = Metadata {
            prov_type: "prov:Bundle".into(),
            identifier: "prov:bundle:ex:b".into(),
            namespaces: BTreeMap::from([("ex".to_string(), "http://example.org/".to_string())]),
            type_map: BTreeMap::new(),
            synthetic: Some(SyntheticKind::BundleEntity),
        };
        let attrs = StoredAttributes::from([("prov:bundle_name".to_string(), "ex:b".to_string())]);
        store.save_bundle(&doc_id, &attrs, &metadata).unwrap();

        let raw = store.get_document(&doc_id).unwrap();
        assert_eq!(bundle_name(&raw.bundles[0]), Some("ex:b"));
        let doc = Reconstructor::new().reconstruct(raw).unwrap();
        assert_eq!(doc.bundles()[0].identifier().unwrap().uri(), "http://example.org/b");
    }

    /// Reconstructed records carry qualified identifiers; build the expected
    /// document the same way
    fn resolve_all(doc: Document) -> Document {
        let scope = doc.scope();
        let mut resolved = Document::new();
        for ns in doc.namespaces().iter() {
            resolved.add_namespace(ns.prefix(), ns.uri());
        }
        for record in doc.records() {
            let mut out = Record::new(record.kind());
            if let Some(id) = record.identifier() {
                out = out.with_identifier(scope.resolve(id).unwrap());
            }
            for (attribute, value) in record.formal_attributes() {
                let value = value.map(|v| match v {
                    FormalValue::Ref(id) => FormalValue::from(scope.resolve(id).unwrap()),
                    other => other.clone(),
                });
                out.set_formal(attribute, value);
            }
            for (key, value) in record.attributes() {
                out.set_attribute(scope.resolve(key).unwrap(), value.clone());
            }
            resolved.add_record(out);
        }
        resolved
    }

    #[test]
    fn test_string_value_stays_string() {
        let mut doc = example_document();
        doc.add_record(Record::entity("ex:e").with_attribute("ex:ref", "ex:other"));
        let doc = resolve_all(doc);

        let back = round_trip(&doc);
        let value = &back.records()[0].attributes()[0].1;
        assert_eq!(value, &AttributeValue::from("ex:other"));
    }
}
