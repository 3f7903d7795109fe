//! Record metadata extraction
//!
//! Flattens a record into the string-keyed attributes a backend stores, plus
//! the [`Metadata`] needed to bring its type, identifier, namespaces and
//! value types back.

use super::codec;
use super::error::{ProvError, ProvResult};
use crate::model::vocab::{self, prov};
use crate::model::{
    AttributeValue, FormalValue, Identifier, NamespaceScope, QualifiedName, Record, RecordKind,
};
use crate::storage::{Metadata, StoredAttributes, SyntheticKind};
use std::collections::BTreeMap;

/// A record in storage form
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub metadata: Metadata,
    pub attributes: StoredAttributes,
}

/// Prefix → URI of every namespace a record touches
#[derive(Debug, Default)]
struct NamespacesUsed(BTreeMap<String, String>);

impl NamespacesUsed {
    fn note(&mut self, qn: &QualifiedName) {
        self.0
            .entry(qn.prefix().to_string())
            .or_insert_with(|| qn.namespace().uri().to_string());
    }
}

fn resolve(scope: &NamespaceScope<'_>, identifier: &Identifier, what: &str) -> ProvResult<QualifiedName> {
    scope.resolve(identifier).ok_or_else(|| {
        ProvError::InvalidProvRecord(format!("cannot resolve {} {}", what, identifier))
    })
}

/// Compute the stored attributes and metadata of `record`.
///
/// Identifiers, attribute keys and formal references are resolved in
/// `scope`; anything that does not resolve is an `InvalidProvRecord`.
pub fn extract(record: &Record, scope: &NamespaceScope<'_>) -> ProvResult<Extracted> {
    let mut used = NamespacesUsed::default();

    let prov_type = record.kind().prov_type();
    used.note(&prov_type);

    let identifier = match record.identifier() {
        Some(id) => resolve(scope, id, "identifier")?,
        None => prov_type.clone(),
    };
    used.note(&identifier);

    let mut attributes = StoredAttributes::new();
    let mut type_map = BTreeMap::new();

    // Formal attributes: references and times, never type-mapped
    for (attribute, value) in record.formal_attributes() {
        let Some(value) = value else { continue };
        let key = attribute.qualified_name().to_string();
        let stored = match value {
            FormalValue::Ref(id) => {
                let qn = resolve(scope, id, attribute.local_name())?;
                used.note(&qn);
                qn.to_string()
            }
            time => time.to_string(),
        };
        attributes.insert(key, stored);
    }

    for (key, value) in record.attributes() {
        let key_qn = resolve(scope, key, "attribute key")?;
        let key = key_qn.to_string();
        if attributes.contains_key(&key) {
            return Err(ProvError::InvalidProvRecord(format!(
                "attribute {} clashes with a formal attribute of {}",
                key,
                prov_type
            )));
        }
        used.note(&key_qn);

        match value {
            // Recorded for its namespace only; the value stays a string
            AttributeValue::String(s) => {
                if let Some(qn) = scope.resolve_str(s) {
                    used.note(&qn);
                }
            }
            AttributeValue::QualifiedName(qn) => used.note(qn),
            AttributeValue::Literal(literal) => used.note(&literal.datatype),
            AttributeValue::DateTime(_) => {}
        }

        let (stored, tag) = codec::encode(value);
        if let Some(tag) = tag {
            used.note(&tag);
            type_map.insert(key.clone(), tag.to_string());
        }
        attributes.insert(key, stored);
    }

    Ok(Extracted {
        metadata: Metadata {
            prov_type: prov_type.to_string(),
            identifier: identifier.to_string(),
            namespaces: used.0,
            type_map,
            synthetic: None,
        },
        attributes,
    })
}

/// Placeholder node standing in for a missing relation endpoint
pub fn placeholder(identifier: &QualifiedName) -> Extracted {
    let mut used = NamespacesUsed::default();
    let prov_type = RecordKind::Unknown.prov_type();
    used.note(&prov_type);
    used.note(identifier);

    Extracted {
        metadata: Metadata {
            prov_type: prov_type.to_string(),
            identifier: identifier.to_string(),
            namespaces: used.0,
            type_map: BTreeMap::new(),
            synthetic: Some(SyntheticKind::Placeholder),
        },
        attributes: StoredAttributes::new(),
    }
}

/// Identifier of the entity node of the bundle named `bundle`
pub fn bundle_entity_identifier(bundle: &QualifiedName) -> String {
    format!("{}{}", vocab::BUNDLE_IDENTIFIER_PREFIX, bundle)
}

/// Entity node representing a bundle in its document
pub fn bundle_entity(bundle: &QualifiedName) -> Extracted {
    let mut used = NamespacesUsed::default();
    let prov_type = RecordKind::Bundle.prov_type();
    used.note(&prov_type);
    used.note(bundle);

    let mut attributes = StoredAttributes::new();
    attributes.insert(
        QualifiedName::prov(prov::BUNDLE_NAME).to_string(),
        bundle.to_string(),
    );

    Extracted {
        metadata: Metadata {
            prov_type: prov_type.to_string(),
            identifier: bundle_entity_identifier(bundle),
            namespaces: used.0,
            type_map: BTreeMap::new(),
            synthetic: Some(SyntheticKind::BundleEntity),
        },
        attributes,
    }
}

/// `belongsToBundle` edge from a bundle element to its bundle
pub fn bundle_membership() -> Extracted {
    let mut used = NamespacesUsed::default();
    let prov_type = RecordKind::Association.prov_type();
    used.note(&prov_type);

    let mut attributes = StoredAttributes::new();
    attributes.insert(
        QualifiedName::prov(prov::LABEL).to_string(),
        vocab::BELONGS_TO_BUNDLE.to_string(),
    );

    Extracted {
        metadata: Metadata {
            prov_type: prov_type.to_string(),
            identifier: prov_type.to_string(),
            namespaces: used.0,
            type_map: BTreeMap::new(),
            synthetic: Some(SyntheticKind::BundleMembership),
        },
        attributes,
    }
}
