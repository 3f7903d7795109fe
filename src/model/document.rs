//! Documents and bundles

use super::qualified_name::{Namespace, NamespaceScope, NamespaceTable, QualifiedName};
use super::record::Record;

/// A named collection of records with its own namespace declarations
///
/// The document root is a bundle without an identifier.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    identifier: Option<QualifiedName>,
    namespaces: NamespaceTable,
    records: Vec<Record>,
}

impl Bundle {
    /// Create an empty named bundle
    pub fn new(identifier: QualifiedName) -> Self {
        Self {
            identifier: Some(identifier),
            ..Default::default()
        }
    }

    /// The bundle's identifier (`None` for a document root)
    pub fn identifier(&self) -> Option<&QualifiedName> {
        self.identifier.as_ref()
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceTable {
        &mut self.namespaces
    }

    pub fn add_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Namespace {
        self.namespaces.add(prefix, uri)
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.add(prefix, uri);
        self
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Entities, activities and agents
    pub fn elements(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.kind().is_element())
    }

    pub fn relations(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.kind().is_relation())
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Two bundles are equal when they have the same identifier and the same
/// records, in any order. Namespace declarations are not compared.
impl PartialEq for Bundle {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && same_records(&self.records, &other.records)
    }
}

fn same_records(a: &[Record], b: &[Record]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut matched = vec![false; b.len()];
    a.iter().all(|record| {
        match (0..b.len()).find(|&i| !matched[i] && b[i] == *record) {
            Some(i) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}

/// A provenance document: top-level records plus zero or more bundles
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Bundle,
    bundles: Vec<Bundle>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.root.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceTable {
        &mut self.root.namespaces
    }

    pub fn add_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Namespace {
        self.root.add_namespace(prefix, uri)
    }

    pub fn set_default_namespace(&mut self, uri: impl Into<String>) {
        self.root.namespaces.set_default(uri);
    }

    /// Resolve `prefix:local` (or a URI) against the document's namespaces
    pub fn qualified_name(&self, text: &str) -> Option<QualifiedName> {
        self.scope().resolve_str(text)
    }

    /// Resolution scope for top-level records
    pub fn scope(&self) -> NamespaceScope<'_> {
        NamespaceScope::new(&self.root.namespaces)
    }

    /// Resolution scope for records of `bundle`: its own namespaces first,
    /// then the document's
    pub fn scope_for<'a>(&'a self, bundle: &'a Bundle) -> NamespaceScope<'a> {
        NamespaceScope::new(&bundle.namespaces).with_fallback(&self.root.namespaces)
    }

    /// Top-level records and namespaces, as a bundle without identifier
    pub fn root(&self) -> &Bundle {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Bundle {
        &mut self.root
    }

    pub fn add_record(&mut self, record: Record) {
        self.root.add_record(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.root.records
    }

    /// Add a bundle, replacing any bundle with the same identifier
    pub fn add_bundle(&mut self, bundle: Bundle) -> &mut Bundle {
        let idx = match self
            .bundles
            .iter()
            .position(|b| b.identifier == bundle.identifier)
        {
            Some(idx) => {
                self.bundles[idx] = bundle;
                idx
            }
            None => {
                self.bundles.push(bundle);
                self.bundles.len() - 1
            }
        };
        &mut self.bundles[idx]
    }

    /// Get the bundle named `identifier`, creating it if needed
    pub fn bundle_or_insert(&mut self, identifier: QualifiedName) -> &mut Bundle {
        match self
            .bundles
            .iter()
            .position(|b| b.identifier.as_ref() == Some(&identifier))
        {
            Some(idx) => &mut self.bundles[idx],
            None => {
                self.bundles.push(Bundle::new(identifier));
                let last = self.bundles.len() - 1;
                &mut self.bundles[last]
            }
        }
    }

    pub fn bundle(&self, identifier: &QualifiedName) -> Option<&Bundle> {
        self.bundles
            .iter()
            .find(|b| b.identifier.as_ref() == Some(identifier))
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.bundles.is_empty()
    }
}

/// Structural equality: same top-level records and the same bundles, in
/// any order
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.bundles.len() == other.bundles.len()
            && self.bundles.iter().all(|b| {
                b.identifier
                    .as_ref()
                    .and_then(|id| other.bundle(id))
                    .is_some_and(|ob| ob == b)
            })
    }
}
