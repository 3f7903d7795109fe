//! Qualified names, namespaces and identifier resolution
//!
//! Every identifier comparison in the crate goes through [`QualifiedName`],
//! which compares by expanded URI. Raw text identifiers are turned into
//! qualified names by a [`NamespaceScope`].

use super::vocab::{prov, xsd};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A namespace: a prefix bound to a URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    prefix: String,
    uri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// The PROV namespace (`prov:`)
    pub fn prov() -> Self {
        Self::new(prov::PREFIX, prov::URI)
    }

    /// The XML Schema namespace (`xsd:`)
    pub fn xsd() -> Self {
        Self::new(xsd::PREFIX, xsd::URI)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Qualify a local name in this namespace
    pub fn qualified(&self, local_part: impl Into<String>) -> QualifiedName {
        QualifiedName::new(self.clone(), local_part)
    }
}

/// An identifier resolved to (prefix, namespace URI, local part)
///
/// Equality, ordering and hashing use the expanded URI only; two names with
/// different prefixes bound to the same URI are the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifiedName {
    namespace: Namespace,
    local_part: String,
}

impl QualifiedName {
    pub fn new(namespace: Namespace, local_part: impl Into<String>) -> Self {
        Self {
            namespace,
            local_part: local_part.into(),
        }
    }

    /// A name in the PROV namespace
    pub fn prov(local_part: impl Into<String>) -> Self {
        Self::new(Namespace::prov(), local_part)
    }

    /// A name in the XSD namespace
    pub fn xsd(local_part: impl Into<String>) -> Self {
        Self::new(Namespace::xsd(), local_part)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        &self.namespace.prefix
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The expanded URI (namespace URI followed by the local part)
    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace.uri, self.local_part)
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QualifiedName {}

impl PartialOrd for QualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualifiedName {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.namespace.uri.bytes().chain(self.local_part.bytes());
        let rhs = other.namespace.uri.bytes().chain(other.local_part.bytes());
        lhs.cmp(rhs)
    }
}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri().hash(state);
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.prefix.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{}:{}", self.namespace.prefix, self.local_part)
        }
    }
}

/// An identifier as supplied by a caller: already qualified, or raw text
/// (`prefix:local` or a full URI) still to be resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Qualified(QualifiedName),
    Text(String),
}

impl Identifier {
    /// The qualified name, if this identifier is already resolved
    pub fn as_qualified(&self) -> Option<&QualifiedName> {
        match self {
            Self::Qualified(qn) => Some(qn),
            Self::Text(_) => None,
        }
    }
}

impl From<QualifiedName> for Identifier {
    fn from(qn: QualifiedName) -> Self {
        Self::Qualified(qn)
    }
}

impl From<&QualifiedName> for Identifier {
    fn from(qn: &QualifiedName) -> Self {
        Self::Qualified(qn.clone())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qualified(qn) => write!(f, "{}", qn),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Prefix → namespace bindings, with an optional default namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    by_prefix: BTreeMap<String, Namespace>,
    default: Option<Namespace>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`, replacing any previous binding of the prefix
    pub fn add(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Namespace {
        let namespace = Namespace::new(prefix, uri);
        self.by_prefix
            .insert(namespace.prefix.clone(), namespace.clone());
        namespace
    }

    /// Register a namespace unless its prefix is already bound.
    ///
    /// Returns `true` if the namespace was added. The built-in `prov` and
    /// `xsd` namespaces are never registered since they always resolve.
    pub fn register(&mut self, namespace: &Namespace) -> bool {
        if is_builtin(namespace) || self.by_prefix.contains_key(&namespace.prefix) {
            return false;
        }
        self.by_prefix
            .insert(namespace.prefix.clone(), namespace.clone());
        true
    }

    /// Set the default namespace used for names without a prefix
    pub fn set_default(&mut self, uri: impl Into<String>) {
        self.default = Some(Namespace::new("", uri));
    }

    pub fn default_namespace(&self) -> Option<&Namespace> {
        self.default.as_ref()
    }

    pub fn get(&self, prefix: &str) -> Option<&Namespace> {
        self.by_prefix.get(prefix)
    }

    /// Iterate over the prefixed bindings in prefix order
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.by_prefix.values()
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty() && self.default.is_none()
    }
}

fn is_builtin(namespace: &Namespace) -> bool {
    (namespace.prefix == prov::PREFIX && namespace.uri == prov::URI)
        || (namespace.prefix == xsd::PREFIX && namespace.uri == xsd::URI)
}

/// A stack of namespace tables used to resolve identifiers.
///
/// Tables are consulted most specific first (a record's own namespaces, then
/// its bundle, then the document); the `prov` and `xsd` namespaces resolve
/// in every scope.
#[derive(Debug, Clone)]
pub struct NamespaceScope<'a> {
    layers: Vec<&'a NamespaceTable>,
}

impl<'a> NamespaceScope<'a> {
    pub fn new(table: &'a NamespaceTable) -> Self {
        Self {
            layers: vec![table],
        }
    }

    /// Consult `table` after every table already in the scope
    pub fn with_fallback(mut self, table: &'a NamespaceTable) -> Self {
        self.layers.push(table);
        self
    }

    /// Resolve an identifier to a qualified name.
    ///
    /// Already-qualified names pass through unchanged.
    pub fn resolve(&self, identifier: &Identifier) -> Option<QualifiedName> {
        match identifier {
            Identifier::Qualified(qn) => Some(qn.clone()),
            Identifier::Text(text) => self.resolve_str(text),
        }
    }

    /// Resolve `prefix:local`, a full URI, or (with a default namespace) a
    /// bare local name
    pub fn resolve_str(&self, text: &str) -> Option<QualifiedName> {
        if text.is_empty() || text.starts_with("_:") {
            return None;
        }

        if let Some((prefix, local)) = text.split_once(':') {
            if let Some(namespace) = self.lookup_prefix(prefix) {
                return Some(namespace.qualified(local));
            }
            if let Some(namespace) = self.lookup_uri(text) {
                let local = &text[namespace.uri.len()..];
                return Some(namespace.qualified(local));
            }
            return None;
        }

        self.layers
            .iter()
            .find_map(|t| t.default.as_ref())
            .map(|namespace| namespace.qualified(text))
    }

    /// Find the namespace bound to `prefix`
    pub fn lookup_prefix(&self, prefix: &str) -> Option<Namespace> {
        if let Some(namespace) = self.layers.iter().find_map(|t| t.get(prefix)) {
            return Some(namespace.clone());
        }
        match prefix {
            prov::PREFIX => Some(Namespace::prov()),
            xsd::PREFIX => Some(Namespace::xsd()),
            _ => None,
        }
    }

    /// Find the namespace whose URI is the longest prefix of `uri`
    fn lookup_uri(&self, uri: &str) -> Option<Namespace> {
        let builtins = [Namespace::prov(), Namespace::xsd()];
        self.layers
            .iter()
            .flat_map(|t| t.iter())
            .chain(builtins.iter())
            .filter(|ns| !ns.uri.is_empty() && uri.starts_with(ns.uri.as_str()))
            .max_by_key(|ns| ns.uri.len())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> NamespaceTable {
        let mut table = NamespaceTable::new();
        table.add("ex", "http://example.org/");
        table
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let table = example_table();
        let scope = NamespaceScope::new(&table);

        let qn = scope.resolve_str("ex:e1").unwrap();
        assert_eq!(qn.prefix(), "ex");
        assert_eq!(qn.local_part(), "e1");
        assert_eq!(qn.uri(), "http://example.org/e1");
        assert_eq!(qn.to_string(), "ex:e1");
    }

    #[test]
    fn test_resolve_builtin_namespaces_without_declaration() {
        let table = NamespaceTable::new();
        let scope = NamespaceScope::new(&table);

        assert_eq!(scope.resolve_str("prov:Entity"), Some(QualifiedName::prov("Entity")));
        assert_eq!(scope.resolve_str("xsd:int"), Some(QualifiedName::xsd("int")));
    }

    #[test]
    fn test_resolve_full_uri_uses_longest_namespace() {
        let mut table = example_table();
        table.add("exdata", "http://example.org/data/");
        let scope = NamespaceScope::new(&table);

        let qn = scope.resolve_str("http://example.org/data/d1").unwrap();
        assert_eq!(qn.prefix(), "exdata");
        assert_eq!(qn.local_part(), "d1");
    }

    #[test]
    fn test_resolve_unknown_prefix_fails() {
        let table = example_table();
        let scope = NamespaceScope::new(&table);

        assert!(scope.resolve_str("not:a:resolvable:value").is_none());
        assert!(scope.resolve_str("_:blank").is_none());
        assert!(scope.resolve_str("nocolon").is_none());
    }

    #[test]
    fn test_resolve_bare_name_with_default_namespace() {
        let mut table = NamespaceTable::new();
        table.set_default("http://default.org/");
        let scope = NamespaceScope::new(&table);

        let qn = scope.resolve_str("thing").unwrap();
        assert_eq!(qn.uri(), "http://default.org/thing");
        assert_eq!(qn.to_string(), "thing");
    }

    #[test]
    fn test_fallback_table_consulted_after_local() {
        let parent = example_table();
        let mut local = NamespaceTable::new();
        local.add("ex", "http://other.org/");
        local.add("b", "http://bundle.org/");

        let scope = NamespaceScope::new(&local).with_fallback(&parent);
        assert_eq!(scope.resolve_str("ex:x").unwrap().uri(), "http://other.org/x");

        let parent_only = NamespaceScope::new(&parent);
        assert!(parent_only.resolve_str("b:x").is_none());
    }

    #[test]
    fn test_qualified_identifier_passes_through() {
        let table = NamespaceTable::new();
        let scope = NamespaceScope::new(&table);
        let qn = Namespace::new("zz", "urn:zz:").qualified("a");

        assert_eq!(scope.resolve(&Identifier::from(&qn)), Some(qn));
    }

    #[test]
    fn test_equality_ignores_prefix() {
        let a = Namespace::new("a", "http://example.org/").qualified("x");
        let b = Namespace::new("b", "http://example.org/").qualified("x");
        let c = Namespace::new("c", "http://example.org/x").qualified("");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, Namespace::new("a", "http://example.org/").qualified("y"));
    }

    #[test]
    fn test_register_keeps_existing_binding() {
        let mut table = example_table();
        assert!(!table.register(&Namespace::new("ex", "http://elsewhere.org/")));
        assert_eq!(table.get("ex").unwrap().uri(), "http://example.org/");

        assert!(table.register(&Namespace::new("foaf", "http://xmlns.com/foaf/0.1/")));
        assert!(!table.register(&Namespace::prov()));
        assert_eq!(table.len(), 2);
    }
}
