//! PROV and XSD vocabulary constants
//!
//! Namespace URIs, record type names and the tags written into type-maps.

/// PROV namespace
pub mod prov {
    pub const PREFIX: &str = "prov";
    pub const URI: &str = "http://www.w3.org/ns/prov#";

    /// Type of records with no declared type (and of placeholder nodes)
    pub const UNKNOWN: &str = "Unknown";
    /// Type of the entity node standing in for a bundle
    pub const BUNDLE: &str = "Bundle";

    /// Attribute carrying a bundle's original identifier on its entity node
    pub const BUNDLE_NAME: &str = "bundle_name";
    pub const LABEL: &str = "label";
    pub const TYPE: &str = "type";

    /// Type tag for qualified-name attribute values
    pub const QUALIFIED_NAME: &str = "QUALIFIED_NAME";
    /// Datatype of language-tagged strings
    pub const INTERNATIONALIZED_STRING: &str = "InternationalizedString";
}

/// XSD namespace
pub mod xsd {
    pub const PREFIX: &str = "xsd";
    pub const URI: &str = "http://www.w3.org/2001/XMLSchema#";

    pub const STRING: &str = "string";
    pub const DATE_TIME: &str = "dateTime";
    pub const INT: &str = "int";
    pub const DOUBLE: &str = "double";
    pub const BOOLEAN: &str = "boolean";
}

/// Prefix of the synthetic identifier given to a bundle's entity node
pub const BUNDLE_IDENTIFIER_PREFIX: &str = "prov:bundle:";

/// Label carried by synthetic bundle-membership edges
pub const BELONGS_TO_BUNDLE: &str = "belongsToBundle";

/// Prefix of the identifiers generated for placeholder nodes
pub const UNKNOWN_IDENTIFIER_PREFIX: &str = "Unknown-";
