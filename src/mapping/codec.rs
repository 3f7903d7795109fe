//! Attribute value encoding
//!
//! Storage backends only keep strings. Every non-string value is written as
//! its text form plus a type tag; the tag goes into the record's type-map and
//! brings the value back on read. Plain strings carry no tag.

use super::error::{ProvError, ProvResult};
use crate::model::vocab::{prov, xsd};
use crate::model::{AttributeValue, Literal, NamespaceScope, QualifiedName};
use chrono::{DateTime, SecondsFormat};

/// Encode a value as `(stored text, type tag)`
pub fn encode(value: &AttributeValue) -> (String, Option<QualifiedName>) {
    match value {
        AttributeValue::String(s) => (s.clone(), None),
        AttributeValue::QualifiedName(qn) => {
            (qn.to_string(), Some(QualifiedName::prov(prov::QUALIFIED_NAME)))
        }
        AttributeValue::DateTime(dt) => (
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            Some(QualifiedName::xsd(xsd::DATE_TIME)),
        ),
        AttributeValue::Literal(literal) => match &literal.langtag {
            Some(lang) => (
                format!("{}@{}", literal.value, lang),
                Some(QualifiedName::prov(prov::INTERNATIONALIZED_STRING)),
            ),
            None if literal.datatype == QualifiedName::prov(prov::INTERNATIONALIZED_STRING) => {
                (format!("{}@", literal.value), Some(literal.datatype.clone()))
            }
            None => (literal.value.clone(), Some(literal.datatype.clone())),
        },
    }
}

/// Decode a stored value using its type tag.
///
/// The tag and any qualified-name value are resolved in `scope`.
pub fn decode(value: &str, tag: Option<&str>, scope: &NamespaceScope<'_>) -> ProvResult<AttributeValue> {
    let Some(tag) = tag else {
        return Ok(AttributeValue::String(value.to_string()));
    };

    let datatype = scope
        .resolve_str(tag)
        .ok_or_else(|| ProvError::InvalidProvRecord(format!("unresolvable type tag {}", tag)))?;

    if datatype == QualifiedName::prov(prov::QUALIFIED_NAME) {
        let qn = scope.resolve_str(value).ok_or_else(|| {
            ProvError::InvalidProvRecord(format!("unresolvable qualified name {}", value))
        })?;
        return Ok(AttributeValue::QualifiedName(qn));
    }

    // Date-times without an offset stay typed literals, as on write
    if datatype == QualifiedName::xsd(xsd::DATE_TIME) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(AttributeValue::DateTime(dt));
        }
    }

    if datatype == QualifiedName::prov(prov::INTERNATIONALIZED_STRING) {
        return Ok(AttributeValue::Literal(match value.rsplit_once('@') {
            Some((text, "")) => Literal::new(text, datatype),
            Some((text, lang)) => Literal::with_lang(text, lang),
            None => Literal::new(value, datatype),
        }));
    }

    Ok(AttributeValue::Literal(Literal::new(value, datatype)))
}
