//! Typed attribute values

use super::qualified_name::QualifiedName;
use super::vocab::xsd;
use chrono::{DateTime, FixedOffset};

/// A literal with an explicit datatype, optionally language-tagged
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: QualifiedName,
    pub langtag: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>, datatype: QualifiedName) -> Self {
        Self {
            value: value.into(),
            datatype,
            langtag: None,
        }
    }

    /// A language-tagged string
    pub fn with_lang(value: impl Into<String>, langtag: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: QualifiedName::prov(super::vocab::prov::INTERNATIONALIZED_STRING),
            langtag: Some(langtag.into()),
        }
    }
}

/// The value of a record attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Plain string; also used for `prefix:local` text that was not given as
    /// a qualified name
    String(String),
    QualifiedName(QualifiedName),
    DateTime(DateTime<FixedOffset>),
    Literal(Literal),
}

impl AttributeValue {
    /// Build a value from a literal, canonicalizing `xsd:dateTime` literals
    /// that parse into [`AttributeValue::DateTime`].
    pub fn literal(literal: Literal) -> Self {
        if literal.langtag.is_none() && literal.datatype == QualifiedName::xsd(xsd::DATE_TIME) {
            if let Ok(dt) = DateTime::parse_from_rfc3339(&literal.value) {
                return Self::DateTime(dt);
            }
        }
        Self::Literal(literal)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_qualified_name(&self) -> Option<&QualifiedName> {
        match self {
            Self::QualifiedName(qn) => Some(qn),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<QualifiedName> for AttributeValue {
    fn from(qn: QualifiedName) -> Self {
        Self::QualifiedName(qn)
    }
}

impl From<DateTime<FixedOffset>> for AttributeValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Literal> for AttributeValue {
    fn from(literal: Literal) -> Self {
        Self::literal(literal)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Literal(Literal::new(n.to_string(), QualifiedName::xsd(xsd::INT)))
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Literal(Literal::new(n.to_string(), QualifiedName::xsd(xsd::DOUBLE)))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::new(b.to_string(), QualifiedName::xsd(xsd::BOOLEAN)))
    }
}
