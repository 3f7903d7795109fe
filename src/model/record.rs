//! Provenance records: elements and relations

use super::qualified_name::{Identifier, QualifiedName};
use super::value::AttributeValue;
use super::vocab::prov;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use std::fmt;

/// Positional (formal) attributes prescribed by the PROV record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormalAttribute {
    Entity,
    Activity,
    Agent,
    Time,
    StartTime,
    EndTime,
    Informed,
    Informant,
    Trigger,
    Starter,
    Ender,
    GeneratedEntity,
    UsedEntity,
    Generation,
    Usage,
    Plan,
    Delegate,
    Responsible,
    Influencee,
    Influencer,
    Alternate1,
    Alternate2,
    SpecificEntity,
    GeneralEntity,
    Bundle,
    Collection,
}

impl FormalAttribute {
    /// Local name in the PROV namespace
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Activity => "activity",
            Self::Agent => "agent",
            Self::Time => "time",
            Self::StartTime => "startTime",
            Self::EndTime => "endTime",
            Self::Informed => "informed",
            Self::Informant => "informant",
            Self::Trigger => "trigger",
            Self::Starter => "starter",
            Self::Ender => "ender",
            Self::GeneratedEntity => "generatedEntity",
            Self::UsedEntity => "usedEntity",
            Self::Generation => "generation",
            Self::Usage => "usage",
            Self::Plan => "plan",
            Self::Delegate => "delegate",
            Self::Responsible => "responsible",
            Self::Influencee => "influencee",
            Self::Influencer => "influencer",
            Self::Alternate1 => "alternate1",
            Self::Alternate2 => "alternate2",
            Self::SpecificEntity => "specificEntity",
            Self::GeneralEntity => "generalEntity",
            Self::Bundle => "bundle",
            Self::Collection => "collection",
        }
    }

    /// The attribute key, e.g. `prov:entity`
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::prov(self.local_name())
    }

    /// Whether the attribute holds a timestamp rather than a record reference
    pub fn is_time(&self) -> bool {
        matches!(self, Self::Time | Self::StartTime | Self::EndTime)
    }
}

/// Record kinds: the three PROV elements, the PROV relations, and the two
/// kinds used only for storage (`Bundle` entity nodes and `Unknown`
/// placeholders)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Entity,
    Activity,
    Agent,
    Generation,
    Usage,
    Communication,
    Start,
    End,
    Invalidation,
    Derivation,
    Attribution,
    Association,
    Delegation,
    Influence,
    Alternate,
    Specialization,
    Mention,
    Membership,
    Bundle,
    Unknown,
}

impl RecordKind {
    /// Every kind that can appear in a document
    pub const DOCUMENT_KINDS: [RecordKind; 18] = [
        Self::Entity,
        Self::Activity,
        Self::Agent,
        Self::Generation,
        Self::Usage,
        Self::Communication,
        Self::Start,
        Self::End,
        Self::Invalidation,
        Self::Derivation,
        Self::Attribution,
        Self::Association,
        Self::Delegation,
        Self::Influence,
        Self::Alternate,
        Self::Specialization,
        Self::Mention,
        Self::Membership,
    ];

    /// Local name of the PROV type, e.g. `Generation`
    pub fn type_local_name(&self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Activity => "Activity",
            Self::Agent => "Agent",
            Self::Generation => "Generation",
            Self::Usage => "Usage",
            Self::Communication => "Communication",
            Self::Start => "Start",
            Self::End => "End",
            Self::Invalidation => "Invalidation",
            Self::Derivation => "Derivation",
            Self::Attribution => "Attribution",
            Self::Association => "Association",
            Self::Delegation => "Delegation",
            Self::Influence => "Influence",
            Self::Alternate => "Alternate",
            Self::Specialization => "Specialization",
            Self::Mention => "Mention",
            Self::Membership => "Membership",
            Self::Bundle => prov::BUNDLE,
            Self::Unknown => prov::UNKNOWN,
        }
    }

    /// The record's PROV type, e.g. `prov:Generation`
    pub fn prov_type(&self) -> QualifiedName {
        QualifiedName::prov(self.type_local_name())
    }

    /// Name used by PROV-N and PROV-JSON, e.g. `wasGeneratedBy`
    pub fn notation_name(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Activity => "activity",
            Self::Agent => "agent",
            Self::Generation => "wasGeneratedBy",
            Self::Usage => "used",
            Self::Communication => "wasInformedBy",
            Self::Start => "wasStartedBy",
            Self::End => "wasEndedBy",
            Self::Invalidation => "wasInvalidatedBy",
            Self::Derivation => "wasDerivedFrom",
            Self::Attribution => "wasAttributedTo",
            Self::Association => "wasAssociatedWith",
            Self::Delegation => "actedOnBehalfOf",
            Self::Influence => "wasInfluencedBy",
            Self::Alternate => "alternateOf",
            Self::Specialization => "specializationOf",
            Self::Mention => "mentionOf",
            Self::Membership => "hadMember",
            Self::Bundle => "bundle",
            Self::Unknown => "unknown",
        }
    }

    /// Formal attributes in positional order
    pub fn formal_attributes(&self) -> &'static [FormalAttribute] {
        use FormalAttribute as F;
        match self {
            Self::Entity | Self::Agent | Self::Bundle | Self::Unknown => &[],
            Self::Activity => &[F::StartTime, F::EndTime],
            Self::Generation => &[F::Entity, F::Activity, F::Time],
            Self::Usage => &[F::Activity, F::Entity, F::Time],
            Self::Communication => &[F::Informed, F::Informant],
            Self::Start => &[F::Activity, F::Trigger, F::Starter, F::Time],
            Self::End => &[F::Activity, F::Trigger, F::Ender, F::Time],
            Self::Invalidation => &[F::Entity, F::Activity, F::Time],
            Self::Derivation => &[
                F::GeneratedEntity,
                F::UsedEntity,
                F::Activity,
                F::Generation,
                F::Usage,
            ],
            Self::Attribution => &[F::Entity, F::Agent],
            Self::Association => &[F::Activity, F::Agent, F::Plan],
            Self::Delegation => &[F::Delegate, F::Responsible, F::Activity],
            Self::Influence => &[F::Influencee, F::Influencer],
            Self::Alternate => &[F::Alternate1, F::Alternate2],
            Self::Specialization => &[F::SpecificEntity, F::GeneralEntity],
            Self::Mention => &[F::SpecificEntity, F::GeneralEntity, F::Bundle],
            Self::Membership => &[F::Collection, F::Entity],
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Entity | Self::Activity | Self::Agent)
    }

    pub fn is_relation(&self) -> bool {
        !matches!(
            self,
            Self::Entity | Self::Activity | Self::Agent | Self::Bundle | Self::Unknown
        )
    }

    /// Look up a kind by its PROV type
    pub fn from_prov_type(prov_type: &QualifiedName) -> Option<Self> {
        if prov_type.namespace().uri() != prov::URI {
            return None;
        }
        let local = prov_type.local_part();
        Self::DOCUMENT_KINDS
            .into_iter()
            .chain([Self::Bundle, Self::Unknown])
            .find(|k| k.type_local_name() == local)
    }

    /// Look up a document kind by its PROV-N / PROV-JSON name
    pub fn from_notation_name(name: &str) -> Option<Self> {
        Self::DOCUMENT_KINDS
            .into_iter()
            .find(|k| k.notation_name() == name)
    }
}

/// Value of a formal attribute: a reference to another record or a time
#[derive(Debug, Clone, PartialEq)]
pub enum FormalValue {
    Ref(Identifier),
    Time(DateTime<FixedOffset>),
    /// `xsd:dateTime` written without a zone offset
    LocalTime(NaiveDateTime),
}

impl FormalValue {
    pub fn as_ref_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Ref(id) => Some(id),
            Self::Time(_) | Self::LocalTime(_) => None,
        }
    }

    /// Parse an `xsd:dateTime`; the zone offset is optional
    pub fn parse_time(text: &str) -> Result<Self, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(text) {
            Ok(dt) => Ok(Self::Time(dt)),
            Err(e) => text
                .parse::<NaiveDateTime>()
                .map(Self::LocalTime)
                .map_err(|_| e),
        }
    }
}

impl fmt::Display for FormalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ref(id) => write!(f, "{}", id),
            Self::Time(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Self::LocalTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<Identifier> for FormalValue {
    fn from(id: Identifier) -> Self {
        Self::Ref(id)
    }
}

impl From<QualifiedName> for FormalValue {
    fn from(qn: QualifiedName) -> Self {
        Self::Ref(Identifier::Qualified(qn))
    }
}

impl From<&QualifiedName> for FormalValue {
    fn from(qn: &QualifiedName) -> Self {
        Self::Ref(Identifier::Qualified(qn.clone()))
    }
}

impl From<&str> for FormalValue {
    fn from(s: &str) -> Self {
        Self::Ref(Identifier::from(s))
    }
}

impl From<DateTime<FixedOffset>> for FormalValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::Time(dt)
    }
}

impl From<NaiveDateTime> for FormalValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::LocalTime(dt)
    }
}

/// A provenance record
///
/// Relations may be anonymous (`identifier` is `None`). Formal attributes
/// are stored positionally according to [`RecordKind::formal_attributes`];
/// any other attribute holds a single value per key.
#[derive(Debug, Clone)]
pub struct Record {
    kind: RecordKind,
    identifier: Option<Identifier>,
    formal: Vec<Option<FormalValue>>,
    attributes: Vec<(Identifier, AttributeValue)>,
}

impl Record {
    /// Create an empty, anonymous record of the given kind
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            identifier: None,
            formal: vec![None; kind.formal_attributes().len()],
            attributes: Vec::new(),
        }
    }

    pub fn entity(identifier: impl Into<Identifier>) -> Self {
        Self::new(RecordKind::Entity).with_identifier(identifier)
    }

    pub fn activity(identifier: impl Into<Identifier>) -> Self {
        Self::new(RecordKind::Activity).with_identifier(identifier)
    }

    pub fn agent(identifier: impl Into<Identifier>) -> Self {
        Self::new(RecordKind::Agent).with_identifier(identifier)
    }

    /// Create an anonymous relation with its first two formal attributes set
    pub fn relation(
        kind: RecordKind,
        from: impl Into<FormalValue>,
        to: impl Into<FormalValue>,
    ) -> Self {
        let mut record = Self::new(kind);
        let formal = kind.formal_attributes();
        if formal.len() >= 2 {
            record.formal[0] = Some(from.into());
            record.formal[1] = Some(to.into());
        }
        record
    }

    /// `mentionOf(specific, general, bundle)`
    pub fn mention_of(
        specific: impl Into<FormalValue>,
        general: impl Into<FormalValue>,
        bundle: impl Into<FormalValue>,
    ) -> Self {
        Self::relation(RecordKind::Mention, specific, general)
            .with_formal(FormalAttribute::Bundle, bundle)
    }

    pub fn with_identifier(mut self, identifier: impl Into<Identifier>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set a formal attribute; ignored if the kind does not have it
    pub fn with_formal(mut self, attribute: FormalAttribute, value: impl Into<FormalValue>) -> Self {
        self.set_formal(attribute, Some(value.into()));
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<Identifier>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set or clear a formal attribute.
    ///
    /// Returns `false` if the record's kind has no such attribute.
    pub fn set_formal(&mut self, attribute: FormalAttribute, value: Option<FormalValue>) -> bool {
        match self
            .kind
            .formal_attributes()
            .iter()
            .position(|a| *a == attribute)
        {
            Some(idx) => {
                self.formal[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Set an attribute, replacing any previous value under the same key
    pub fn set_attribute(&mut self, key: impl Into<Identifier>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn formal(&self, attribute: FormalAttribute) -> Option<&FormalValue> {
        self.kind
            .formal_attributes()
            .iter()
            .position(|a| *a == attribute)
            .and_then(|idx| self.formal[idx].as_ref())
    }

    /// Formal attributes in positional order, including unset ones
    pub fn formal_attributes(&self) -> impl Iterator<Item = (FormalAttribute, Option<&FormalValue>)> {
        self.kind
            .formal_attributes()
            .iter()
            .copied()
            .zip(self.formal.iter().map(Option::as_ref))
    }

    /// The relation's source (first formal attribute)
    pub fn from_endpoint(&self) -> Option<&Identifier> {
        if !self.kind.is_relation() {
            return None;
        }
        self.formal.first()?.as_ref()?.as_ref_identifier()
    }

    /// The relation's target (second formal attribute)
    pub fn to_endpoint(&self) -> Option<&Identifier> {
        if !self.kind.is_relation() {
            return None;
        }
        self.formal.get(1)?.as_ref()?.as_ref_identifier()
    }

    pub fn attributes(&self) -> &[(Identifier, AttributeValue)] {
        &self.attributes
    }

    pub fn attribute(&self, key: &QualifiedName) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k.as_qualified() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Attribute order is not significant
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.identifier == other.identifier
            && self.formal == other.formal
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|entry| other.attributes.contains(entry))
    }
}
