//! PROV-JSON
//!
//! A document is an object with an optional `prefix` block, one object per
//! record kind keyed by identifier, and an optional `bundle` object holding
//! nested documents. Typed values are written as `{"$": value, "type": tag}`
//! and language-tagged strings as `{"$": value, "lang": tag}`.

use super::FormatError;
use crate::model::vocab::{prov, xsd};
use crate::model::{
    AttributeValue, Bundle, Document, FormalValue, Identifier, Literal,
    NamespaceScope, NamespaceTable, QualifiedName, Record, RecordKind,
};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

const PREFIX_KEY: &str = "prefix";
const BUNDLE_KEY: &str = "bundle";
const DEFAULT_PREFIX: &str = "default";
const ANONYMOUS_PREFIX: &str = "_:";

// === Parsing ===

pub(super) fn parse(text: &str) -> Result<Document, FormatError> {
    let value: Value = serde_json::from_str(text)?;
    let object = as_object(&value, "document")?;

    let mut document = Document::new();
    if let Some(prefixes) = object.get(PREFIX_KEY) {
        read_prefixes(prefixes, document.namespaces_mut())?;
    }

    let records = read_records(object, &document.scope())?;
    for record in records {
        document.add_record(record);
    }

    if let Some(bundles) = object.get(BUNDLE_KEY) {
        for (name, content) in as_object(bundles, "bundle block")? {
            let content = as_object(content, name)?;
            let identifier = document
                .qualified_name(name)
                .ok_or_else(|| FormatError::Invalid(format!("unresolvable bundle identifier {}", name)))?;

            let mut bundle = Bundle::new(identifier);
            if let Some(prefixes) = content.get(PREFIX_KEY) {
                read_prefixes(prefixes, bundle.namespaces_mut())?;
            }
            let records = read_records(content, &document.scope_for(&bundle))?;
            for record in records {
                bundle.add_record(record);
            }
            document.add_bundle(bundle);
        }
    }

    Ok(document)
}

fn as_object<'v>(value: &'v Value, what: &str) -> Result<&'v Map<String, Value>, FormatError> {
    value
        .as_object()
        .ok_or_else(|| FormatError::Invalid(format!("{} must be a JSON object", what)))
}

fn as_str<'v>(value: &'v Value, what: &str) -> Result<&'v str, FormatError> {
    value
        .as_str()
        .ok_or_else(|| FormatError::Invalid(format!("{} must be a string", what)))
}

fn read_prefixes(value: &Value, table: &mut NamespaceTable) -> Result<(), FormatError> {
    for (prefix, uri) in as_object(value, PREFIX_KEY)? {
        let uri = as_str(uri, prefix)?;
        if prefix == DEFAULT_PREFIX {
            table.set_default(uri);
        } else {
            table.add(prefix.as_str(), uri);
        }
    }
    Ok(())
}

/// Resolve when possible; unresolvable text is kept so extraction can
/// report it against the record
fn identifier(text: &str, scope: &NamespaceScope<'_>) -> Identifier {
    match scope.resolve_str(text) {
        Some(qn) => Identifier::Qualified(qn),
        None => Identifier::Text(text.to_string()),
    }
}

fn read_records(container: &Map<String, Value>, scope: &NamespaceScope<'_>) -> Result<Vec<Record>, FormatError> {
    let mut records = Vec::new();
    for (kind_name, entries) in container {
        if kind_name == PREFIX_KEY || kind_name == BUNDLE_KEY {
            continue;
        }
        let kind = RecordKind::from_notation_name(kind_name)
            .ok_or_else(|| FormatError::Invalid(format!("unknown record kind {}", kind_name)))?;

        for (id, body) in as_object(entries, kind_name)? {
            let mut record = Record::new(kind);
            if !id.starts_with(ANONYMOUS_PREFIX) {
                record = record.with_identifier(identifier(id, scope));
            }
            read_attributes(&mut record, as_object(body, id)?, scope)?;
            records.push(record);
        }
    }
    Ok(records)
}

fn read_attributes(
    record: &mut Record,
    attributes: &Map<String, Value>,
    scope: &NamespaceScope<'_>,
) -> Result<(), FormatError> {
    for (key, value) in attributes {
        let formal = record
            .kind()
            .formal_attributes()
            .iter()
            .copied()
            .find(|a| key == &a.qualified_name().to_string());

        match formal {
            Some(attribute) => {
                let text = as_str(value, key)?;
                let value = if attribute.is_time() {
                    FormalValue::parse_time(text).map_err(|e| {
                        FormatError::Invalid(format!("invalid {} {}: {}", key, text, e))
                    })?
                } else {
                    FormalValue::Ref(identifier(text, scope))
                };
                record.set_formal(attribute, Some(value));
            }
            None => {
                let value = read_value(value, key, scope)?;
                record.set_attribute(identifier(key, scope), value);
            }
        }
    }
    Ok(())
}

fn read_value(value: &Value, key: &str, scope: &NamespaceScope<'_>) -> Result<AttributeValue, FormatError> {
    match value {
        Value::String(s) => Ok(AttributeValue::String(s.clone())),
        Value::Bool(b) => Ok(AttributeValue::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(AttributeValue::from(i)),
            None => Ok(AttributeValue::Literal(Literal::new(
                n.to_string(),
                QualifiedName::xsd(xsd::DOUBLE),
            ))),
        },
        Value::Object(typed) => read_typed_value(typed, key, scope),
        Value::Array(_) => Err(FormatError::Invalid(format!(
            "multi-valued attribute {} is not supported",
            key
        ))),
        Value::Null => Err(FormatError::Invalid(format!("attribute {} is null", key))),
    }
}

fn read_typed_value(
    typed: &Map<String, Value>,
    key: &str,
    scope: &NamespaceScope<'_>,
) -> Result<AttributeValue, FormatError> {
    let text = match typed.get("$") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => {
            return Err(FormatError::Invalid(format!(
                "typed value of {} needs a \"$\" entry",
                key
            )))
        }
    };

    if let Some(lang) = typed.get("lang") {
        return Ok(AttributeValue::Literal(Literal::with_lang(text, as_str(lang, "lang")?)));
    }

    let Some(tag) = typed.get("type") else {
        return Ok(AttributeValue::String(text));
    };
    let tag = as_str(tag, "type")?;
    let datatype = scope
        .resolve_str(tag)
        .ok_or_else(|| FormatError::Invalid(format!("unresolvable datatype {}", tag)))?;

    if datatype == QualifiedName::prov(prov::QUALIFIED_NAME) || datatype == QualifiedName::xsd("QName") {
        let qn = scope
            .resolve_str(&text)
            .ok_or_else(|| FormatError::Invalid(format!("unresolvable qualified name {}", text)))?;
        return Ok(AttributeValue::QualifiedName(qn));
    }

    Ok(AttributeValue::literal(Literal::new(text, datatype)))
}

// === Serialization ===

pub(super) fn serialize(document: &Document) -> Result<String, FormatError> {
    let mut anonymous = 0usize;
    let mut root = write_container(document.root(), &mut anonymous);

    if !document.bundles().is_empty() {
        let mut bundles = Map::new();
        for bundle in document.bundles() {
            let Some(identifier) = bundle.identifier() else { continue };
            bundles.insert(
                identifier.to_string(),
                Value::Object(write_container(bundle, &mut anonymous)),
            );
        }
        root.insert(BUNDLE_KEY.to_string(), Value::Object(bundles));
    }

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

fn write_container(bundle: &Bundle, anonymous: &mut usize) -> Map<String, Value> {
    let mut container = Map::new();

    let namespaces = bundle.namespaces();
    if !namespaces.is_empty() {
        let mut prefixes = Map::new();
        for namespace in namespaces.iter() {
            prefixes.insert(namespace.prefix().to_string(), Value::String(namespace.uri().to_string()));
        }
        if let Some(default) = namespaces.default_namespace() {
            prefixes.insert(DEFAULT_PREFIX.to_string(), Value::String(default.uri().to_string()));
        }
        container.insert(PREFIX_KEY.to_string(), Value::Object(prefixes));
    }

    for record in bundle.records() {
        if !RecordKind::DOCUMENT_KINDS.contains(&record.kind()) {
            continue;
        }
        let id = match record.identifier() {
            Some(id) => id.to_string(),
            None => {
                *anonymous += 1;
                format!("{}id{}", ANONYMOUS_PREFIX, anonymous)
            }
        };

        let entries = container
            .entry(record.kind().notation_name().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(entries) = entries {
            entries.insert(id, Value::Object(write_attributes(record)));
        }
    }

    container
}

fn write_attributes(record: &Record) -> Map<String, Value> {
    let mut attributes = Map::new();
    for (attribute, value) in record.formal_attributes() {
        let Some(value) = value else { continue };
        attributes.insert(attribute.qualified_name().to_string(), write_formal(value));
    }
    for (key, value) in record.attributes() {
        attributes.insert(key.to_string(), write_value(value));
    }
    attributes
}

fn write_formal(value: &FormalValue) -> Value {
    Value::String(value.to_string())
}

fn typed(value: String, tag: &str) -> Value {
    let mut object = Map::new();
    object.insert("$".to_string(), Value::String(value));
    object.insert("type".to_string(), Value::String(tag.to_string()));
    Value::Object(object)
}

fn write_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::String(s) => Value::String(s.clone()),
        AttributeValue::QualifiedName(qn) => typed(
            qn.to_string(),
            &QualifiedName::prov(prov::QUALIFIED_NAME).to_string(),
        ),
        AttributeValue::DateTime(dt) => typed(
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            &QualifiedName::xsd(xsd::DATE_TIME).to_string(),
        ),
        AttributeValue::Literal(literal) => match &literal.langtag {
            Some(lang) => {
                let mut object = Map::new();
                object.insert("$".to_string(), Value::String(literal.value.clone()));
                object.insert("lang".to_string(), Value::String(lang.clone()));
                Value::Object(object)
            }
            None => typed(literal.value.clone(), &literal.datatype.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormalAttribute;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "prefix": {"ex": "http://example.org/"},
        "entity": {
            "ex:e1": {
                "prov:label": {"$": "report", "lang": "en"},
                "ex:size": 42,
                "ex:ratio": 0.5,
                "ex:final": true,
                "ex:kind": {"$": "ex:Report", "type": "prov:QUALIFIED_NAME"},
                "ex:note": "plain"
            }
        },
        "activity": {
            "ex:a1": {"prov:startTime": "2011-11-16T16:05:00+01:00"}
        },
        "wasGeneratedBy": {
            "_:id1": {"prov:entity": "ex:e1", "prov:activity": "ex:a1"}
        },
        "bundle": {
            "ex:b1": {
                "prefix": {"local": "http://local.org/"},
                "entity": {"local:x": {}}
            }
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.records().len(), 3);

        let ex = doc.namespaces().get("ex").unwrap().clone();
        let entity = doc.records().iter().find(|r| r.kind() == RecordKind::Entity).unwrap();
        assert_eq!(entity.identifier(), Some(&Identifier::from(ex.qualified("e1"))));
        assert_eq!(entity.attribute(&ex.qualified("size")), Some(&AttributeValue::from(42_i64)));
        assert_eq!(entity.attribute(&ex.qualified("final")), Some(&AttributeValue::from(true)));
        assert_eq!(
            entity.attribute(&ex.qualified("kind")),
            Some(&AttributeValue::QualifiedName(ex.qualified("Report")))
        );
        assert_eq!(
            entity.attribute(&QualifiedName::prov("label")),
            Some(&AttributeValue::Literal(Literal::with_lang("report", "en")))
        );

        let generation = doc.records().iter().find(|r| r.kind() == RecordKind::Generation).unwrap();
        assert!(generation.identifier().is_none());
        assert_eq!(generation.from_endpoint(), Some(&Identifier::from(ex.qualified("e1"))));

        let bundle = &doc.bundles()[0];
        assert_eq!(bundle.identifier(), Some(&ex.qualified("b1")));
        assert_eq!(bundle.record_count(), 1);
    }

    #[test]
    fn test_serialize_then_parse_preserves_document() {
        let doc = parse(SAMPLE).unwrap();
        let text = serialize(&doc).unwrap();
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_serialize_shape() {
        let mut doc = Document::new();
        let ex = doc.add_namespace("ex", "http://example.org/");
        doc.add_record(Record::entity(ex.qualified("e1")).with_attribute(ex.qualified("v"), ex.qualified("x")));
        doc.add_record(Record::relation(RecordKind::Usage, ex.qualified("a1"), ex.qualified("e1")));

        let value: Value = serde_json::from_str(&serialize(&doc).unwrap()).unwrap();
        assert_eq!(value["prefix"], json!({"ex": "http://example.org/"}));
        assert_eq!(
            value["entity"]["ex:e1"]["ex:v"],
            json!({"$": "ex:x", "type": "prov:QUALIFIED_NAME"})
        );
        assert_eq!(
            value["used"]["_:id1"],
            json!({"prov:activity": "ex:a1", "prov:entity": "ex:e1"})
        );
    }

    #[test]
    fn test_rejects_multi_valued_attributes() {
        let text = r#"{"prefix": {"ex": "http://example.org/"}, "entity": {"ex:e": {"ex:v": [1, 2]}}}"#;
        assert!(matches!(parse(text), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_kind_and_bad_json() {
        assert!(matches!(parse(r#"{"thing": {}}"#), Err(FormatError::Invalid(_))));
        assert!(matches!(parse("{not json"), Err(FormatError::Json(_))));
        assert!(matches!(parse("[]"), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn test_times_without_offset() {
        let text = r#"{
            "prefix": {"ex": "http://example.org/"},
            "activity": {
                "ex:a": {
                    "prov:startTime": "2012-03-31T09:21:00",
                    "prov:endTime": "2012-04-01T15:21:00.250"
                }
            }
        }"#;
        let doc = parse(text).unwrap();
        let activity = &doc.records()[0];
        let start = chrono::NaiveDate::from_ymd_opt(2012, 3, 31)
            .and_then(|d| d.and_hms_opt(9, 21, 0))
            .unwrap();
        assert_eq!(
            activity.formal(FormalAttribute::StartTime),
            Some(&FormalValue::LocalTime(start))
        );

        let value: Value = serde_json::from_str(&serialize(&doc).unwrap()).unwrap();
        assert_eq!(
            value["activity"]["ex:a"],
            json!({
                "prov:startTime": "2012-03-31T09:21:00",
                "prov:endTime": "2012-04-01T15:21:00.250"
            })
        );
        assert_eq!(parse(&value.to_string()).unwrap(), doc);

        let bad = r#"{"activity": {"ex:a": {"prov:startTime": "yesterday"}}}"#;
        assert!(matches!(parse(bad), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn test_unresolvable_identifier_is_kept_as_text() {
        let doc = parse(r#"{"entity": {"not:a:resolvable:value": {}}}"#).unwrap();
        assert_eq!(
            doc.records()[0].identifier(),
            Some(&Identifier::from("not:a:resolvable:value"))
        );
    }
}
