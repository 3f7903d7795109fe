//! PROV-N writer

use crate::model::{AttributeValue, Bundle, Document, Record, RecordKind};
use chrono::SecondsFormat;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render a document in PROV-N notation
pub(super) fn serialize(document: &Document) -> String {
    let mut out = String::from("document\n");
    write_body(&mut out, document.root(), 1);

    for bundle in document.bundles() {
        let Some(identifier) = bundle.identifier() else { continue };
        let _ = writeln!(out, "{}bundle {}", INDENT, identifier);
        write_body(&mut out, bundle, 2);
        let _ = writeln!(out, "{}endBundle", INDENT);
    }

    out.push_str("endDocument\n");
    out
}

fn write_body(out: &mut String, bundle: &Bundle, depth: usize) {
    let indent = INDENT.repeat(depth);
    let namespaces = bundle.namespaces();
    if let Some(default) = namespaces.default_namespace() {
        let _ = writeln!(out, "{}default <{}>", indent, default.uri());
    }
    for namespace in namespaces.iter() {
        let _ = writeln!(out, "{}prefix {} <{}>", indent, namespace.prefix(), namespace.uri());
    }

    for record in bundle.records() {
        if RecordKind::DOCUMENT_KINDS.contains(&record.kind()) {
            let _ = writeln!(out, "{}{}", indent, statement(record));
        }
    }
}

/// One statement, e.g. `wasGeneratedBy(ex:g; ex:e1, ex:a1, -, [ex:k="v"])`
fn statement(record: &Record) -> String {
    let mut args: Vec<String> = Vec::new();
    for (_, value) in record.formal_attributes() {
        args.push(match value {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        });
    }

    if !record.attributes().is_empty() {
        let attributes: Vec<String> = record
            .attributes()
            .iter()
            .map(|(key, value)| format!("{}={}", key, literal(value)))
            .collect();
        args.push(format!("[{}]", attributes.join(", ")));
    }

    let name = record.kind().notation_name();
    match (record.identifier(), record.kind().is_element()) {
        (Some(id), true) if args.is_empty() => format!("{}({})", name, id),
        (Some(id), true) => format!("{}({}, {})", name, id, args.join(", ")),
        (Some(id), false) => format!("{}({}; {})", name, id, args.join(", ")),
        (None, _) => format!("{}({})", name, args.join(", ")),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn literal(value: &AttributeValue) -> String {
    match value {
        AttributeValue::String(s) => quoted(s),
        AttributeValue::QualifiedName(qn) => format!("'{}'", qn),
        AttributeValue::DateTime(dt) => format!(
            "{} %% xsd:dateTime",
            quoted(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        ),
        AttributeValue::Literal(literal) => match &literal.langtag {
            Some(lang) => format!("{}@{}", quoted(&literal.value), lang),
            None => format!("{} %% {}", quoted(&literal.value), literal.datatype),
        },
    }
}
