//! Document fixtures

use chrono::DateTime;
use provgraph::{
    Bundle, Document, FormalAttribute, Literal, Namespace, Record, RecordKind,
};

pub fn example_namespace() -> Namespace {
    Namespace::new("ex", "http://example.org/")
}

/// Entity, activity and a generation between them
pub fn simple_document() -> Document {
    let mut doc = Document::new();
    let ex = doc.add_namespace("ex", "http://example.org/");
    doc.add_record(Record::entity(ex.qualified("e1")));
    doc.add_record(Record::activity(ex.qualified("a1")));
    doc.add_record(Record::relation(
        RecordKind::Generation,
        ex.qualified("e1"),
        ex.qualified("a1"),
    ));
    doc
}

/// Top-level records with every attribute value type, two bundles, a
/// relation between the bundles and a mention link from one bundle into
/// the other
pub fn rich_document() -> Document {
    let mut doc = Document::new();
    let ex = doc.add_namespace("ex", "http://example.org/");
    let foaf = doc.add_namespace("foaf", "http://xmlns.com/foaf/0.1/");

    let started = DateTime::parse_from_rfc3339("2014-06-23T12:28:53.858+03:00").unwrap();
    let ended = DateTime::parse_from_rfc3339("2014-06-23T14:00:00Z").unwrap();

    doc.add_record(
        Record::entity(ex.qualified("report"))
            .with_attribute(ex.qualified("title"), "Quarterly report")
            .with_attribute(ex.qualified("pages"), 12_i64)
            .with_attribute(ex.qualified("ratio"), 0.25_f64)
            .with_attribute(ex.qualified("final"), true)
            .with_attribute(ex.qualified("kind"), foaf.qualified("Document"))
            .with_attribute(ex.qualified("published"), ended)
            .with_attribute(
                ex.qualified("summary"),
                Literal::with_lang("Rapport trimestriel", "fr"),
            )
            .with_attribute(
                ex.qualified("weight"),
                Literal::new("1.2 kg", ex.qualified("mass")),
            ),
    );
    doc.add_record(
        Record::activity(ex.qualified("compile"))
            .with_formal(FormalAttribute::StartTime, started)
            .with_formal(FormalAttribute::EndTime, ended),
    );
    doc.add_record(Record::agent(ex.qualified("alice")).with_attribute(ex.qualified("role"), "author"));
    doc.add_record(
        Record::relation(RecordKind::Generation, ex.qualified("report"), ex.qualified("compile"))
            .with_formal(FormalAttribute::Time, ended),
    );
    doc.add_record(
        Record::relation(RecordKind::Association, ex.qualified("compile"), ex.qualified("alice"))
            .with_identifier(ex.qualified("assoc1"))
            .with_attribute(ex.qualified("hadRole"), "editor"),
    );
    doc.add_record(Record::relation(
        RecordKind::Attribution,
        ex.qualified("report"),
        ex.qualified("alice"),
    ));
    // Relation between the two bundles
    doc.add_record(Record::relation(
        RecordKind::Derivation,
        ex.qualified("b2"),
        ex.qualified("b1"),
    ));

    doc.add_bundle(
        Bundle::new(ex.qualified("b1"))
            .with_record(Record::entity(ex.qualified("draft")))
            .with_record(Record::agent(ex.qualified("bob")))
            .with_record(Record::relation(
                RecordKind::Attribution,
                ex.qualified("draft"),
                ex.qualified("bob"),
            )),
    );
    doc.add_bundle(
        Bundle::new(ex.qualified("b2"))
            .with_record(Record::entity(ex.qualified("final")))
            .with_record(Record::mention_of(
                ex.qualified("final"),
                ex.qualified("draft"),
                ex.qualified("b1"),
            )),
    );

    doc
}
