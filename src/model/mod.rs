//! In-memory PROV document model

mod document;
mod qualified_name;
mod record;
mod value;
pub mod vocab;

pub use document::{Bundle, Document};
pub use qualified_name::{Identifier, Namespace, NamespaceScope, NamespaceTable, QualifiedName};
pub use record::{FormalAttribute, FormalValue, Record, RecordKind};
pub use value::{AttributeValue, Literal};
