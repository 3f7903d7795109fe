//! Mapping between PROV documents and stored graph records
//!
//! [`Materializer`] writes a [`Document`](crate::model::Document) into a
//! [`ProvStore`](crate::storage::ProvStore); [`Reconstructor`] reads it back.
//! Both go through the same metadata extraction and value codec, so a
//! document survives the round trip with its types, identifiers and bundles.

pub mod codec;
mod error;
pub mod metadata;
mod materialize;
mod reconstruct;

pub use error::{ProvError, ProvResult};
pub use materialize::Materializer;
pub use metadata::{extract, Extracted};
pub use reconstruct::Reconstructor;
