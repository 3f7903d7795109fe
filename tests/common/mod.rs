//! Shared helpers for provgraph integration tests
//!
//! Document fixtures covering every value type, bundles and cross-bundle
//! links, and a store wrapper that records the order of save calls.

#![allow(dead_code)]

pub mod fixtures;
pub mod recording;

pub use fixtures::{example_namespace, rich_document, simple_document};
pub use recording::{Call, RecordingStore};
