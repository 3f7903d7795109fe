//! Public entry point.
//!
//! `ProvApi` ties a storage backend, a format codec and the mapping engine
//! together. Callers hand it documents (or serialized documents) and get back
//! the id of the stored document; reading goes the other way.

use std::sync::Arc;

use tracing::{info, info_span, Dispatch};
use uuid::Uuid;

use crate::config::{ApiConfig, ConfigError};
use crate::format::{BuiltinCodec, Format, FormatCodec};
use crate::mapping::{Materializer, ProvError, ProvResult, Reconstructor};
use crate::model::Document;
use crate::storage::{ContainerId, ProvStore};

/// Stores and retrieves PROV documents
#[derive(Clone)]
pub struct ProvApi {
    api_id: Uuid,
    store: Arc<dyn ProvStore>,
    codec: Arc<dyn FormatCodec>,
    /// Scoped logging from [`ApiConfig::log`]; the global subscriber
    /// otherwise
    dispatch: Option<Dispatch>,
}

impl ProvApi {
    /// Create an API over `store` using the built-in format codec
    pub fn new(store: Arc<dyn ProvStore>, config: ApiConfig) -> Result<Self, ConfigError> {
        Self::with_codec(store, Arc::new(BuiltinCodec), config)
    }

    /// Create an API with a custom format codec
    pub fn with_codec(
        store: Arc<dyn ProvStore>,
        codec: Arc<dyn FormatCodec>,
        config: ApiConfig,
    ) -> Result<Self, ConfigError> {
        let dispatch = config.log.as_ref().map(|log| log.dispatch()).transpose()?;
        Ok(Self {
            api_id: config.api_id.unwrap_or_else(Uuid::new_v4),
            store,
            codec,
            dispatch,
        })
    }

    pub fn api_id(&self) -> Uuid {
        self.api_id
    }

    /// Run an operation inside its span, under the configured subscriber
    fn run<T>(&self, operation: &str, f: impl FnOnce() -> ProvResult<T>) -> ProvResult<T> {
        let call = || {
            let span = info_span!("prov_api", api_id = %self.api_id, operation);
            let _guard = span.enter();
            f()
        };
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, call),
            None => call(),
        }
    }

    // --- Write ---

    /// Store a document and return its id
    pub fn create_document(&self, document: &Document) -> ProvResult<ContainerId> {
        self.run("create_document", || {
            let id = Materializer::new(self.store.as_ref()).materialize(document)?;
            info!(document = %id, bundles = document.bundles().len(), "document created");
            Ok(id)
        })
    }

    /// Parse a serialized document, guessing its format, and store it
    pub fn create_document_from_str(&self, text: &str) -> ProvResult<ContainerId> {
        self.create_document_from(text, Format::detect(text))
    }

    pub fn create_document_from_json(&self, text: &str) -> ProvResult<ContainerId> {
        self.create_document_from(text, Format::Json)
    }

    pub fn create_document_from_xml(&self, text: &str) -> ProvResult<ContainerId> {
        self.create_document_from(text, Format::Xml)
    }

    pub fn create_document_from_provn(&self, text: &str) -> ProvResult<ContainerId> {
        self.create_document_from(text, Format::Provn)
    }

    /// Parse `text` as `format` and store it.
    ///
    /// Parse failures are reported as `InvalidArgumentType`.
    pub fn create_document_from(&self, text: &str, format: Format) -> ProvResult<ContainerId> {
        let document = self.run("parse_document", || {
            self.codec.parse(text, format).map_err(|e| {
                ProvError::InvalidArgumentType(format!("cannot read {} document: {}", format, e))
            })
        })?;
        self.create_document(&document)
    }

    // --- Read ---

    /// Load a stored document
    pub fn get_document(&self, id: &ContainerId) -> ProvResult<Document> {
        self.run("get_document", || {
            if id.as_str().trim().is_empty() {
                return Err(ProvError::InvalidArgumentType(
                    "document id must not be empty".to_string(),
                ));
            }
            let raw = self.store.get_document(id)?;
            let document = Reconstructor::new().reconstruct(raw)?;
            info!(document = %id, records = document.records().len(), "document loaded");
            Ok(document)
        })
    }

    /// Load a stored document and serialize it
    pub fn get_document_as(&self, id: &ContainerId, format: Format) -> ProvResult<String> {
        let document = self.get_document(id)?;
        self.run("serialize_document", || {
            self.codec
                .serialize(&document, format)
                .map_err(ProvError::Format)
        })
    }

    pub fn get_document_as_json(&self, id: &ContainerId) -> ProvResult<String> {
        self.get_document_as(id, Format::Json)
    }

    pub fn get_document_as_xml(&self, id: &ContainerId) -> ProvResult<String> {
        self.get_document_as(id, Format::Xml)
    }

    pub fn get_document_as_provn(&self, id: &ContainerId) -> ProvResult<String> {
        self.get_document_as(id, Format::Provn)
    }

    /// Ids of all stored documents
    pub fn list_documents(&self) -> ProvResult<Vec<ContainerId>> {
        self.run("list_documents", || Ok(self.store.list_documents()?))
    }
}
