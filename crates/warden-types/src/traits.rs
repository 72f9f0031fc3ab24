//! Collaborator traits: event source, record store, classification and identity policies.

use crate::{LogRecord, RawEvent, ReadDirection, SessionAction};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Append-only audit log that can be opened by name.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Acquire a read handle to the named log.
    async fn open(&self, source_name: &str) -> Result<Box<dyn EventHandle>, EventSourceError>;
}

/// Sequential read handle returned by [`EventSource::open`].
#[async_trait]
pub trait EventHandle: Send {
    /// Return zero or more events appended since the previous read, ordered per `direction`.
    async fn read(&mut self, direction: ReadDirection) -> Result<Vec<RawEvent>, EventSourceError>;
}

/// Durable sink for session records, one file per principal.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record. Must be flushed before returning; no buffering across calls.
    async fn append(&self, record: &LogRecord) -> Result<(), RecordStoreError>;
}

/// Maps an event code to a session action.
pub trait EventClassifier: Send + Sync {
    fn classify(&self, event_code: u32) -> SessionAction;
}

/// Resolves a principal from an event's string payload.
///
/// Never fails: implementations degrade to [`crate::UNKNOWN_PRINCIPAL`].
pub trait IdentityExtractor: Send + Sync {
    fn extract(&self, string_fields: &[String]) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("cannot open event source {name}: {reason}")]
    Open { name: String, reason: String },
    #[error("event source read failed: {0}")]
    Read(String),
    #[error("event source read timed out after {0:?}")]
    Timeout(Duration),
    #[error("event source io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record store error: {0}")]
    Other(String),
}
