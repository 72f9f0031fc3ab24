//! In-memory record store (process lifetime only).

use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_types::{LogRecord, RecordStore, RecordStoreError};

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<LogRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in append order.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.read().await.clone()
    }

    /// Records for one principal in append order.
    pub async fn records_for(&self, principal: &str) -> Vec<LogRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.principal == principal)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(&self, record: &LogRecord) -> Result<(), RecordStoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
