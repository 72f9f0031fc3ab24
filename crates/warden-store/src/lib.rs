//! Record stores: one append-only text file per principal, or an in-memory list for tests.

mod file;
mod memory;

pub use file::{sanitize_principal, FileRecordStore};
pub use memory::InMemoryRecordStore;
pub use warden_types::{LogRecord, RecordStore, RecordStoreError};
