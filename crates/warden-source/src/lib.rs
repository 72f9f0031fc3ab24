//! Event sources for the session monitor.

mod journal;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use journal::{JournalEventSource, JournalHandle};
#[cfg(any(test, feature = "test-util"))]
pub use mock::ScriptedEventSource;
pub use warden_types::{EventHandle, EventSource, EventSourceError, RawEvent, ReadDirection};
