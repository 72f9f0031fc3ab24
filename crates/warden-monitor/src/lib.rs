//! Session monitor: polls an event source, drops records already seen, classifies the rest and
//! appends session records per principal.

mod dedup;
mod poll;

pub use dedup::DedupWindow;
pub use poll::{MonitorConfig, MonitorError, PollOutcome, SessionMonitor};
