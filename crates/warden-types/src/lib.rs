//! Core types and traits for the logwarden session agent.
//!
//! Raw events come from an [`EventSource`], are classified by an [`EventClassifier`], resolved to a
//! principal by an [`IdentityExtractor`] and appended through a [`RecordStore`].

mod dto;
mod lifecycle;
mod traits;

pub use dto::*;
pub use lifecycle::*;
pub use traits::*;
