//! Pure policies applied to raw events: code classification and principal extraction.

mod classifier;
mod identity;

pub use classifier::{CodeTable, LOGOFF_EVENT_CODE, LOGON_EVENT_CODE};
pub use identity::{DomainSeparator, FieldIndex, IdentityPolicy, ParsePolicyError};
pub use warden_types::{EventClassifier, IdentityExtractor, SessionAction};
