//! Principal extraction from an event's string payload.
//!
//! The payload layout belongs to the event source, so the mapping is a policy. The default
//! [`DomainSeparator`] heuristic takes the first `DOMAIN\user` looking field; [`FieldIndex`] reads
//! a fixed position for sources whose schema is known.

use std::str::FromStr;
use warden_types::{IdentityExtractor, UNKNOWN_PRINCIPAL};

/// First field containing `separator` is read as `DOMAIN<sep>user`; the principal is the text
/// after the last separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSeparator {
    separator: String,
}

impl DomainSeparator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for DomainSeparator {
    fn default() -> Self {
        Self::new("\\")
    }
}

impl IdentityExtractor for DomainSeparator {
    fn extract(&self, string_fields: &[String]) -> String {
        if self.separator.is_empty() {
            return UNKNOWN_PRINCIPAL.to_string();
        }
        string_fields
            .iter()
            .find(|f| f.contains(self.separator.as_str()))
            .and_then(|f| f.rsplit(self.separator.as_str()).next())
            .map(or_unknown)
            .unwrap_or_else(|| UNKNOWN_PRINCIPAL.to_string())
    }
}

/// Principal sits at a fixed payload position. A `DOMAIN\user` value there is reduced to `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub index: usize,
}

impl IdentityExtractor for FieldIndex {
    fn extract(&self, string_fields: &[String]) -> String {
        match string_fields.get(self.index) {
            Some(value) if value.trim() != "-" => {
                or_unknown(value.rsplit('\\').next().unwrap_or(value.as_str()))
            }
            _ => UNKNOWN_PRINCIPAL.to_string(),
        }
    }
}

fn or_unknown(name: &str) -> String {
    if name.trim().is_empty() {
        UNKNOWN_PRINCIPAL.to_string()
    } else {
        name.to_string()
    }
}

/// Configurable choice of extractor: `domain-separator` or `field:<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPolicy {
    DomainSeparator(DomainSeparator),
    FieldIndex(FieldIndex),
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        IdentityPolicy::DomainSeparator(DomainSeparator::default())
    }
}

impl IdentityExtractor for IdentityPolicy {
    fn extract(&self, string_fields: &[String]) -> String {
        match self {
            IdentityPolicy::DomainSeparator(p) => p.extract(string_fields),
            IdentityPolicy::FieldIndex(p) => p.extract(string_fields),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParsePolicyError {
    #[error("unknown identity policy: {0}")]
    Unknown(String),
    #[error("invalid field index: {0}")]
    BadIndex(String),
}

impl FromStr for IdentityPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("domain-separator") {
            return Ok(IdentityPolicy::default());
        }
        match s.split_once(':') {
            Some((kind, index)) if kind.eq_ignore_ascii_case("field") => index
                .trim()
                .parse::<usize>()
                .map(|index| IdentityPolicy::FieldIndex(FieldIndex { index }))
                .map_err(|_| ParsePolicyError::BadIndex(index.to_string())),
            _ => Err(ParsePolicyError::Unknown(s.to_string())),
        }
    }
}
