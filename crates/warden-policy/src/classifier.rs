//! Static event-code table.

use std::collections::HashMap;
use warden_types::{EventClassifier, SessionAction};

/// Successful logon in the Security audit vocabulary.
pub const LOGON_EVENT_CODE: u32 = 4624;
/// Logoff in the Security audit vocabulary.
pub const LOGOFF_EVENT_CODE: u32 = 4634;

/// Classifier backed by a code → action table. Codes absent from the table are ignored.
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: HashMap<u32, SessionAction>,
}

impl CodeTable {
    pub fn new(session_start_code: u32, session_end_code: u32) -> Self {
        Self::empty()
            .with(session_start_code, SessionAction::SessionStart)
            .with(session_end_code, SessionAction::SessionEnd)
    }

    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Map another code. A later mapping for the same code replaces the earlier one.
    pub fn with(mut self, event_code: u32, action: SessionAction) -> Self {
        self.codes.insert(event_code, action);
        self
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new(LOGON_EVENT_CODE, LOGOFF_EVENT_CODE)
    }
}

impl EventClassifier for CodeTable {
    fn classify(&self, event_code: u32) -> SessionAction {
        self.codes
            .get(&event_code)
            .copied()
            .unwrap_or(SessionAction::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_logon_and_logoff() {
        let table = CodeTable::default();
        assert_eq!(table.classify(4624), SessionAction::SessionStart);
        assert_eq!(table.classify(4634), SessionAction::SessionEnd);
        for other in [0, 4625, 4647, 4672, u32::MAX] {
            assert_eq!(table.classify(other), SessionAction::Ignored);
        }
    }

    #[test]
    fn custom_vocabulary() {
        let table = CodeTable::new(1, 2).with(4647, SessionAction::SessionEnd);
        assert_eq!(table.len(), 3);
        assert_eq!(table.classify(1), SessionAction::SessionStart);
        assert_eq!(table.classify(4647), SessionAction::SessionEnd);
        assert_eq!(table.classify(4624), SessionAction::Ignored);
    }

    #[test]
    fn remapping_a_code_replaces_it() {
        let table = CodeTable::default().with(4624, SessionAction::Ignored);
        assert_eq!(table.classify(4624), SessionAction::Ignored);
    }
}
