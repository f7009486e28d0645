use std::fmt::{Display, Formatter};

use serde::Serialize;
use uuid::Uuid;

/// Identifier (UUID v4) attached to every log line and report of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_hyphenated_uuids() {
        let first = RunId::new_v4();
        let second = RunId::new_v4();
        assert_ne!(first, second);

        let text = first.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
        assert_eq!(
            serde_json::to_value(first).expect("serialize"),
            serde_json::Value::String(text)
        );
    }
}
