//! Activity Labels
//!
//! Class code → display name lookup. Unknown codes display as the raw code.

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

/// Known class codes and their display names
pub const LABEL_NAMES: [(i64, &str); 3] = [
    (0, "Stop"),
    (1, "Distracted Walking"),
    (2, "Not Distracted Walking"),
];

/// Classification outcome, ordered by class code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    code: i64,
}

impl Label {
    pub const STOP: Label = Label { code: 0 };
    pub const DISTRACTED_WALKING: Label = Label { code: 1 };
    pub const NOT_DISTRACTED_WALKING: Label = Label { code: 2 };

    pub fn from_code(code: i64) -> Self {
        Self { code }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn is_known(&self) -> bool {
        LABEL_NAMES.iter().any(|(c, _)| *c == self.code)
    }

    pub fn name(&self) -> Cow<'static, str> {
        match LABEL_NAMES.iter().find(|(c, _)| *c == self.code) {
            Some((_, name)) => Cow::Borrowed(*name),
            None => Cow::Owned(self.code.to_string()),
        }
    }

    /// All labels with a display name
    pub fn known() -> impl Iterator<Item = Label> {
        LABEL_NAMES.iter().map(|(code, _)| Label::from_code(*code))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Serialized as the display name so it can key JSON maps
impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(Label::STOP.name(), "Stop");
        assert_eq!(Label::from_code(1).to_string(), "Distracted Walking");
        assert_eq!(Label::NOT_DISTRACTED_WALKING.name(), "Not Distracted Walking");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let label = Label::from_code(7);
        assert!(!label.is_known());
        assert_eq!(label.name(), "7");
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&Label::DISTRACTED_WALKING).unwrap();
        assert_eq!(json, "\"Distracted Walking\"");
    }
}
