use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key of the bootstrap version seeded by every generate.
pub const ORIGINAL_KEY: &str = "Original";

/// Label given to the bootstrap version.
pub const ORIGINAL_LABEL: &str = "Original version";

/// Label substituted when the user leaves a label blank.
pub const DEFAULT_LABEL: &str = "Refinement";

/// One named, labeled snapshot of document text.
///
/// `key` is unique within a store: `"Original"` or `"Version N"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub key: String,
    pub content: String, // markdown
    pub label: String,
}

impl Version {
    /// Returns `true` for the protected bootstrap version.
    pub fn is_original(&self) -> bool {
        self.key == ORIGINAL_KEY
    }

    /// Display title in the form `Version 2 – Added examples`.
    pub fn title(&self) -> String {
        format!("{} – {}", self.key, self.label)
    }
}

/// Normalizes a user-supplied label: trims it and substitutes
/// [`DEFAULT_LABEL`] when nothing is left.
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        DEFAULT_LABEL.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Audience the documentation is written for.
///
/// Serialized lowercase, matching what the documentation service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Beginner, Persona::Intermediate, Persona::Expert];

    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Beginner => "beginner",
            Persona::Intermediate => "intermediate",
            Persona::Expert => "expert",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Persona::Beginner),
            "intermediate" => Ok(Persona::Intermediate),
            "expert" => Ok(Persona::Expert),
            other => Err(format!("unknown persona '{other}'")),
        }
    }
}

/// Who wrote a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
    /// Status notices produced by the session itself.
    System,
}

/// A single entry in the session's chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { sender: Sender::Assistant, text: text.into() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self { sender: Sender::System, text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_labels_fall_back_to_default() {
        assert_eq!(normalize_label(""), DEFAULT_LABEL);
        assert_eq!(normalize_label("  \n\t "), DEFAULT_LABEL);
        assert_eq!(normalize_label("  API examples "), "API examples");
    }

    #[test]
    fn persona_parses_case_insensitively() {
        assert_eq!("Expert".parse::<Persona>(), Ok(Persona::Expert));
        assert_eq!(" beginner ".parse::<Persona>(), Ok(Persona::Beginner));
        assert!("guru".parse::<Persona>().is_err());
        assert_eq!(Persona::default(), Persona::Intermediate);
    }

    #[test]
    fn title_joins_key_and_label() {
        let v = Version {
            key: "Version 2".to_owned(),
            content: String::new(),
            label: "Examples".to_owned(),
        };
        assert_eq!(v.title(), "Version 2 – Examples");
        assert!(!v.is_original());
    }
}
