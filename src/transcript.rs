//! Debate transcript - the append-only record of everything said.
//!
//! The rendered transcript is replayed verbatim as the history segment of
//! every prompt sent to an agent, so append order is semantically
//! significant.

use serde::{Deserialize, Serialize};

/// A single utterance in the debate.
///
/// `content` is plain text, or a JSON-serialized value when the producer
/// emitted a structured result. Entries are immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who said it ("user", "system", or an agent display name).
    pub role: String,
    /// Registry key of the producing agent, when there is one.
    pub key: Option<String>,
    /// What was said.
    pub content: String,
}

impl TranscriptEntry {
    fn header(&self) -> String {
        match &self.key {
            Some(key) => format!("【{} (ID: {})】", self.role, key),
            None => format!("【{}】", self.role),
        }
    }
}

/// Ordered sequence of transcript entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain-text entry.
    pub fn append(&mut self, role: &str, key: Option<&str>, content: &str) {
        self.entries.push(TranscriptEntry {
            role: role.to_string(),
            key: key.map(str::to_string),
            content: content.to_string(),
        });
    }

    /// Append a structured entry, serialized to JSON text before storing.
    pub fn append_value(&mut self, role: &str, key: Option<&str>, value: &serde_json::Value) {
        // Value's Display impl is its JSON serialization.
        self.append(role, key, &value.to_string());
    }

    /// Render the transcript as the "history" segment of a prompt.
    ///
    /// Returns the empty string for an empty transcript; prompt builders
    /// omit the history section entirely in that case rather than
    /// injecting an empty-history marker.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}:\n{}", e.header(), e.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard every entry. Only safe while no debate is running.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_renders_empty_string() {
        let t = Transcript::new();
        assert_eq!(t.render(), "");
        assert!(t.is_empty());
    }

    #[test]
    fn test_render_is_order_preserving() {
        let mut t = Transcript::new();
        t.append("user", None, "A");
        t.append("Geophysical Expert", Some("geophysical"), "B");

        let rendered = t.render();
        let a = rendered.find("A").unwrap();
        let b = rendered.find("B").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_render_block_format() {
        let mut t = Transcript::new();
        t.append("Moderator", Some("host"), "question?");
        assert_eq!(t.render(), "【Moderator (ID: host)】:\nquestion?");

        let mut t = Transcript::new();
        t.append("user", None, "topic");
        assert_eq!(t.render(), "【user】:\ntopic");
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let mut t = Transcript::new();
        t.append("user", None, "first");
        t.append("user", None, "second");
        assert!(t.render().contains("first\n\n【user】:\nsecond"));
    }

    #[test]
    fn test_append_value_serializes_json() {
        let mut t = Transcript::new();
        let value = serde_json::json!({"probability": "high", "target_area": []});
        t.append_value("Moderator", Some("host"), &value);

        let entry = &t.entries()[0];
        let parsed: serde_json::Value = serde_json::from_str(&entry.content).unwrap();
        assert_eq!(parsed["probability"], "high");
    }

    #[test]
    fn test_clear() {
        let mut t = Transcript::new();
        t.append("user", None, "x");
        assert_eq!(t.len(), 1);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.render(), "");
    }
}
