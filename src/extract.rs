//! Command extractor - recovers a machine-readable host command from a
//! free-form, often malformed, LLM reply.
//!
//! The host is asked for strict JSON but cannot be trusted to honor the
//! contract, so extraction is deliberately lenient: code fences and
//! citation markers are stripped, prose around the object is discarded,
//! and anything that still fails to parse maps to
//! [`HostCommand::Unrecognized`] instead of an error. Callers keep the raw
//! text and fall back to showing it verbatim.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::report::ReportPayload;

/// Citation markers the knowledge base injects into answers, e.g. `[ID:7]`.
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ID:\d+\]").expect("CITATION_RE regex should compile"));

/// A command extracted from the host's reply.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Follow-up question directed at one panelist.
    Ask { target: String, content: String },
    /// Terminal result concluding the debate.
    Finish { content: FinishContent },
    /// The reply could not be interpreted as a command.
    Unrecognized,
}

/// Payload of a FINISH command.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishContent {
    /// Free-form text conclusion.
    Text(String),
    /// Structured report, possibly with geospatial fields.
    Report(ReportPayload),
}

impl FinishContent {
    pub fn as_report(&self) -> Option<&ReportPayload> {
        match self {
            Self::Report(payload) => Some(payload),
            Self::Text(_) => None,
        }
    }

    /// Textual form for transcripts and display.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Report(payload) => serde_json::to_string(payload)
                .unwrap_or_else(|_| payload.summary_line()),
        }
    }
}

/// Extract a command from a raw host reply.
///
/// Tolerates fenced ```json blocks, `[ID:<digits>]` citation markers, and
/// leading/trailing prose around the JSON object. Recovery slices from the
/// first `{` to the last `}` and is not nested-brace aware; a reply
/// containing two sibling JSON objects is a known unsupported case and
/// extracts as `Unrecognized` or a mis-parse, which callers surface as raw
/// text.
pub fn extract_command(raw: &str) -> HostCommand {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = CITATION_RE.replace_all(cleaned.trim(), "");

    let sliced = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(first), Some(last)) if first < last => &cleaned[first..=last],
        _ => cleaned.as_ref(),
    };

    let value: Value = match serde_json::from_str(sliced) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("host reply did not parse as JSON: {}", err);
            return HostCommand::Unrecognized;
        }
    };

    match value.get("action").and_then(Value::as_str) {
        Some("ASK") => {
            let Some(target) = value.get("target").and_then(Value::as_str) else {
                return HostCommand::Unrecognized;
            };
            let content = value
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default();
            HostCommand::Ask {
                target: target.to_string(),
                content: content.to_string(),
            }
        }
        Some("FINISH") => {
            let content = match value.get("content") {
                Some(Value::String(text)) => FinishContent::Text(text.clone()),
                Some(content @ Value::Object(_)) => {
                    match serde_json::from_value::<ReportPayload>(content.clone()) {
                        Ok(payload) => FinishContent::Report(payload),
                        // Geospatial fields present but malformed: keep the
                        // raw JSON text so nothing is lost.
                        Err(_) => FinishContent::Text(content.to_string()),
                    }
                }
                Some(other) => FinishContent::Text(other.to_string()),
                None => return HostCommand::Unrecognized,
            };
            HostCommand::Finish { content }
        }
        _ => HostCommand::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ask() {
        let cmd = extract_command(r#"{"action":"ASK","target":"Geophysical","content":"why?"}"#);
        assert_eq!(
            cmd,
            HostCommand::Ask {
                target: "Geophysical".to_string(),
                content: "why?".to_string(),
            }
        );
    }

    #[test]
    fn test_fenced_prose_and_citations_round_trip() {
        let raw = concat!(
            "Based on the discussion [ID:7], my conclusion follows.\n",
            "```json\n",
            r#"{"action": "FINISH", "content": {"probability": "high [ID:12]", "#,
            r#""target_area": [[39.9, 116.4], [39.91, 116.42]]}}"#,
            "\n```\nLet me know if anything is unclear.",
        );
        let cmd = extract_command(raw);
        let HostCommand::Finish { content } = cmd else {
            panic!("expected FINISH, got {:?}", cmd);
        };
        let report = content.as_report().unwrap();
        assert_eq!(report.target_area.as_ref().unwrap().len(), 2);
        // Citation markers are stripped before parsing.
        assert_eq!(report.extra["probability"], "high ");
    }

    #[test]
    fn test_not_json_is_unrecognized() {
        assert_eq!(extract_command("not json at all"), HostCommand::Unrecognized);
    }

    #[test]
    fn test_unknown_action_is_unrecognized() {
        let cmd = extract_command(r#"{"action":"PONDER","content":"hmm"}"#);
        assert_eq!(cmd, HostCommand::Unrecognized);
    }

    #[test]
    fn test_missing_action_is_unrecognized() {
        assert_eq!(extract_command(r#"{"content":"x"}"#), HostCommand::Unrecognized);
    }

    #[test]
    fn test_ask_without_target_is_unrecognized() {
        let cmd = extract_command(r#"{"action":"ASK","content":"who?"}"#);
        assert_eq!(cmd, HostCommand::Unrecognized);
    }

    #[test]
    fn test_ask_without_content_defaults_empty() {
        let cmd = extract_command(r#"{"action":"ASK","target":"general"}"#);
        assert_eq!(
            cmd,
            HostCommand::Ask {
                target: "general".to_string(),
                content: String::new(),
            }
        );
    }

    #[test]
    fn test_finish_with_string_content() {
        let cmd = extract_command(r#"{"action":"FINISH","content":"no mineralization expected"}"#);
        assert_eq!(
            cmd,
            HostCommand::Finish {
                content: FinishContent::Text("no mineralization expected".to_string()),
            }
        );
    }

    #[test]
    fn test_finish_without_content_is_unrecognized() {
        assert_eq!(extract_command(r#"{"action":"FINISH"}"#), HostCommand::Unrecognized);
    }

    #[test]
    fn test_finish_with_malformed_geometry_degrades_to_text() {
        let cmd = extract_command(r#"{"action":"FINISH","content":{"target_area":"not a polygon"}}"#);
        let HostCommand::Finish { content } = cmd else {
            panic!("expected FINISH");
        };
        match content {
            FinishContent::Text(text) => assert!(text.contains("not a polygon")),
            FinishContent::Report(_) => panic!("malformed polygon should not type-check"),
        }
    }

    #[test]
    fn test_empty_input_is_unrecognized() {
        assert_eq!(extract_command(""), HostCommand::Unrecognized);
    }

    #[test]
    fn test_action_is_case_sensitive() {
        // The host contract demands upper-case discriminants; anything else
        // falls back to raw-text display.
        assert_eq!(
            extract_command(r#"{"action":"finish","content":"x"}"#),
            HostCommand::Unrecognized
        );
    }
}
