//! Reply directive parsing.
//!
//! Model replies are plain text with inline directives:
//! - `[[tool:NAME]] {json}` at the start of a line requests a tool call
//! - `[[handoff:AGENT]]` anywhere requests a hand-off to a peer agent
//!
//! Directives are stripped from the visible text. Unknown directives are
//! stripped and ignored.

use cityguide_types::agent::AgentId;
use cityguide_types::tool::ToolCall;
use serde_json::Value;

/// A model reply split into visible text and requested actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReply {
    /// Text with all directive tags removed.
    pub text: String,
    /// Tool calls in the order they appeared.
    pub tool_calls: Vec<ToolCall>,
    /// First hand-off target named in the reply.
    pub handoff: Option<AgentId>,
}

/// Parse a complete model reply.
pub fn parse_reply(reply: &str) -> ParsedReply {
    let mut parsed = ParsedReply::default();
    let mut lines = Vec::new();

    for line in reply.lines() {
        if let Some(call) = parse_tool_line(line) {
            parsed.tool_calls.push(call);
            continue;
        }
        lines.push(strip_inline(line, &mut parsed.handoff));
    }

    parsed.text = lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();
    parsed
}

/// `[[tool:NAME]] {json}` → `ToolCall`. A remainder that is not valid JSON is
/// passed through as a string so schema validation reports it.
fn parse_tool_line(line: &str) -> Option<ToolCall> {
    let rest = line.trim_start().strip_prefix("[[tool:")?;
    let end = rest.find("]]")?;
    let name = rest[..end].trim();
    if name.is_empty() {
        return None;
    }
    let raw = rest[end + 2..].trim();
    let input = if raw.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
    };
    Some(ToolCall {
        name: name.to_string(),
        input,
    })
}

/// Remove every `[[...]]` tag from `line`, recording the first hand-off.
fn strip_inline(line: &str, handoff: &mut Option<AgentId>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find("[[") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("]]") else {
            break;
        };
        out.push_str(&rest[..start]);
        let tag = after_open[..end].trim();
        if let Some(target) = tag.strip_prefix("handoff:") {
            let target = target.trim();
            if !target.is_empty() && handoff.is_none() {
                *handoff = Some(AgentId::new(target));
            }
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        let parsed = parse_reply("  Here are three bakeries.  ");
        assert_eq!(parsed.text, "Here are three bakeries.");
        assert_eq!(parsed.tool_calls.len(), 0);
        assert!(parsed.handoff.is_none());
    }

    #[test]
    fn test_tool_call_line() {
        let parsed = parse_reply(
            "Let me look.\n[[tool:business_search]] {\"category\": \"bakery\", \"limit\": 3}",
        );
        assert_eq!(parsed.text, "Let me look.");
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "business_search");
        assert_eq!(parsed.tool_calls[0].input, json!({"category": "bakery", "limit": 3}));
    }

    #[test]
    fn test_tool_call_without_arguments() {
        let parsed = parse_reply("[[tool:itinerary_builder]]");
        assert_eq!(parsed.tool_calls[0].input, json!({}));
        assert!(parsed.text.is_empty());
    }

    #[test]
    fn test_tool_call_bad_json_kept_as_string() {
        let parsed = parse_reply("[[tool:business_search]] category=bakery");
        assert_eq!(parsed.tool_calls[0].input, json!("category=bakery"));
    }

    #[test]
    fn test_multiple_tool_calls_in_order() {
        let parsed = parse_reply("[[tool:a]] {}\n[[tool:b]] {}");
        let names: Vec<_> = parsed.tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_handoff_inline() {
        let parsed = parse_reply("Found two museums. [[handoff: Itinerary Planner ]]");
        assert_eq!(parsed.handoff, Some(AgentId::new("Itinerary Planner")));
        assert_eq!(parsed.text, "Found two museums.");
    }

    #[test]
    fn test_first_handoff_wins() {
        let parsed = parse_reply("[[handoff:Cultural Curator]]\n[[handoff:Itinerary Planner]]");
        assert_eq!(parsed.handoff, Some(AgentId::new("Cultural Curator")));
    }

    #[test]
    fn test_unknown_directive_stripped() {
        let parsed = parse_reply("Hello [[silent]]world");
        assert_eq!(parsed.text, "Hello world");
        assert_eq!(parsed.tool_calls.len(), 0);
        assert!(parsed.handoff.is_none());
    }

    #[test]
    fn test_unclosed_tag_is_literal() {
        let parsed = parse_reply("Use [[handoff:Planner to continue");
        assert_eq!(parsed.text, "Use [[handoff:Planner to continue");
        assert!(parsed.handoff.is_none());
    }
}
