//! Prompt construction and response parsing for the three generation steps.

use std::sync::LazyLock;

use draftdeck_shared::{DocumentKind, DraftDeckError, Result};
use regex::Regex;
use serde_json::Value;

use crate::CompletionRequest;

/// Matches a whole response wrapped in a Markdown code fence.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("valid regex"));

/// Leading list markers: `1.`, `2)`, `-`, `*`, `•`.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").expect("valid regex"));

/// Keys an object-shaped outline response may use.
const OUTLINE_KEYS: [&str; 3] = ["outline", "sections", "slides"];

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Ask for an ordered list of section or slide titles.
pub fn outline_request(topic: &str, kind: DocumentKind) -> CompletionRequest {
    let (what, range) = match kind {
        DocumentKind::Docx => ("sections for a structured business document", "5 to 8"),
        DocumentKind::Pptx => ("slide titles for a presentation", "6 to 10"),
    };
    CompletionRequest {
        system: "You are a professional document outline generator. \
                 Respond with a JSON array of strings only, no commentary."
            .to_string(),
        user: format!(
            "Generate {range} {what} about: \"{topic}\". \
             Return only the titles, in reading order, as a JSON array of strings."
        ),
    }
}

/// Ask for the body text of one section, given the whole outline for context.
pub fn content_request(
    topic: &str,
    kind: DocumentKind,
    outline: &[String],
    title: &str,
) -> CompletionRequest {
    let unit = kind.unit_name();
    let guidance = match kind {
        DocumentKind::Docx => "Write 2 to 4 well-structured paragraphs.",
        DocumentKind::Pptx => "Write 3 to 5 concise bullet points, one per line, without markdown.",
    };
    let outline_list = outline
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {t}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    CompletionRequest {
        system: format!(
            "You are a professional business writer drafting the content of one {unit} \
             at a time. Output only the {unit} body, without repeating its title."
        ),
        user: format!(
            "Document topic: {topic}\n\nFull outline:\n{outline_list}\n\n\
             Write the content for the {unit} titled \"{title}\". {guidance}"
        ),
    }
}

/// Ask for a rewrite of one section following a free-text instruction.
pub fn refine_request(title: &str, current_content: &str, instruction: &str) -> CompletionRequest {
    CompletionRequest {
        system: "You are a professional editor. Rewrite the given content following the \
                 instruction. Output only the rewritten content."
            .to_string(),
        user: format!(
            "Section title: {title}\n\nCurrent content:\n{current_content}\n\n\
             Instruction: {instruction}"
        ),
    }
}

// ---------------------------------------------------------------------------
// Outline parsing
// ---------------------------------------------------------------------------

/// Parse the model's outline answer into titles.
///
/// Accepts a JSON array of strings, the same wrapped in a code fence or an
/// object under `outline`/`sections`/`slides`, and as a last resort one title
/// per line when the text reads as a list. Blank titles are dropped; no
/// titles at all is an error.
pub fn parse_outline(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    let body = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let titles = match json_titles(body).or_else(|| listed_titles(body)) {
        Some(titles) => titles,
        None => {
            return Err(DraftDeckError::Gateway(
                "malformed AI response: outline is neither JSON nor a list".into(),
            ));
        }
    };

    let titles: Vec<String> = titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if titles.is_empty() {
        return Err(DraftDeckError::Gateway(
            "malformed AI response: outline contained no titles".into(),
        ));
    }
    Ok(titles)
}

/// One title per line, or `None` when the text is a single unmarked line
/// (a refusal or other prose rather than a list).
fn listed_titles(body: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = body.lines().filter(|l| !l.trim().is_empty()).collect();
    let marked = lines.iter().any(|line| LIST_MARKER.is_match(line));
    if !marked && lines.len() < 2 {
        return None;
    }
    Some(
        lines
            .iter()
            .map(|line| LIST_MARKER.replace(line, "").trim().trim_matches('"').to_string())
            .collect(),
    )
}

/// Titles from a JSON answer, or `None` when the text holds no usable JSON.
fn json_titles(body: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(body).ok().or_else(|| {
        // Models sometimes wrap the array in prose.
        let start = body.find('[')?;
        let end = body.rfind(']')?;
        serde_json::from_str(body.get(start..=end)?).ok()
    })?;

    let array = match &value {
        Value::Array(items) => items,
        Value::Object(map) => OUTLINE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    Some(
        array
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("title").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_array() {
        let titles = parse_outline(r#"["Introduction", "Market Size", "Outlook"]"#).unwrap();
        assert_eq!(titles, vec!["Introduction", "Market Size", "Outlook"]);
    }

    #[test]
    fn parses_fenced_array() {
        let text = "```json\n[\"Intro\", \"Players\"]\n```";
        assert_eq!(parse_outline(text).unwrap(), vec!["Intro", "Players"]);
    }

    #[test]
    fn parses_object_with_outline_key() {
        let text = r#"{"outline": ["A", " ", "B"]}"#;
        assert_eq!(parse_outline(text).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn parses_array_of_title_objects() {
        let text = r#"{"slides": [{"title": "Hook"}, {"title": "Ask"}]}"#;
        assert_eq!(parse_outline(text).unwrap(), vec!["Hook", "Ask"]);
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let text = "Here is your outline: [\"One\", \"Two\"] Hope it helps!";
        assert_eq!(parse_outline(text).unwrap(), vec!["One", "Two"]);
    }

    #[test]
    fn falls_back_to_numbered_lines() {
        let text = "1. Executive Summary\n2) Market Drivers\n- Risks\n\n";
        assert_eq!(
            parse_outline(text).unwrap(),
            vec!["Executive Summary", "Market Drivers", "Risks"]
        );
    }

    #[test]
    fn single_line_of_prose_is_malformed() {
        let err = parse_outline("I'm sorry, but I can't help with that request.").unwrap_err();
        assert!(matches!(err, DraftDeckError::Gateway(_)));
        assert!(err.to_string().contains("malformed AI response"));
    }

    #[test]
    fn single_marked_line_is_one_title() {
        assert_eq!(parse_outline("1. Overview").unwrap(), vec!["Overview"]);
    }

    #[test]
    fn empty_outline_is_error() {
        assert!(parse_outline("[]").is_err());
        assert!(parse_outline("   ").is_err());
    }

    #[test]
    fn outline_request_mentions_topic_and_kind() {
        let req = outline_request("EV market analysis", DocumentKind::Pptx);
        assert!(req.user.contains("EV market analysis"));
        assert!(req.user.contains("slide"));
        assert!(req.system.contains("JSON array"));
    }

    #[test]
    fn content_request_carries_outline_and_title() {
        let outline = vec!["Intro".to_string(), "Growth".to_string()];
        let req = content_request("EVs", DocumentKind::Docx, &outline, "Growth");
        assert!(req.user.contains("1. Intro\n2. Growth"));
        assert!(req.user.contains("\"Growth\""));
        assert!(req.system.contains("section"));
    }

    #[test]
    fn refine_request_includes_instruction() {
        let req = refine_request("Intro", "Old text", "make it shorter");
        assert!(req.user.contains("Old text"));
        assert!(req.user.contains("make it shorter"));
    }
}
