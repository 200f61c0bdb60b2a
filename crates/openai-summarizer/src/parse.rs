//! Model output parsing.
//!
//! Completion endpoints return free-form text that usually, but not
//! always, contains the requested JSON object. The parser extracts the
//! first balanced `{...}` span, tolerating prose wrappers, markdown
//! fences, and trailing garbage; when nothing parses the whole reply
//! degrades into [`ProcessResult::degraded`].

use summarizer_core::ProcessResult;
use tracing::warn;

/// Parse a model reply into a [`ProcessResult`].
///
/// Never fails: any reply without a deserializable JSON object becomes
/// the degraded result with the raw text as the summary.
pub fn parse_process_result(response: &str) -> ProcessResult {
    let json_str = extract_json(response);

    match serde_json::from_str::<ProcessResult>(json_str) {
        Ok(result) => result,
        Err(e) => {
            warn!("could not parse model reply as a result object: {}", e);
            ProcessResult::degraded(response.trim())
        }
    }
}

/// Extract JSON from a response that may contain markdown or other text.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // If it starts with {, extract balanced JSON object
    if trimmed.starts_with('{') {
        return extract_balanced_json(trimmed);
    }

    // Try to find JSON in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            let extracted = trimmed[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    // Try to find JSON in generic code block
    if let Some(start) = trimmed.find("```") {
        let after_backticks = &trimmed[start + 3..];
        // Skip optional language identifier
        let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(end) = after_backticks[json_start..].find("```") {
            let extracted = after_backticks[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    // Try to find a JSON object in the text
    if let Some(start) = trimmed.find('{') {
        return extract_balanced_json(&trimmed[start..]);
    }

    trimmed
}

/// Extract a balanced JSON object from a string that starts with '{'.
///
/// Handles replies where the model adds trailing characters after the
/// object, and braces or escaped quotes inside string values.
fn extract_balanced_json(s: &str) -> &str {
    if !s.starts_with('{') {
        return s;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return &s[..=i];
                }
            }
            _ => {}
        }
    }

    // No balanced object found
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_balanced_json_clean() {
        let input = r#"{"summary": "short"}"#;
        assert_eq!(extract_balanced_json(input), input);
    }

    #[test]
    fn test_extract_balanced_json_trailing_braces() {
        let input = r#"{"summary": "short"}}}"#;
        assert_eq!(extract_balanced_json(input), r#"{"summary": "short"}"#);
    }

    #[test]
    fn test_extract_balanced_json_with_strings() {
        let input = r#"{"summary": "curly { inside }", "reply": null}"#;
        assert_eq!(extract_balanced_json(input), input);
    }

    #[test]
    fn test_extract_balanced_json_with_escaped_quotes() {
        let input = r#"{"summary": "she said \"hi\""}"#;
        assert_eq!(extract_balanced_json(input), input);
    }

    #[test]
    fn test_parse_prose_wrapped_object() {
        let response = r#"Sure, here is the analysis you asked for:
{"summary": "Asked about meeting time", "reply": "It's at 3pm", "needs_more_information": false, "new_todos": ["confirm meeting time"]}
Hope that helps!"#;

        let result = parse_process_result(response);
        assert_eq!(result.summary, "Asked about meeting time");
        assert_eq!(result.reply.as_deref(), Some("It's at 3pm"));
        assert_eq!(result.new_todos, vec!["confirm meeting time".to_string()]);
    }

    #[test]
    fn test_parse_markdown_fenced_object() {
        let response = "```json\n{\"summary\": \"fenced\", \"needs_more_information\": true}\n```";

        let result = parse_process_result(response);
        assert_eq!(result.summary, "fenced");
        assert!(result.needs_more_information);
    }

    #[test]
    fn test_parse_no_json_degrades_to_raw_summary() {
        let response = "I could not produce a structured answer this time.";

        let result = parse_process_result(response);
        assert_eq!(result.summary, response);
        assert!(result.reply.is_none());
        assert!(!result.needs_more_information);
        assert!(result.task_updates.is_empty());
        assert!(result.new_todos.is_empty());
    }

    #[test]
    fn test_parse_malformed_json_degrades() {
        let response = r#"{"summary": "unterminated"#;

        let result = parse_process_result(response);
        assert_eq!(result.summary, response);
        assert!(result.new_todos.is_empty());
    }

    #[test]
    fn test_parse_todo_list_alias() {
        let response = r#"{"summary": "s", "todo_list": ["call the plumber"]}"#;

        let result = parse_process_result(response);
        assert_eq!(result.new_todos, vec!["call the plumber".to_string()]);
    }
}
