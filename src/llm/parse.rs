//! Best-effort extraction of structured output from model responses
//!
//! Models return their payload under different envelopes depending on the
//! serving stack, and the JSON we asked for is frequently wrapped in prose.
//! Both recovery steps live here, away from any HTTP concerns, so they can
//! be tested on their own.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Unwrap a raw model response to plain text
///
/// Tries the known envelope shapes in order: direct string, `{response}`,
/// `{text}`, `{choices: [...]}` with nested `text` or `message.content`.
/// Falls back to a string coercion of the whole value.
pub fn unwrap_response_text(raw: &Value) -> String {
    if let Some(s) = raw.as_str() {
        return s.to_string();
    }

    if let Some(obj) = raw.as_object() {
        if let Some(s) = obj.get("response").and_then(Value::as_str) {
            return s.to_string();
        }
        if let Some(s) = obj.get("text").and_then(Value::as_str) {
            return s.to_string();
        }
        if let Some(first) = obj.get("choices").and_then(Value::as_array).and_then(|c| c.first()) {
            if let Some(s) = first.get("text").and_then(Value::as_str) {
                return s.to_string();
            }
            if let Some(s) = first
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
            {
                return s.to_string();
            }
            return first.to_string();
        }
    }

    raw.to_string()
}

/// Extract the first JSON object embedded in free text
///
/// Greedy match from the first `{` to the last `}`, newlines included.
/// Returns `None` when no JSON-like region exists or it does not parse.
pub fn extract_json_object(text: &str) -> Option<Value> {
    static JSON_REGION: OnceLock<Regex> = OnceLock::new();
    let re = JSON_REGION.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static pattern"));

    let region = re.find(text)?;
    serde_json::from_str(region.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unwrap_direct_string() {
        assert_eq!(unwrap_response_text(&json!("hello")), "hello");
    }

    #[test]
    fn test_unwrap_response_field() {
        assert_eq!(unwrap_response_text(&json!({"response": "abc"})), "abc");
    }

    #[test]
    fn test_unwrap_text_field() {
        assert_eq!(unwrap_response_text(&json!({"text": "xyz"})), "xyz");
    }

    #[test]
    fn test_unwrap_choices_with_text() {
        let raw = json!({"choices": [{"text": "first"}, {"text": "second"}]});
        assert_eq!(unwrap_response_text(&raw), "first");
    }

    #[test]
    fn test_unwrap_choices_with_chat_message() {
        let raw = json!({"choices": [{"message": {"role": "assistant", "content": "chat"}}]});
        assert_eq!(unwrap_response_text(&raw), "chat");
    }

    #[test]
    fn test_unwrap_falls_back_to_coercion() {
        let raw = json!({"unexpected": 1});
        assert_eq!(unwrap_response_text(&raw), r#"{"unexpected":1}"#);
    }

    #[test]
    fn test_extract_json_from_noisy_text() {
        let text = "Sure! Here is the answer:\n{\"best_product_id\": 7,\n \"reasons\": []}\nHope it helps.";
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["best_product_id"], 7);
    }

    #[test]
    fn test_extract_json_none_for_plain_text() {
        assert!(extract_json_object("no json here at all").is_none());
        assert!(extract_json_object("unbalanced { brace").is_none());
    }

    #[test]
    fn test_extract_json_spans_newlines() {
        let text = "{\n  \"reasons\": [\n    \"a\",\n    \"b\"\n  ]\n}";
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["reasons"].as_array().unwrap().len(), 2);
    }
}
