//! Chat component helpers.

use serde_json::Value;

/// Formatting code prefix used inside legacy chat strings.
pub const FORMAT_CHAR: char = '\u{00A7}';

/// Flatten a chat component to plain text.
///
/// A component's own `text` comes first, followed by each child in `extra`,
/// depth-first, left to right. Bare strings flatten to themselves and arrays
/// concatenate their elements.
pub fn flatten(component: &Value) -> String {
    let mut out = String::new();
    flatten_into(component, &mut out);
    out
}

fn flatten_into(component: &Value, out: &mut String) {
    match component {
        Value::String(s) => out.push_str(s),
        Value::Array(parts) => {
            for part in parts {
                flatten_into(part, out);
            }
        }
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                flatten_into(text, out);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                for child in extra {
                    flatten_into(child, out);
                }
            }
        }
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(_) | Value::Null => {}
    }
}

/// Parse a chat field that carries a JSON-encoded component.
///
/// Falls back to treating the input as a plain string when it is not JSON.
pub fn parse(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Flatten a JSON-encoded chat field straight to text.
pub fn flatten_str(raw: &str) -> String {
    flatten(&parse(raw))
}

/// Remove `§x` formatting codes.
pub fn strip_formatting(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_CHAR {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Build a plain text component encoded the way chat fields carry it.
pub fn text_component(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_extra() {
        let component = json!({"text": "A", "extra": [{"text": "B"}, {"text": "C"}]});
        assert_eq!(flatten(&component), "ABC");
    }

    #[test]
    fn flattens_depth_first() {
        let component = json!({
            "text": "1",
            "extra": [{"text": "2", "extra": ["3", {"text": "4"}]}, "5"]
        });
        assert_eq!(flatten(&component), "12345");
    }

    #[test]
    fn parses_encoded_field() {
        assert_eq!(
            flatten_str(r#"{"text":"A","extra":[{"text":"B"},{"text":"C"}]}"#),
            "ABC"
        );
        assert_eq!(flatten_str("plain words"), "plain words");
        assert_eq!(flatten_str("\"quoted\""), "quoted");
    }

    #[test]
    fn strips_format_codes() {
        assert_eq!(strip_formatting("\u{00A7}cRed\u{00A7}r text"), "Red text");
        assert_eq!(strip_formatting("trailing\u{00A7}"), "trailing");
    }

    #[test]
    fn text_component_is_json() {
        assert_eq!(flatten_str(&text_component("hi")), "hi");
    }
}
