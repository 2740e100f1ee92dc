use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Finds the schema identifier for a document: a shebang-style pragma on the
/// first line takes priority, falling back to the standard `$schema` field.
pub fn extract_schema_reference(content: &Value, raw_text: &str) -> Option<String> {
    if let Some(schema) = check_shebang_schema(raw_text) {
        return Some(schema);
    }

    content.get("$schema")?.as_str().map(str::to_string)
}

/// Checks for a `#$schema IDENTIFIER` pragma on the first line of the raw
/// source text (not the parsed value — the pragma lives outside the JSON
/// grammar, so it has to be read from the original bytes).
fn check_shebang_schema(raw_text: &str) -> Option<String> {
    static SHEBANG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SHEBANG_REGEX.get_or_init(|| Regex::new(r"^#\$schema\s+(\S+)").expect("valid regex"));

    let first_line = raw_text.lines().next()?;
    regex.captures(first_line).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shebang_takes_priority_over_schema_field() {
        let text = "#$schema foo.json\n{\"$schema\": \"bar.json\"}";
        let value = json!({"$schema": "bar.json"});
        assert_eq!(extract_schema_reference(&value, text), Some("foo.json".to_string()));
    }

    #[test]
    fn falls_back_to_schema_field() {
        let value = json!({"$schema": "bar.json"});
        assert_eq!(extract_schema_reference(&value, "{}"), Some("bar.json".to_string()));
    }

    #[test]
    fn none_when_neither_present() {
        let value = json!({});
        assert_eq!(extract_schema_reference(&value, "{}"), None);
    }
}
