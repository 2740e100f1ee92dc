pub mod ast;
pub mod diagnostic;
pub mod diagnostic_range;
pub mod error;
pub mod format;
pub mod line_index;
pub mod numeric;
pub mod parser;
pub mod parsing;
pub mod schema;
pub mod scanner;
pub mod validator;
pub mod value;

use tower_lsp::lsp_types::Diagnostic;
use tracing::{info, instrument};

pub use ast::JSONDocument;
use error::SchemaValidationError;
use parser::ParseOptions;
use validator::{Collector, SchemaMatch};

/// Parses `file_contents` and validates it against `json_schema`, returning
/// every diagnostic — syntax errors and schema violations alike — as LSP
/// diagnostics. Parsing never fails: malformed JSON still produces a
/// document and diagnostics rather than an error.
#[instrument(skip(json_schema, file_contents), fields(content_len = file_contents.len()))]
pub fn validate_liberally(
    json_schema: &serde_json::Value,
    file_contents: &str,
) -> Result<Vec<Diagnostic>, SchemaValidationError> {
    info!("starting schema validation");
    let (diagnostics, _matches) = validate_document(json_schema, file_contents, None);
    Ok(diagnostics)
}

/// Parses and validates `file_contents`, also returning which schema matched
/// at each node — the basis for hover text and completion. When
/// `focus_offset` is given, only schemas applying at that position are kept;
/// `None` keeps every match, which is wasteful outside of hover/completion.
pub fn validate_document(
    json_schema: &serde_json::Value,
    file_contents: &str,
    focus_offset: Option<usize>,
) -> (Vec<Diagnostic>, Vec<SchemaMatch>) {
    let doc = parser::parse(file_contents, ParseOptions::default());
    let mut diagnostics = doc.syntax_errors.clone();

    let Some(root) = doc.root else {
        return (diagnostics, Vec::new());
    };

    let mut collector = Collector::full(focus_offset);
    let result = validator::validate_node(&doc, root, json_schema, &mut collector);
    diagnostics.extend(result.problems.into_iter().map(|p| validator::problem_to_diagnostic(&doc, p)));
    (diagnostics, collector.into_matches())
}

/// Parses `file_contents` without validating it against any schema.
pub fn parse_document(file_contents: &str) -> JSONDocument {
    parser::parse(file_contents, ParseOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"{
  "service": "api",
  "version": "1.2.3",
  "runtime": {
    "type": "docker",
    "docker": {
      "image": "nginx",
      "tag": "1.25"
    }
  },
  "ports": [
    { "containerPort": 8080, "protocol": "tcp" }
  ],
  "env": {
    "MODE": "production"
  }
}"#;

    const INVALID_JSON_SYNTAX: &str = r#"{
  "service": "api",
  "version": "1.2.3"
  "runtime": {
    "type": "docker"
  }
}"#;

    fn minimal_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "service": { "type": "string" },
                "version": { "type": "string" }
            },
            "required": ["service"]
        })
    }

    #[test]
    fn valid_json_against_its_schema_has_no_diagnostics() {
        let diagnostics = validate_liberally(&minimal_schema(), VALID_JSON).unwrap();
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    }

    #[test]
    fn missing_comma_is_reported_without_a_schema() {
        let schema = serde_json::json!(true);
        let diagnostics = validate_liberally(&schema, INVALID_JSON_SYNTAX).unwrap();
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn schema_violations_surface_alongside_syntax_errors() {
        let schema = serde_json::json!({"type": "array"});
        let diagnostics = validate_liberally(&schema, r#"{"a": 1,}"#).unwrap();
        assert!(diagnostics.len() >= 2, "expected both a trailing-comma and a type diagnostic");
    }

    #[test]
    fn required_property_missing_is_flagged() {
        let diagnostics = validate_liberally(&minimal_schema(), r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn empty_file_reports_a_value_expected_diagnostic() {
        let diagnostics = validate_liberally(&minimal_schema(), "").unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Value expected");
    }

    #[test]
    fn malformed_json_never_panics() {
        for input in ["{", "}", "{{}", "null", "[]", r#"{"key": }"#] {
            let result = validate_liberally(&minimal_schema(), input);
            assert!(result.is_ok(), "input {:?} should not error", input);
        }
    }

    #[test]
    fn matching_schemas_can_be_focused_to_a_single_offset() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "a": { "type": "number" } }
        });
        let text = r#"{"a": 1}"#;
        let offset = text.find('1').unwrap();
        let (_, matches) = validate_document(&schema, text, Some(offset));
        assert!(matches.iter().any(|m| m.schema == serde_json::json!({"type": "number"})));
    }
}
