//! Schema-side accessors. A schema is represented directly as
//! [`serde_json::Value`] — no separate schema AST — since schemas are only
//! ever read, never positionally diagnosed themselves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use serde_json::Value;

/// A resolved schema: either the permissive/restrictive booleans or a full
/// keyword object. Draft-04 through Draft-07 both allow a bare boolean here.
#[derive(Debug, Clone, Copy)]
pub enum SchemaRef<'a> {
    Always(bool),
    Object(&'a Value),
}

impl<'a> SchemaRef<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Bool(b) => SchemaRef::Always(*b),
            other => SchemaRef::Object(other),
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&'a Value> {
        match self {
            SchemaRef::Always(_) => None,
            SchemaRef::Object(v) => v.get(name),
        }
    }

    pub fn is_always_true(&self) -> bool {
        matches!(self, SchemaRef::Always(true))
    }

    pub fn is_always_false(&self) -> bool {
        matches!(self, SchemaRef::Always(false))
    }
}

/// Regex cache for the `pattern` keyword. Compilation failures are cached as
/// `None` so a malformed pattern is only attempted once and the constraint is
/// then silently skipped rather than failing the whole document.
fn pattern_cache() -> &'static Mutex<HashMap<String, Option<Arc<Regex>>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Arc<Regex>>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn compiled_pattern(pattern: &str) -> Option<Arc<Regex>> {
    let mut guard = pattern_cache().lock().unwrap();
    guard
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok().map(Arc::new))
        .clone()
}

pub fn is_deprecated(schema: &Value) -> bool {
    matches!(schema.get("deprecationMessage"), Some(Value::String(_)))
        || matches!(schema.get("deprecated"), Some(Value::Bool(true)))
}

pub fn deprecation_message(schema: &Value) -> String {
    match schema.get("deprecationMessage") {
        Some(Value::String(s)) => s.clone(),
        _ => "Value is deprecated".to_string(),
    }
}

pub fn description(schema: &Value) -> Option<&str> {
    schema.get("description").and_then(Value::as_str)
}

pub fn error_message(schema: &Value) -> Option<&str> {
    schema.get("errorMessage").and_then(Value::as_str)
}

pub fn pattern_error_message(schema: &Value) -> Option<&str> {
    schema.get("patternErrorMessage").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_schema_variants() {
        let v = json!(true);
        assert!(SchemaRef::from_value(&v).is_always_true());
        let v = json!(false);
        assert!(SchemaRef::from_value(&v).is_always_false());
    }

    #[test]
    fn keyword_lookup_on_object_schema() {
        let v = json!({"type": "string"});
        let r = SchemaRef::from_value(&v);
        assert_eq!(r.keyword("type"), Some(&json!("string")));
        assert_eq!(r.keyword("missing"), None);
    }

    #[test]
    fn deprecated_via_message_or_flag() {
        assert!(is_deprecated(&json!({"deprecationMessage": "old"})));
        assert!(is_deprecated(&json!({"deprecated": true})));
        assert!(!is_deprecated(&json!({"type": "string"})));
    }

    #[test]
    fn pattern_cache_reuses_compiled_regex() {
        let a = compiled_pattern("^[a-z]+$").unwrap();
        let b = compiled_pattern("^[a-z]+$").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn malformed_pattern_cached_as_none() {
        assert!(compiled_pattern("(").is_none());
        assert!(compiled_pattern("(").is_none());
    }
}
