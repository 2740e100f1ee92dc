//! `format` keyword checks. Patterns are bit-exact against the ones named in
//! the external interface contract. Each check is a pure `&str -> bool`
//! predicate; unknown format names are accepted without error, matching the
//! rest of the validator's policy of ignoring keywords it doesn't recognize
//! rather than failing the document.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;

fn compiled(pattern: &str) -> Option<Arc<Regex>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Arc<Regex>>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().unwrap();
    guard
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).ok().map(Arc::new))
        .clone()
}

fn matches(pattern: &str, value: &str) -> bool {
    compiled(pattern).map(|re| re.is_match(value)).unwrap_or(true)
}

const DATE_TIME: &str = r"(?i)^(\d{4})-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9]|60)(\.[0-9]+)?(Z|[+-]([01][0-9]|2[0-3]):([0-5][0-9]))$";
const DATE: &str = r"^(\d{4})-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$";
const TIME: &str = r"(?i)^([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9]|60)(\.[0-9]+)?(Z|[+-]([01][0-9]|2[0-3]):([0-5][0-9]))$";
const COLOR_HEX: &str = r"^#([0-9A-Fa-f]{3,4}|([0-9A-Fa-f]{2}){3,4})$";
const EMAIL: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;
const URI_PARSE: &str = r"^(([^:/?#]+?):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?";

pub fn check(format: &str, value: &str) -> bool {
    match format {
        "date-time" => matches(DATE_TIME, value),
        "date" => matches(DATE, value),
        "time" => matches(TIME, value),
        "color-hex" => matches(COLOR_HEX, value),
        "email" => matches(EMAIL, value),
        "uri" => compiled(URI_PARSE)
            .and_then(|re| re.captures(value))
            .and_then(|caps| caps.get(2))
            .is_some(),
        "uri-reference" => matches(URI_PARSE, value),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(check("email", "a@b.com"));
        assert!(!check("email", "not-an-email"));
    }

    #[test]
    fn date_format() {
        assert!(check("date", "2024-01-01"));
        assert!(!check("date", "2024-1-1"));
    }

    #[test]
    fn date_format_rejects_out_of_range_month_and_day() {
        assert!(!check("date", "2024-13-01"));
        assert!(!check("date", "2024-01-32"));
    }

    #[test]
    fn date_time_format_allows_leap_second() {
        assert!(check("date-time", "2024-06-30T23:59:60Z"));
        assert!(!check("date-time", "2024-01-01T25:00:00Z"));
    }

    #[test]
    fn color_hex_format() {
        assert!(check("color-hex", "#fff"));
        assert!(check("color-hex", "#a1b2c3"));
        assert!(!check("color-hex", "#ff"));
        assert!(!check("color-hex", "fff"));
    }

    #[test]
    fn uri_format_requires_a_scheme() {
        assert!(check("uri", "http://example.com"));
        assert!(!check("uri", "not a uri"));
    }

    #[test]
    fn uri_reference_format_allows_relative_references() {
        assert!(check("uri-reference", "/relative/path"));
        assert!(check("uri-reference", "http://example.com"));
    }

    #[test]
    fn unknown_format_passes() {
        assert!(check("made-up-format", "anything"));
    }
}
