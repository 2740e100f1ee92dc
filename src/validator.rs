//! Walks a parsed document against a JSON Schema, producing diagnostics and
//! a record of which schema applied at each node (used to answer "what
//! schema is active here" queries for hover/completion).

use serde_json::Value;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::ast::{JSONDocument, NodeData, NodeId, NodeKind};
use crate::diagnostic::{self, ProblemCode};
use crate::numeric;
use crate::schema::{self, SchemaRef};
use crate::value;

#[derive(Debug, Clone)]
pub struct Problem {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub code: Option<ProblemCode>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub problems: Vec<Problem>,
    pub property_matches: i32,
    pub properties_value_matches: i32,
    pub primary_value_matches: i32,
    pub enum_value_match: bool,
    pub enum_values: Vec<Value>,
}

impl ValidationResult {
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    /// Folds `other` fully into `self`. Used by combinators (`allOf`, the
    /// winning `anyOf`/`oneOf` branch, `not`, `if`/`then`/`else`,
    /// `dependencies` schemas) where the sub-result genuinely *is* the
    /// outer result, as opposed to [`ValidationResult::merge_property_match`]'s
    /// per-property bookkeeping.
    pub fn merge(&mut self, other: &ValidationResult) {
        self.problems.extend(other.problems.iter().cloned());
        self.property_matches += other.property_matches;
        self.properties_value_matches += other.properties_value_matches;
        self.primary_value_matches += other.primary_value_matches;
        self.enum_value_match = self.enum_value_match || other.enum_value_match;
        self.enum_values.extend(other.enum_values.iter().cloned());
    }

    /// Folds one property's (or array item's) sub-result into the parent.
    /// `property_matches` counts properties/items *seen*, incremented by
    /// exactly one regardless of how many matches `sub` itself accumulated
    /// internally — a deeply nested object's own property count must not
    /// leak upward and inflate an ancestor's score.
    pub fn merge_property_match(&mut self, sub: &ValidationResult) {
        self.problems.extend(sub.problems.iter().cloned());
        self.property_matches += 1;
        if sub.enum_value_match || (!sub.has_problems() && sub.property_matches >= 1) {
            self.properties_value_matches += 1;
        }
        if sub.enum_value_match && sub.enum_values.len() == 1 {
            self.primary_value_matches += 1;
        }
    }

    /// Combines the candidate value lists of two tied alternatives that
    /// both failed on `enum`/`const`, and rewrites their mismatch
    /// message(s) to the union so the reported "valid values" list reflects
    /// every alternative instead of just one.
    pub fn merge_enum_values(&mut self, other: &ValidationResult) {
        self.enum_value_match = self.enum_value_match || other.enum_value_match;
        for v in &other.enum_values {
            if !self.enum_values.iter().any(|existing| value::deep_equal(existing, v)) {
                self.enum_values.push(v.clone());
            }
        }
        if self.enum_values.is_empty() {
            return;
        }
        let rendered: Vec<String> = self.enum_values.iter().map(|v| v.to_string()).collect();
        for problem in &mut self.problems {
            if problem.code == Some(ProblemCode::EnumValueMismatch) {
                problem.message = format!("Value is not accepted. Valid values: {}.", rendered.join(", "));
            }
        }
    }

    /// Ranking used to pick the best-fitting branch of `anyOf`/`oneOf`: no
    /// problems beats some, a matched `enum`/`const` beats none, then more
    /// matched type/property-value/property signals beat fewer.
    pub fn compare(&self, other: &ValidationResult) -> std::cmp::Ordering {
        let key = |r: &ValidationResult| {
            (
                r.has_problems(),
                !r.enum_value_match,
                -r.primary_value_matches,
                -r.properties_value_matches,
                -r.property_matches,
            )
        };
        key(self).cmp(&key(other))
    }
}

/// Collects schemas that applied to nodes under `focus_offset` (or every
/// node, when unset). `NoOp` is used when callers only want diagnostics.
pub enum Collector {
    NoOp,
    Full {
        matches: Vec<SchemaMatch>,
        focus_offset: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct SchemaMatch {
    pub node_offset: usize,
    pub node_length: usize,
    pub schema: Value,
}

impl Collector {
    pub fn full(focus_offset: Option<usize>) -> Self {
        Collector::Full {
            matches: Vec::new(),
            focus_offset,
        }
    }

    fn add(&mut self, node_offset: usize, node_length: usize, schema: &Value) {
        if let Collector::Full { matches, focus_offset } = self {
            let in_focus = focus_offset
                .map(|o| node_offset <= o && o <= node_offset + node_length)
                .unwrap_or(true);
            if in_focus {
                matches.push(SchemaMatch {
                    node_offset,
                    node_length,
                    schema: schema.clone(),
                });
            }
        }
    }

    /// A fresh collector for a trial evaluation (one `anyOf`/`oneOf` branch,
    /// a `not`/`if` probe) that the caller decides whether to keep.
    pub fn new_sub(&self) -> Collector {
        match self {
            Collector::NoOp => Collector::NoOp,
            Collector::Full { focus_offset, .. } => Collector::Full {
                matches: Vec::new(),
                focus_offset: *focus_offset,
            },
        }
    }

    pub fn merge_from(&mut self, other: Collector) {
        if let Collector::Full { matches, .. } = self {
            if let Collector::Full { matches: other_matches, .. } = other {
                matches.extend(other_matches);
            }
        }
    }

    pub fn into_matches(self) -> Vec<SchemaMatch> {
        match self {
            Collector::NoOp => Vec::new(),
            Collector::Full { matches, .. } => matches,
        }
    }
}

/// Validates `node_id` against `schema`, recording matching schemas into
/// `collector`. This is the entry point; property values are validated
/// through [`validate_node_impl`] with the self-deprecation hint suppressed,
/// since the object validator already reports it at the property's key.
pub fn validate_node(doc: &JSONDocument, node_id: NodeId, schema: &Value, collector: &mut Collector) -> ValidationResult {
    validate_node_impl(doc, node_id, schema, collector, true)
}

fn validate_node_impl(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    emit_self_deprecation: bool,
) -> ValidationResult {
    let node = doc.node(node_id);
    collector.add(node.offset, node.length, schema);
    let mut result = ValidationResult::default();

    match SchemaRef::from_value(schema) {
        SchemaRef::Always(true) => return result,
        SchemaRef::Always(false) => {
            result.problems.push(Problem {
                offset: node.offset,
                length: node.length.max(1),
                message: "Matches a schema that always fails".to_string(),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
            return result;
        }
        SchemaRef::Object(obj) => {
            if emit_self_deprecation && schema::is_deprecated(obj) {
                result.problems.push(Problem {
                    offset: node.offset,
                    length: node.length.max(1),
                    message: schema::deprecation_message(obj),
                    severity: DiagnosticSeverity::HINT,
                    code: None,
                });
            }

            validate_type(doc, node_id, obj, &mut result);
            validate_enum(doc, node_id, obj, &mut result);
            validate_const(doc, node_id, obj, &mut result);

            match doc.node(node_id).kind() {
                NodeKind::Number => validate_number(doc, node_id, obj, &mut result),
                NodeKind::String => validate_string(doc, node_id, obj, &mut result),
                NodeKind::Array => validate_array(doc, node_id, obj, collector, &mut result),
                NodeKind::Object => validate_object(doc, node_id, obj, collector, &mut result),
                _ => {}
            }

            validate_all_of(doc, node_id, obj, collector, &mut result);
            validate_any_of(doc, node_id, obj, collector, &mut result);
            validate_one_of(doc, node_id, obj, collector, &mut result);
            validate_not(doc, node_id, obj, collector, &mut result);
            validate_if_then_else(doc, node_id, obj, collector, &mut result);
        }
    }

    result
}

fn validate_type(doc: &JSONDocument, node_id: NodeId, schema: &Value, result: &mut ValidationResult) {
    let Some(type_value) = schema.get("type") else { return };
    let actual = value::node_type_tag(doc, node_id);
    let matches_one = |expected: &str| expected == actual || (expected == "number" && actual == "integer");

    let ok = match type_value {
        Value::String(s) => matches_one(s),
        Value::Array(arr) => arr.iter().filter_map(Value::as_str).any(matches_one),
        _ => true,
    };

    if ok {
        result.primary_value_matches += 1;
        return;
    }

    let expected: Vec<&str> = match type_value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let node = doc.node(node_id);
    let message = schema::error_message(schema)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Incorrect type. Expected \"{}\".", expected.join(" | ")));
    result.problems.push(Problem {
        offset: node.offset,
        length: node.length.max(1),
        message,
        severity: DiagnosticSeverity::ERROR,
        code: None,
    });
}

fn validate_enum(doc: &JSONDocument, node_id: NodeId, schema: &Value, result: &mut ValidationResult) {
    let Some(Value::Array(values)) = schema.get("enum") else { return };
    result.enum_values = values.clone();
    let actual = value::to_json_value(doc, node_id);
    if values.iter().any(|v| value::deep_equal(v, &actual)) {
        result.enum_value_match = true;
        return;
    }
    let node = doc.node(node_id);
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    result.problems.push(Problem {
        offset: node.offset,
        length: node.length.max(1),
        message: format!("Value is not accepted. Valid values: {}.", rendered.join(", ")),
        severity: DiagnosticSeverity::ERROR,
        code: Some(ProblemCode::EnumValueMismatch),
    });
}

fn validate_const(doc: &JSONDocument, node_id: NodeId, schema: &Value, result: &mut ValidationResult) {
    let Some(expected) = schema.get("const") else { return };
    result.enum_values = vec![expected.clone()];
    let actual = value::to_json_value(doc, node_id);
    if value::deep_equal(expected, &actual) {
        result.enum_value_match = true;
        return;
    }
    let node = doc.node(node_id);
    result.problems.push(Problem {
        offset: node.offset,
        length: node.length.max(1),
        message: format!("Value must be {}.", expected),
        severity: DiagnosticSeverity::ERROR,
        code: Some(ProblemCode::EnumValueMismatch),
    });
}

fn validate_number(doc: &JSONDocument, node_id: NodeId, schema: &Value, result: &mut ValidationResult) {
    let NodeData::Number { value: num, raw, .. } = &doc.node(node_id).data else {
        return;
    };
    let node = doc.node(node_id);
    let offset = node.offset;
    let length = node.length.max(1);

    if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
        let exclusive = matches!(schema.get("exclusiveMinimum"), Some(Value::Bool(true)));
        let fails = if exclusive { *num <= min } else { *num < min };
        if fails {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Value is below the minimum of {}.", min),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(ex_min) = schema.get("exclusiveMinimum").and_then(Value::as_f64) {
        if *num <= ex_min {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Value is below the exclusive minimum of {}.", ex_min),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
        let exclusive = matches!(schema.get("exclusiveMaximum"), Some(Value::Bool(true)));
        let fails = if exclusive { *num >= max } else { *num > max };
        if fails {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Value is above the maximum of {}.", max),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(ex_max) = schema.get("exclusiveMaximum").and_then(Value::as_f64) {
        if *num >= ex_max {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Value is above the exclusive maximum of {}.", ex_max),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(mult_value) = schema.get("multipleOf") {
        if let Some(mult) = mult_value.as_f64() {
            let mult_raw = mult_value.to_string();
            if !numeric::is_multiple_of(*num, raw, mult, &mult_raw) {
                result.problems.push(Problem {
                    offset,
                    length,
                    message: format!("Value is not a multiple of {}.", mult),
                    severity: DiagnosticSeverity::ERROR,
                    code: None,
                });
            }
        }
    }
}

fn validate_string(doc: &JSONDocument, node_id: NodeId, schema: &Value, result: &mut ValidationResult) {
    let Some(s) = doc.node(node_id).as_str() else {
        return;
    };
    let node = doc.node(node_id);
    let offset = node.offset;
    let length = node.length.max(1);
    let utf16_len = s.chars().map(char::len_utf16).sum::<usize>() as u64;

    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if utf16_len < min {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("String is shorter than the minimum length of {}.", min),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if utf16_len > max {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("String is longer than the maximum length of {}.", max),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(Value::String(pattern)) = schema.get("pattern") {
        if let Some(re) = schema::compiled_pattern(pattern) {
            if !re.is_match(s) {
                let message = schema::pattern_error_message(schema)
                    .or_else(|| schema::error_message(schema))
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("String does not match the pattern of \"{}\".", pattern));
                result.problems.push(Problem {
                    offset,
                    length,
                    message,
                    severity: DiagnosticSeverity::ERROR,
                    code: None,
                });
            }
        }
    }
    if let Some(Value::String(fmt)) = schema.get("format") {
        if !crate::format::check(fmt, s) {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("String does not match the format \"{}\".", fmt),
                severity: DiagnosticSeverity::WARNING,
                code: None,
            });
        }
    }
}

fn validate_array(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let NodeData::Array(items) = &doc.node(node_id).data else {
        return;
    };
    let items = items.clone();
    let node = doc.node(node_id);
    let offset = node.offset;
    let length = node.length.max(1);

    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if (items.len() as u64) < min {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Array has too few items. Expected {} or more.", min),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
        if (items.len() as u64) > max {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Array has too many items. Expected {} or fewer.", max),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if matches!(schema.get("uniqueItems"), Some(Value::Bool(true))) {
        let values: Vec<Value> = items.iter().map(|id| value::to_json_value(doc, *id)).collect();
        let has_duplicate = (0..values.len())
            .any(|i| ((i + 1)..values.len()).any(|j| value::deep_equal(&values[i], &values[j])));
        if has_duplicate {
            result.problems.push(Problem {
                offset,
                length,
                message: "Array has duplicate items.".to_string(),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }

    match schema.get("items") {
        Some(Value::Array(tuple_schemas)) => {
            for (i, item_id) in items.iter().enumerate() {
                if let Some(item_schema) = tuple_schemas.get(i) {
                    let sub = validate_node_impl(doc, *item_id, item_schema, collector, true);
                    result.merge_property_match(&sub);
                } else if let Some(Value::Bool(false)) = schema.get("additionalItems") {
                    result.problems.push(Problem {
                        offset,
                        length,
                        message: format!("Array has too many items. Expected {} or fewer.", tuple_schemas.len()),
                        severity: DiagnosticSeverity::ERROR,
                        code: None,
                    });
                } else if let Some(additional) = schema.get("additionalItems") {
                    let sub = validate_node_impl(doc, *item_id, additional, collector, true);
                    result.merge_property_match(&sub);
                }
            }
        }
        Some(item_schema) => {
            for item_id in &items {
                let sub = validate_node_impl(doc, *item_id, item_schema, collector, true);
                result.merge_property_match(&sub);
            }
        }
        None => {}
    }

    if let Some(contains_schema) = schema.get("contains") {
        let any_ok = items.iter().any(|item_id| {
            let mut sub_collector = collector.new_sub();
            let sub = validate_node_impl(doc, *item_id, contains_schema, &mut sub_collector, true);
            collector.merge_from(sub_collector);
            !sub.has_problems()
        });
        if !any_ok {
            result.problems.push(Problem {
                offset,
                length,
                message: "Array does not contain a matching item.".to_string(),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
}

fn validate_object(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let NodeData::Object(props) = &doc.node(node_id).data else {
        return;
    };
    let props = props.clone();
    let node = doc.node(node_id);
    let offset = node.offset;
    let length = node.length.max(1);

    let mut seen: Vec<(String, NodeId, Option<NodeId>)> = Vec::new();
    for prop_id in &props {
        if let NodeData::Property { key, value, .. } = &doc.node(*prop_id).data {
            if let Some(key_str) = doc.node(*key).as_str() {
                seen.push((key_str.to_string(), *key, *value));
            }
        }
    }

    if let Some(min) = schema.get("minProperties").and_then(Value::as_u64) {
        if (seen.len() as u64) < min {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Object has fewer properties than the required minimum of {}.", min),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(max) = schema.get("maxProperties").and_then(Value::as_u64) {
        if (seen.len() as u64) > max {
            result.problems.push(Problem {
                offset,
                length,
                message: format!("Object has more properties than the allowed maximum of {}.", max),
                severity: DiagnosticSeverity::ERROR,
                code: None,
            });
        }
    }
    if let Some(Value::Array(required)) = schema.get("required") {
        for req in required.iter().filter_map(Value::as_str) {
            if !seen.iter().any(|(k, ..)| k == req) {
                result.problems.push(Problem {
                    offset,
                    length,
                    message: format!("Missing property \"{}\".", req),
                    severity: DiagnosticSeverity::WARNING,
                    code: None,
                });
            }
        }
    }

    let properties = schema.get("properties");
    let pattern_properties = schema.get("patternProperties");
    let additional_properties = schema.get("additionalProperties");

    for (key_str, key_id, value_id) in &seen {
        let mut matched_any = false;

        if let Some(Value::Object(prop_schemas)) = properties {
            if let Some(prop_schema) = prop_schemas.get(key_str) {
                matched_any = true;
                if schema::is_deprecated(prop_schema) {
                    let key_node = doc.node(*key_id);
                    result.problems.push(Problem {
                        offset: key_node.offset,
                        length: key_node.length.max(1),
                        message: schema::deprecation_message(prop_schema),
                        severity: DiagnosticSeverity::HINT,
                        code: None,
                    });
                }
                if let Some(v) = value_id {
                    let sub = validate_node_impl(doc, *v, prop_schema, collector, false);
                    result.merge_property_match(&sub);
                } else {
                    result.property_matches += 1;
                }
            }
        }

        if let Some(Value::Object(pattern_schemas)) = pattern_properties {
            for (pattern, pattern_schema) in pattern_schemas {
                if schema::compiled_pattern(pattern).map(|re| re.is_match(key_str)).unwrap_or(false) {
                    matched_any = true;
                    if let Some(v) = value_id {
                        let sub = validate_node_impl(doc, *v, pattern_schema, collector, true);
                        result.merge_property_match(&sub);
                    } else {
                        result.property_matches += 1;
                    }
                }
            }
        }

        if !matched_any {
            match additional_properties {
                Some(Value::Bool(false)) => {
                    let key_node = doc.node(*key_id);
                    result.problems.push(Problem {
                        offset: key_node.offset,
                        length: key_node.length.max(1),
                        message: format!("Property {} is not allowed.", key_str),
                        severity: DiagnosticSeverity::ERROR,
                        code: None,
                    });
                }
                Some(additional_schema) if !matches!(additional_schema, Value::Bool(true)) => {
                    if let Some(v) = value_id {
                        let sub = validate_node_impl(doc, *v, additional_schema, collector, true);
                        result.merge_property_match(&sub);
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(names_schema) = schema.get("propertyNames") {
        for (_, key_id, _) in &seen {
            let sub = validate_node_impl(doc, *key_id, names_schema, collector, true);
            result.merge_property_match(&sub);
        }
    }

    if let Some(Value::Object(dependencies)) = schema.get("dependencies") {
        for (dep_key, dep_value) in dependencies {
            if !seen.iter().any(|(k, ..)| k == dep_key) {
                continue;
            }
            match dep_value {
                Value::Array(required_keys) => {
                    for req in required_keys.iter().filter_map(Value::as_str) {
                        if !seen.iter().any(|(k, ..)| k == req) {
                            result.problems.push(Problem {
                                offset,
                                length,
                                message: format!("Property \"{}\" depends on \"{}\" being present.", dep_key, req),
                                severity: DiagnosticSeverity::WARNING,
                                code: None,
                            });
                        }
                    }
                }
                dep_schema => {
                    let sub = validate_node_impl(doc, node_id, dep_schema, collector, true);
                    result.merge(&sub);
                }
            }
        }
    }
}

fn validate_all_of(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let Some(Value::Array(schemas)) = schema.get("allOf") else { return };
    for sub_schema in schemas {
        let sub = validate_node_impl(doc, node_id, sub_schema, collector, true);
        result.merge(&sub);
    }
}

fn test_alternatives(
    doc: &JSONDocument,
    node_id: NodeId,
    schemas: &[Value],
    collector: &mut Collector,
) -> Vec<ValidationResult> {
    schemas
        .iter()
        .map(|sub_schema| {
            let mut sub_collector = collector.new_sub();
            let sub = validate_node_impl(doc, node_id, sub_schema, &mut sub_collector, true);
            collector.merge_from(sub_collector);
            sub
        })
        .collect()
}

fn validate_any_of(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let Some(Value::Array(schemas)) = schema.get("anyOf") else { return };
    if schemas.is_empty() {
        return;
    }
    let alternatives = test_alternatives(doc, node_id, schemas, collector);
    let best = alternatives
        .into_iter()
        .min_by(ValidationResult::compare)
        .expect("anyOf schemas is non-empty");

    if best.has_problems() {
        let node = doc.node(node_id);
        result.problems.push(Problem {
            offset: node.offset,
            length: node.length.max(1),
            message: "Value does not match any of the allowed schemas.".to_string(),
            severity: DiagnosticSeverity::ERROR,
            code: None,
        });
        result.merge(&best);
    } else {
        result.merge_enum_values(&best);
        result.primary_value_matches += best.primary_value_matches;
        result.properties_value_matches += best.properties_value_matches;
        result.property_matches += best.property_matches;
    }
}

fn validate_one_of(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let Some(Value::Array(schemas)) = schema.get("oneOf") else { return };
    if schemas.is_empty() {
        return;
    }
    let alternatives = test_alternatives(doc, node_id, schemas, collector);
    let node = doc.node(node_id);
    let matching_count = alternatives.iter().filter(|r| !r.has_problems()).count();

    if matching_count == 1 {
        let best = alternatives.into_iter().find(|r| !r.has_problems()).unwrap();
        result.merge(&best);
    } else if matching_count == 0 {
        let best = alternatives
            .into_iter()
            .min_by(ValidationResult::compare)
            .expect("oneOf schemas is non-empty");
        result.problems.push(Problem {
            offset: node.offset,
            length: node.length.max(1),
            message: "Value does not match exactly one schema; it matches none.".to_string(),
            severity: DiagnosticSeverity::ERROR,
            code: None,
        });
        result.merge(&best);
    } else {
        result.problems.push(Problem {
            offset: node.offset,
            length: node.length.max(1),
            message: format!("Value matches {} schemas when exactly one is required.", matching_count),
            severity: DiagnosticSeverity::ERROR,
            code: None,
        });
    }
}

fn validate_not(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let Some(not_schema) = schema.get("not") else { return };
    let mut sub_collector = collector.new_sub();
    let sub = validate_node_impl(doc, node_id, not_schema, &mut sub_collector, true);
    collector.merge_from(sub_collector);
    if !sub.has_problems() {
        let node = doc.node(node_id);
        result.problems.push(Problem {
            offset: node.offset,
            length: node.length.max(1),
            message: "Value matches a schema it is expected not to match.".to_string(),
            severity: DiagnosticSeverity::ERROR,
            code: None,
        });
    }
}

fn validate_if_then_else(
    doc: &JSONDocument,
    node_id: NodeId,
    schema: &Value,
    collector: &mut Collector,
    result: &mut ValidationResult,
) {
    let Some(if_schema) = schema.get("if") else { return };
    let mut if_collector = collector.new_sub();
    let if_result = validate_node_impl(doc, node_id, if_schema, &mut if_collector, true);
    collector.merge_from(if_collector);

    if !if_result.has_problems() {
        if let Some(then_schema) = schema.get("then") {
            let sub = validate_node_impl(doc, node_id, then_schema, collector, true);
            result.merge(&sub);
        }
    } else if let Some(else_schema) = schema.get("else") {
        let sub = validate_node_impl(doc, node_id, else_schema, collector, true);
        result.merge(&sub);
    }
}

pub fn problem_to_diagnostic(doc: &JSONDocument, problem: Problem) -> Diagnostic {
    let range = doc.range_for(problem.offset, problem.length);
    if problem.severity == DiagnosticSeverity::HINT {
        diagnostic::deprecation_diagnostic_for_range(range, problem.message)
    } else {
        diagnostic::diagnostic_for_range(range, problem.message, problem.severity, problem.code.map(ProblemCode::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{self, ParseOptions};
    use serde_json::json;

    fn validate(text: &str, schema: &Value) -> ValidationResult {
        let doc = parser::parse(text, ParseOptions::default());
        let mut collector = Collector::NoOp;
        validate_node(&doc, doc.root.unwrap(), schema, &mut collector)
    }

    #[test]
    fn type_mismatch_is_reported() {
        let schema = json!({"type": "string"});
        let result = validate("42", &schema);
        assert!(result.has_problems());
    }

    #[test]
    fn required_property_missing() {
        let schema = json!({"type": "object", "required": ["name"]});
        let result = validate(r#"{"age": 1}"#, &schema);
        assert!(result.has_problems());
    }

    #[test]
    fn additional_properties_false_flags_unknown_key() {
        let schema = json!({"properties": {"a": {}}, "additionalProperties": false});
        let result = validate(r#"{"a": 1, "b": 2}"#, &schema);
        assert_eq!(result.problems.len(), 1);
    }

    #[test]
    fn exclusive_minimum_boolean_and_numeric_forms() {
        let bool_form = json!({"minimum": 0, "exclusiveMinimum": true});
        assert!(validate("0", &bool_form).has_problems());
        assert!(!validate("1", &bool_form).has_problems());

        let numeric_form = json!({"exclusiveMinimum": 0});
        assert!(validate("0", &numeric_form).has_problems());
        assert!(!validate("1", &numeric_form).has_problems());
    }

    #[test]
    fn multiple_of_handles_decimal_precision() {
        let schema = json!({"multipleOf": 0.1});
        assert!(!validate("0.3", &schema).has_problems());
        assert!(validate("0.31", &schema).has_problems());
    }

    #[test]
    fn one_of_picks_the_single_matching_branch() {
        let schema = json!({"oneOf": [{"type": "string"}, {"type": "number"}]});
        assert!(!validate("5", &schema).has_problems());
        assert!(!validate("\"x\"", &schema).has_problems());
    }

    #[test]
    fn one_of_flags_multiple_matches() {
        let schema = json!({"oneOf": [{"minimum": 0}, {"maximum": 100}]});
        assert!(validate("5", &schema).has_problems());
    }

    #[test]
    fn not_flags_matching_value() {
        let schema = json!({"not": {"type": "string"}});
        assert!(validate("\"x\"", &schema).has_problems());
        assert!(!validate("5", &schema).has_problems());
    }

    #[test]
    fn if_then_else_picks_the_right_branch() {
        let schema = json!({
            "if": {"type": "string"},
            "then": {"minLength": 3},
            "else": {"minimum": 10}
        });
        assert!(validate("\"ab\"", &schema).has_problems());
        assert!(!validate("\"abc\"", &schema).has_problems());
        assert!(validate("5", &schema).has_problems());
        assert!(!validate("20", &schema).has_problems());
    }

    #[test]
    fn deprecated_property_emits_hint_at_key_once() {
        let schema = json!({"properties": {"old": {"deprecationMessage": "use new instead"}}});
        let doc = parser::parse(r#"{"old": 1}"#, ParseOptions::default());
        let mut collector = Collector::NoOp;
        let result = validate_node(&doc, doc.root.unwrap(), &schema, &mut collector);
        let hints: Vec<&Problem> = result
            .problems
            .iter()
            .filter(|p| p.severity == DiagnosticSeverity::HINT)
            .collect();
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].offset, 1); // the `"old"` key, not the value
    }

    #[test]
    fn additional_items_false_reports_too_many_items_message() {
        let schema = json!({"items": [{"type": "number"}], "additionalItems": false});
        let result = validate("[1, 2, 3]", &schema);
        assert!(result.problems.iter().any(|p| p.message == "Array has too many items. Expected 1 or fewer."));
    }

    #[test]
    fn nested_property_match_counts_do_not_leak_into_the_parent() {
        // The nested object under "a" matches two of its own properties;
        // the outer object must still only count "a" itself as one match.
        let schema = json!({
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {"x": {}, "y": {}}
                }
            }
        });
        let result = validate(r#"{"a": {"x": 1, "y": 2}}"#, &schema);
        assert_eq!(result.property_matches, 1);
    }

    #[test]
    fn properties_value_matches_discriminates_any_of_alternatives() {
        // Both alternatives accept any object, but only the second actually
        // matches the declared property's value — it should win.
        let schema = json!({
            "anyOf": [
                {"type": "object"},
                {"type": "object", "properties": {"a": {"enum": [1]}}}
            ]
        });
        let mut collector = Collector::full(None);
        let doc = parser::parse(r#"{"a": 1}"#, ParseOptions::default());
        let result = validate_node(&doc, doc.root.unwrap(), &schema, &mut collector);
        assert!(!result.has_problems());
    }

    #[test]
    fn collector_records_matching_schemas() {
        let doc = parser::parse(r#"{"a": 1}"#, ParseOptions::default());
        let schema = json!({"type": "object"});
        let mut collector = Collector::full(None);
        validate_node(&doc, doc.root.unwrap(), &schema, &mut collector);
        assert!(!collector.into_matches().is_empty());
    }
}
