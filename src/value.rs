//! Conversion from parsed AST nodes to [`serde_json::Value`], used wherever
//! the validator needs to compare against schema-side literals (`enum`,
//! `const`, `default`) that live as plain JSON values.

use serde_json::{Map, Number, Value};

use crate::ast::{JSONDocument, NodeData, NodeId};

pub fn to_json_value(doc: &JSONDocument, id: NodeId) -> Value {
    match &doc.node(id).data {
        NodeData::Null => Value::Null,
        NodeData::Boolean(b) => Value::Bool(*b),
        NodeData::Number { value, is_integer, raw } => {
            if *is_integer {
                if let Ok(i) = raw.parse::<i64>() {
                    return Value::Number(Number::from(i));
                }
            }
            Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null)
        }
        NodeData::String(s) => Value::String(s.clone()),
        NodeData::Array(items) => Value::Array(items.iter().map(|c| to_json_value(doc, *c)).collect()),
        NodeData::Object(props) => {
            let mut map = Map::new();
            for prop_id in props {
                if let NodeData::Property { key, value, .. } = &doc.node(*prop_id).data {
                    let key_str = doc.node(*key).as_str().unwrap_or_default().to_string();
                    let v = value.map(|v| to_json_value(doc, v)).unwrap_or(Value::Null);
                    map.insert(key_str, v);
                }
            }
            Value::Object(map)
        }
        NodeData::Property { value, .. } => value.map(|v| to_json_value(doc, v)).unwrap_or(Value::Null),
    }
}

/// Node-kind tag as used by the `type` keyword ("object", "array", "string",
/// "number", "integer", "boolean", "null").
pub fn node_type_tag(doc: &JSONDocument, id: NodeId) -> &'static str {
    match &doc.node(id).data {
        NodeData::Null => "null",
        NodeData::Boolean(_) => "boolean",
        NodeData::Number { is_integer, .. } => {
            if *is_integer {
                "integer"
            } else {
                "number"
            }
        }
        NodeData::String(_) => "string",
        NodeData::Array(_) => "array",
        NodeData::Object(_) => "object",
        NodeData::Property { .. } => "object",
    }
}

pub fn deep_equal(a: &Value, b: &Value) -> bool {
    a == b
}
