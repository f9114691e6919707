//! Validation walker for the default JSON engine
//!
//! Semantics:
//! - Fail-fast: the first violation produces the explanation
//! - Maps are closed: undeclared keys are invalid
//! - Type matching is exact: "int" rejects floats, "float" accepts any number
//! - Function shapes are satisfied by no data value
//! - Deterministic: same schema and value always produce the same outcome

use chrono::DateTime;
use serde_json::Value;
use uuid::Uuid;

use super::errors::{json_type_name, Explanation};
use super::schema::{SchemaExpr, StringConstraints, StringFormat};

/// Returns whether `value` satisfies `schema`.
pub fn check(schema: &SchemaExpr, value: &Value) -> bool {
    explain(schema, value).is_none()
}

/// Explains why `value` fails `schema`; `None` means the value is valid.
pub fn explain(schema: &SchemaExpr, value: &Value) -> Option<Explanation> {
    walk(schema, value, "$root")
}

fn walk(schema: &SchemaExpr, value: &Value, path: &str) -> Option<Explanation> {
    match schema {
        SchemaExpr::Any => None,
        SchemaExpr::Int => {
            if value.is_i64() || value.is_u64() {
                None
            } else {
                Some(Explanation::mismatch(path, "int", value))
            }
        }
        SchemaExpr::PosInt => {
            let positive = value
                .as_i64()
                .map(|n| n > 0)
                .or_else(|| value.as_u64().map(|n| n > 0));
            match positive {
                Some(true) => None,
                Some(false) => Some(Explanation::new(
                    path,
                    "positive int",
                    value.to_string(),
                )),
                None => Some(Explanation::mismatch(path, "positive int", value)),
            }
        }
        SchemaExpr::Float => {
            if value.is_number() {
                None
            } else {
                Some(Explanation::mismatch(path, "float", value))
            }
        }
        SchemaExpr::Bool => {
            if value.is_boolean() {
                None
            } else {
                Some(Explanation::mismatch(path, "bool", value))
            }
        }
        SchemaExpr::Str(constraints) => match value.as_str() {
            Some(s) => check_string(constraints, s, path),
            None => Some(Explanation::mismatch(path, "string", value)),
        },
        SchemaExpr::Tuple(members) => {
            let items = match value.as_array() {
                Some(items) => items,
                None => return Some(Explanation::mismatch(path, "tuple", value)),
            };
            if items.len() != members.len() {
                return Some(Explanation::arity(path, members.len(), items.len()));
            }
            for (i, (member, item)) in members.iter().zip(items).enumerate() {
                let member_path = format!("{}[{}]", path, i);
                if let Some(explanation) = walk(member, item, &member_path) {
                    return Some(explanation);
                }
            }
            None
        }
        SchemaExpr::Array(element) => {
            let items = match value.as_array() {
                Some(items) => items,
                None => return Some(Explanation::mismatch(path, "array", value)),
            };
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                if let Some(explanation) = walk(element, item, &item_path) {
                    return Some(explanation);
                }
            }
            None
        }
        SchemaExpr::Map { fields, .. } => {
            let obj = match value.as_object() {
                Some(obj) => obj,
                None => return Some(Explanation::mismatch(path, "map", value)),
            };

            // Closed map: undeclared keys are invalid, strip variant included.
            for key in obj.keys() {
                if !fields.contains_key(key) {
                    return Some(Explanation::extra_key(join(path, key)));
                }
            }

            for (name, field) in fields {
                let field_path = join(path, name);
                match obj.get(name) {
                    Some(member) => {
                        if let Some(explanation) = walk(&field.expr, member, &field_path) {
                            return Some(explanation);
                        }
                    }
                    None => {
                        if !field.optional {
                            return Some(Explanation::missing_key(field_path));
                        }
                    }
                }
            }
            None
        }
        SchemaExpr::Function { .. } => Some(Explanation::new(
            path,
            "function",
            format!("{} value", json_type_name(value)),
        )),
    }
}

fn check_string(constraints: &StringConstraints, s: &str, path: &str) -> Option<Explanation> {
    if let Some(pattern) = &constraints.pattern {
        if !pattern.is_match(s) {
            return Some(Explanation::new(
                path,
                format!("string matching /{}/", pattern.as_str()),
                format!("\"{}\"", s),
            ));
        }
    }
    match constraints.format {
        Some(StringFormat::Uuid) => {
            if Uuid::parse_str(s).is_err() {
                return Some(Explanation::new(path, "uuid string", format!("\"{}\"", s)));
            }
        }
        Some(StringFormat::Datetime) => {
            if DateTime::parse_from_rfc3339(s).is_err() {
                return Some(Explanation::new(
                    path,
                    "RFC 3339 datetime string",
                    format!("\"{}\"", s),
                ));
            }
        }
        None => {}
    }
    None
}

fn join(prefix: &str, key: &str) -> String {
    format!("{}.{}", prefix, key)
}
