//! Coercion, strip decoding, and transformers for the default JSON engine
//!
//! Coercion is best-effort conversion toward a schema's declared shape:
//! string to int/float/bool and int to float, recursively through tuples,
//! arrays, and declared map fields. Values already of the declared type pass
//! through; values of an unrelated type also pass through so that ordinary
//! validation reports them. Only a conversion that was attempted and failed
//! (an unparseable string) is a coercion error.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::errors::{EngineError, EngineResult};
use super::schema::SchemaExpr;
use super::Transformer;

/// Coerces `value` toward `schema`, best-effort.
pub fn coerce(schema: &SchemaExpr, value: &Value) -> EngineResult<Value> {
    coerce_at(schema, value, "$root")
}

fn coerce_at(schema: &SchemaExpr, value: &Value, path: &str) -> EngineResult<Value> {
    match schema {
        SchemaExpr::Int | SchemaExpr::PosInt => match value.as_str() {
            Some(s) => {
                let n: i64 = s.trim().parse().map_err(|_| EngineError::Coercion {
                    path: path.to_string(),
                    expected: "int".to_string(),
                })?;
                Ok(Value::from(n))
            }
            None => Ok(value.clone()),
        },
        SchemaExpr::Float => match value {
            Value::String(s) => {
                let n: f64 = s.trim().parse().map_err(|_| EngineError::Coercion {
                    path: path.to_string(),
                    expected: "float".to_string(),
                })?;
                Ok(Value::from(n))
            }
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                Ok(Value::from(n.as_f64().unwrap_or(0.0)))
            }
            _ => Ok(value.clone()),
        },
        SchemaExpr::Bool => match value.as_str() {
            Some("true") => Ok(Value::Bool(true)),
            Some("false") => Ok(Value::Bool(false)),
            Some(_) => Err(EngineError::Coercion {
                path: path.to_string(),
                expected: "bool".to_string(),
            }),
            None => Ok(value.clone()),
        },
        SchemaExpr::Tuple(members) => match value.as_array() {
            Some(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    match members.get(i) {
                        Some(member) => out.push(coerce_at(member, item, &item_path)?),
                        None => out.push(item.clone()),
                    }
                }
                Ok(Value::Array(out))
            }
            None => Ok(value.clone()),
        },
        SchemaExpr::Array(element) => match value.as_array() {
            Some(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    out.push(coerce_at(element, item, &item_path)?);
                }
                Ok(Value::Array(out))
            }
            None => Ok(value.clone()),
        },
        SchemaExpr::Map { fields, .. } => match value.as_object() {
            Some(obj) => {
                let mut out = Map::new();
                for (key, member) in obj {
                    match fields.get(key) {
                        Some(field) => {
                            let field_path = format!("{}.{}", path, key);
                            out.insert(key.clone(), coerce_at(&field.expr, member, &field_path)?);
                        }
                        // Undeclared keys pass through untouched.
                        None => {
                            out.insert(key.clone(), member.clone());
                        }
                    }
                }
                Ok(Value::Object(out))
            }
            None => Ok(value.clone()),
        },
        SchemaExpr::Any | SchemaExpr::Str(_) | SchemaExpr::Function { .. } => Ok(value.clone()),
    }
}

/// Rewrites a raw schema value so every map form becomes its strip variant.
///
/// Operates on the raw schema language so the result feeds back into any
/// engine operation unchanged.
pub fn strip_unknown_keys(raw: &Value) -> Value {
    match raw {
        Value::Array(items) => {
            let head = items.first().and_then(Value::as_str);
            match head {
                Some("map") | Some("strip_map") => {
                    let mut out = vec![Value::from("strip_map")];
                    for rest in &items[1..] {
                        out.push(strip_fields(rest));
                    }
                    Value::Array(out)
                }
                Some("tuple") | Some("array") | Some("=>") | Some("optional") => {
                    let mut out = vec![items[0].clone()];
                    for rest in &items[1..] {
                        out.push(strip_unknown_keys(rest));
                    }
                    Value::Array(out)
                }
                _ => raw.clone(),
            }
        }
        _ => raw.clone(),
    }
}

fn strip_fields(raw: &Value) -> Value {
    match raw {
        Value::Object(fields) => {
            let mut out = Map::new();
            for (name, field) in fields {
                out.insert(name.clone(), strip_unknown_keys(field));
            }
            Value::Object(out)
        }
        _ => raw.clone(),
    }
}

/// Decodes `value` through `schema`: strip-variant maps drop undeclared
/// keys, everything else passes through structurally.
pub fn decode(schema: &SchemaExpr, value: &Value) -> Value {
    match schema {
        SchemaExpr::Map { fields, strip } => match value.as_object() {
            Some(obj) => {
                let mut out = Map::new();
                for (key, member) in obj {
                    match fields.get(key) {
                        Some(field) => {
                            out.insert(key.clone(), decode(&field.expr, member));
                        }
                        None => {
                            if !*strip {
                                out.insert(key.clone(), member.clone());
                            }
                        }
                    }
                }
                Value::Object(out)
            }
            None => value.clone(),
        },
        SchemaExpr::Tuple(members) => match value.as_array() {
            Some(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match members.get(i) {
                        Some(member) => decode(member, item),
                        None => item.clone(),
                    })
                    .collect(),
            ),
            None => value.clone(),
        },
        SchemaExpr::Array(element) => match value.as_array() {
            Some(items) => Value::Array(items.iter().map(|item| decode(element, item)).collect()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Builds a transformer from its JSON spec.
///
/// Recognized operations, applied in fixed order:
/// 1. `"rename": {"old": "new"}` - top-level key renames
/// 2. `"defaults": {"key": value}` - insert missing top-level keys
/// 3. `"trim_strings": true` - trim every string, recursively
pub fn build_transformer(spec: &Value) -> EngineResult<Transformer> {
    let ops = spec.as_object().ok_or_else(|| {
        EngineError::MalformedTransformer(format!(
            "expected an object, got {}",
            super::errors::json_type_name(spec)
        ))
    })?;

    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    let mut defaults: BTreeMap<String, Value> = BTreeMap::new();
    let mut trim_strings = false;

    for (key, value) in ops {
        match key.as_str() {
            "rename" => {
                let pairs = value.as_object().ok_or_else(|| {
                    EngineError::MalformedTransformer("rename must be an object".into())
                })?;
                for (old, new) in pairs {
                    let new = new.as_str().ok_or_else(|| {
                        EngineError::MalformedTransformer("rename targets must be strings".into())
                    })?;
                    renames.insert(old.clone(), new.to_string());
                }
            }
            "defaults" => {
                let pairs = value.as_object().ok_or_else(|| {
                    EngineError::MalformedTransformer("defaults must be an object".into())
                })?;
                for (name, default) in pairs {
                    defaults.insert(name.clone(), default.clone());
                }
            }
            "trim_strings" => {
                trim_strings = value.as_bool().ok_or_else(|| {
                    EngineError::MalformedTransformer("trim_strings must be a boolean".into())
                })?;
            }
            other => {
                return Err(EngineError::MalformedTransformer(format!(
                    "unknown operation '{}'",
                    other
                )))
            }
        }
    }

    Ok(Transformer::new(move |value: &Value| {
        let mut out = value.clone();
        if let Value::Object(obj) = &mut out {
            for (old, new) in &renames {
                if let Some(member) = obj.remove(old) {
                    obj.insert(new.clone(), member);
                }
            }
            for (name, default) in &defaults {
                if !obj.contains_key(name) {
                    obj.insert(name.clone(), default.clone());
                }
            }
        }
        if trim_strings {
            trim_all(&mut out);
        }
        out
    }))
}

fn trim_all(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(trim_all),
        Value::Object(obj) => obj.values_mut().for_each(trim_all),
        _ => {}
    }
}
