//! Parsed schema representation for the default JSON engine
//!
//! Schema expressions are ordinary JSON values:
//! - kind strings: "any", "int", "pos_int", "float", "bool", "string"
//! - ["string", {"pattern": <regex>, "format": "uuid" | "datetime"}]
//! - ["tuple", s1, s2, ...]: exact arity, per-position schemas
//! - ["array", s]: homogeneous elements
//! - ["map", {field: s | ["optional", s], ...}]: closed map, undeclared
//!   keys are invalid
//! - ["strip_map", {fields}]: validates like "map"; decode removes
//!   undeclared keys
//! - ["=>", args, ret]: function shape; no data value satisfies it
//!
//! Parsing compiles `pattern` regexes once; the parsed form is what the
//! compiled validator closes over.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{json_type_name, EngineError, EngineResult};

/// A regex constraint, compiled once at schema-parse time.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern; a bad regex is a malformed schema.
    pub fn compile(raw: &str) -> EngineResult<Self> {
        let regex = Regex::new(raw)
            .map_err(|e| EngineError::MalformedSchema(format!("bad pattern '{}': {}", raw, e)))?;
        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::compile(&raw).map_err(serde::de::Error::custom)
    }
}

/// Named string formats checked beyond the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    /// RFC 4122 UUID text form
    Uuid,
    /// RFC 3339 timestamp
    Datetime,
}

/// Constraints attached to a "string" schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StringConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
}

/// A declared map field: its schema plus whether it may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub expr: SchemaExpr,
    pub optional: bool,
}

/// Parsed schema expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaExpr {
    Any,
    Int,
    PosInt,
    Float,
    Bool,
    Str(StringConstraints),
    Tuple(Vec<SchemaExpr>),
    Array(Box<SchemaExpr>),
    Map {
        fields: BTreeMap<String, FieldSchema>,
        /// When set, decode removes undeclared keys; validation is identical.
        strip: bool,
    },
    Function {
        args: Box<SchemaExpr>,
        ret: Box<SchemaExpr>,
    },
}

impl SchemaExpr {
    /// Parses a raw schema value into its checked representation.
    pub fn parse(raw: &Value) -> EngineResult<Self> {
        match raw {
            Value::String(kind) => Self::parse_kind(kind),
            Value::Array(items) => Self::parse_form(items),
            other => Err(EngineError::MalformedSchema(format!(
                "expected schema expression, got {}",
                json_type_name(other)
            ))),
        }
    }

    fn parse_kind(kind: &str) -> EngineResult<Self> {
        match kind {
            "any" => Ok(SchemaExpr::Any),
            "int" => Ok(SchemaExpr::Int),
            "pos_int" => Ok(SchemaExpr::PosInt),
            "float" => Ok(SchemaExpr::Float),
            "bool" => Ok(SchemaExpr::Bool),
            "string" => Ok(SchemaExpr::Str(StringConstraints::default())),
            other => Err(EngineError::MalformedSchema(format!(
                "unknown schema kind '{}'",
                other
            ))),
        }
    }

    fn parse_form(items: &[Value]) -> EngineResult<Self> {
        let head = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::MalformedSchema("compound form needs a string head".into()))?;

        match head {
            "string" => Self::parse_string_form(&items[1..]),
            "tuple" => {
                let members = items[1..]
                    .iter()
                    .map(Self::parse)
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(SchemaExpr::Tuple(members))
            }
            "array" => {
                if items.len() != 2 {
                    return Err(EngineError::MalformedSchema(
                        "array form takes exactly one element schema".into(),
                    ));
                }
                Ok(SchemaExpr::Array(Box::new(Self::parse(&items[1])?)))
            }
            "map" | "strip_map" => Self::parse_map_form(&items[1..], head == "strip_map"),
            "=>" => {
                if items.len() != 3 {
                    return Err(EngineError::MalformedSchema(
                        "function form takes an args schema and a ret schema".into(),
                    ));
                }
                Ok(SchemaExpr::Function {
                    args: Box::new(Self::parse(&items[1])?),
                    ret: Box::new(Self::parse(&items[2])?),
                })
            }
            "optional" => Err(EngineError::MalformedSchema(
                "optional is only valid inside a map form".into(),
            )),
            other => Err(EngineError::MalformedSchema(format!(
                "unknown form head '{}'",
                other
            ))),
        }
    }

    fn parse_string_form(rest: &[Value]) -> EngineResult<Self> {
        let mut constraints = StringConstraints::default();
        match rest {
            [] => {}
            [Value::Object(opts)] => {
                for (key, value) in opts {
                    match key.as_str() {
                        "pattern" => {
                            let raw = value.as_str().ok_or_else(|| {
                                EngineError::MalformedSchema("pattern must be a string".into())
                            })?;
                            constraints.pattern = Some(Pattern::compile(raw)?);
                        }
                        "format" => {
                            constraints.format = Some(match value.as_str() {
                                Some("uuid") => StringFormat::Uuid,
                                Some("datetime") => StringFormat::Datetime,
                                _ => {
                                    return Err(EngineError::MalformedSchema(format!(
                                        "unknown string format {}",
                                        value
                                    )))
                                }
                            });
                        }
                        other => {
                            return Err(EngineError::MalformedSchema(format!(
                                "unknown string constraint '{}'",
                                other
                            )))
                        }
                    }
                }
            }
            _ => {
                return Err(EngineError::MalformedSchema(
                    "string form takes one constraints object".into(),
                ))
            }
        }
        Ok(SchemaExpr::Str(constraints))
    }

    fn parse_map_form(rest: &[Value], strip: bool) -> EngineResult<Self> {
        let declared = match rest {
            [Value::Object(fields)] => fields,
            _ => {
                return Err(EngineError::MalformedSchema(
                    "map form takes one fields object".into(),
                ))
            }
        };

        let mut fields = BTreeMap::new();
        for (name, raw_field) in declared {
            let field = Self::parse_field(raw_field)?;
            fields.insert(name.clone(), field);
        }
        Ok(SchemaExpr::Map { fields, strip })
    }

    fn parse_field(raw: &Value) -> EngineResult<FieldSchema> {
        if let Value::Array(items) = raw {
            if items.first().and_then(Value::as_str) == Some("optional") {
                if items.len() != 2 {
                    return Err(EngineError::MalformedSchema(
                        "optional takes exactly one schema".into(),
                    ));
                }
                return Ok(FieldSchema {
                    expr: Self::parse(&items[1])?,
                    optional: true,
                });
            }
        }
        Ok(FieldSchema {
            expr: Self::parse(raw)?,
            optional: false,
        })
    }
}
