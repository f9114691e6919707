//! Schema normalization
//!
//! Canonicalizes any resolved schema value into `{args, ret?}`:
//! - a keyed map contributes its `args` member and, when present, its `ret`
//!   member
//! - a sequence form or kind string becomes the args schema whole; this is
//!   where the bare function-type shorthand folds in, so return checking is
//!   then whatever the engine's function-schema semantics do when the
//!   argument tuple is validated against it
//!
//! Pure and deterministic; the only failure mode is a structurally
//! malformed shape.

use serde_json::Value;

use crate::engine::json_type_name;

use super::errors::{SpecError, SpecResult};

/// The canonical `{args, ret?}` pair. Absence of `ret` means no return
/// checking occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    /// Schema the argument tuple is validated against
    pub args: Value,
    /// Schema the result is validated against, when present
    pub ret: Option<Value>,
}

/// Normalizes a raw schema value into its `{args, ret?}` form.
pub fn normalize(function: &str, raw: &Value) -> SpecResult<ResolvedSchema> {
    match raw {
        Value::Object(members) => {
            let args = members.get("args").cloned().ok_or_else(|| {
                SpecError::MalformedSchema {
                    function: function.to_string(),
                    reason: "keyed schema map is missing 'args'".to_string(),
                }
            })?;
            Ok(ResolvedSchema {
                args,
                ret: members.get("ret").cloned(),
            })
        }
        Value::Array(_) | Value::String(_) => Ok(ResolvedSchema {
            args: raw.clone(),
            ret: None,
        }),
        other => Err(SpecError::MalformedSchema {
            function: function.to_string(),
            reason: format!(
                "expected a sequence form or keyed map, got {}",
                json_type_name(other)
            ),
        }),
    }
}
