//! Engine error types and validation explanations
//!
//! Two shapes of failure come out of the schema engine:
//! - `EngineError`: the engine itself could not perform an operation
//!   (unparseable schema, impossible coercion, malformed transformer spec)
//! - `Explanation`: a value was examined and found not to satisfy a schema;
//!   carries the field path, the expected shape, and what was found instead

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by schema-engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The schema value is not a recognizable schema expression.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// A value member could not be coerced toward its declared shape.
    #[error("cannot coerce value at '{path}' to {expected}")]
    Coercion { path: String, expected: String },

    /// The transformer spec is not a recognizable transformer description.
    #[error("malformed transformer spec: {0}")]
    MalformedTransformer(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a value failed validation.
///
/// `path` is dotted/indexed (`$root[1].address.city`), `expected` describes
/// the schema's demand, `actual` what the value offered, and `message` is the
/// human-readable summary combining the three.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// Field path from the validated root
    pub path: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
    /// Human-readable summary
    pub message: String,
}

impl Explanation {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let expected = expected.into();
        let actual = actual.into();
        let message = format!("at '{}': expected {}, got {}", path, expected, actual);
        Self {
            path,
            expected,
            actual,
            message,
        }
    }

    /// A type mismatch against a concrete value.
    pub fn mismatch(path: impl Into<String>, expected: impl Into<String>, actual: &Value) -> Self {
        Self::new(path, expected, json_type_name(actual))
    }

    /// A required map key is absent.
    pub fn missing_key(path: impl Into<String>) -> Self {
        Self::new(path, "key to be present", "missing")
    }

    /// A map carries a key the schema does not declare.
    pub fn extra_key(path: impl Into<String>) -> Self {
        Self::new(path, "no undeclared keys", "extra key present")
    }

    /// A tuple has the wrong number of elements.
    pub fn arity(path: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(
            path,
            format!("tuple of {} elements", expected),
            format!("{} elements", actual),
        )
    }

    /// The schema itself could not be parsed on the generic validation path.
    pub fn parse_failure(detail: impl Into<String>) -> Self {
        Self::new("$schema", "a parseable schema", detail.into())
    }

    /// A precompiled validator could not be built; every value is reported
    /// invalid with this explanation.
    pub fn compile_failure(detail: impl Into<String>) -> Self {
        Self::new("$schema", "a compilable schema", detail.into())
    }

    /// The underlying function body raised instead of returning.
    pub fn execution(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let mut explanation = Self::new("$body", "successful execution", detail);
        explanation.message = format!("execution failed: {}", explanation.actual);
        explanation
    }

    /// Returns the human-readable summary.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(true)), "bool");
        assert_eq!(json_type_name(&json!(1)), "int");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }

    #[test]
    fn test_explanation_message_includes_path() {
        let explanation = Explanation::mismatch("$root[1]", "int", &json!("x"));
        assert!(explanation.message().contains("$root[1]"));
        assert!(explanation.message().contains("int"));
        assert!(explanation.message().contains("string"));
    }

    #[test]
    fn test_execution_explanation_carries_detail() {
        let explanation = Explanation::execution("division by zero");
        assert!(explanation.message().contains("execution failed"));
        assert!(explanation.message().contains("division by zero"));
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::Coercion {
            path: "$root[0]".into(),
            expected: "int".into(),
        };
        assert!(err.to_string().contains("$root[0]"));
    }
}
