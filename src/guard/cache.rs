//! Validator cache
//!
//! Decides, once per schema member at wrap time, how checks are performed:
//! - cache on: the engine compiles a standalone validator predicate that is
//!   bound in the closure; a failed compilation degrades to a handle that
//!   reports every value invalid with the compilation error, so the
//!   definition itself still succeeds
//! - cache off: a thunk calls the engine's generic validate operation with
//!   the schema and the current value on every invocation
//!
//! Both paths must agree on accept/reject for the same schema and value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::{CompiledValidator, Explanation, SchemaEngine};

/// How a schema member is checked at call time. Chosen once at wrap time.
pub enum ValidatorHandle {
    /// Precompiled predicate; explanations come from the generic engine path
    Compiled {
        validator: CompiledValidator,
        engine: Arc<dyn SchemaEngine>,
        schema: Value,
    },
    /// Generic validate-against-schema on every call
    Generic {
        engine: Arc<dyn SchemaEngine>,
        schema: Value,
    },
    /// Compilation failed; every value reports invalid with the compile error
    Degraded { detail: String },
}

impl ValidatorHandle {
    /// Binds a handle for one schema member.
    pub fn bind(engine: Arc<dyn SchemaEngine>, schema: Value, cache: bool) -> Self {
        if !cache {
            return ValidatorHandle::Generic { engine, schema };
        }
        match engine.compile(&schema) {
            Ok(validator) => ValidatorHandle::Compiled {
                validator,
                engine,
                schema,
            },
            Err(e) => ValidatorHandle::Degraded {
                detail: e.to_string(),
            },
        }
    }

    /// Returns whether the value is accepted.
    pub fn check(&self, value: &Value) -> bool {
        match self {
            ValidatorHandle::Compiled { validator, .. } => validator(value),
            ValidatorHandle::Generic { engine, schema } => engine.validate(schema, value),
            ValidatorHandle::Degraded { .. } => false,
        }
    }

    /// Explains a rejection. Call only after `check` returned false.
    pub fn explain(&self, value: &Value) -> Explanation {
        match self {
            ValidatorHandle::Compiled { engine, schema, .. }
            | ValidatorHandle::Generic { engine, schema } => engine
                .explain(schema, value)
                .unwrap_or_else(|| Explanation::new("$root", "a valid value", value.to_string())),
            ValidatorHandle::Degraded { detail } => Explanation::compile_failure(detail.clone()),
        }
    }
}

impl fmt::Debug for ValidatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorHandle::Compiled { schema, .. } => {
                write!(f, "ValidatorHandle::Compiled({})", schema)
            }
            ValidatorHandle::Generic { schema, .. } => {
                write!(f, "ValidatorHandle::Generic({})", schema)
            }
            ValidatorHandle::Degraded { detail } => {
                write!(f, "ValidatorHandle::Degraded({})", detail)
            }
        }
    }
}
