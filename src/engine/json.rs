//! Default schema engine over the JSON-encoded schema language
//!
//! Cost model: `compile` parses the schema once and the compiled closure
//! walks the parsed form; the generic `validate`/`explain` path re-parses
//! the raw schema value on every call. Both paths agree on accept/reject,
//! including for unparseable schemas, which accept nothing.

use std::sync::Arc;

use serde_json::Value;

use crate::guard::Callable;
use crate::state;
use crate::trace;

use super::coerce;
use super::errors::{EngineResult, Explanation};
use super::schema::SchemaExpr;
use super::validate;
use super::{CompiledValidator, SchemaEngine, Transformer};

/// The default engine. Stateless; cheap to clone and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEngine;

impl JsonEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaEngine for JsonEngine {
    fn validate(&self, schema: &Value, value: &Value) -> bool {
        match SchemaExpr::parse(schema) {
            Ok(parsed) => validate::check(&parsed, value),
            Err(_) => false,
        }
    }

    fn explain(&self, schema: &Value, value: &Value) -> Option<Explanation> {
        match SchemaExpr::parse(schema) {
            Ok(parsed) => validate::explain(&parsed, value),
            Err(e) => Some(Explanation::parse_failure(e.to_string())),
        }
    }

    fn compile(&self, schema: &Value) -> EngineResult<CompiledValidator> {
        let parsed = SchemaExpr::parse(schema)?;
        Ok(Arc::new(move |value: &Value| {
            validate::check(&parsed, value)
        }))
    }

    fn coerce(&self, schema: &Value, value: &Value) -> EngineResult<Value> {
        let parsed = SchemaExpr::parse(schema)?;
        coerce::coerce(&parsed, value)
    }

    fn decode(&self, schema: &Value, transformer: Option<&Transformer>, value: &Value) -> Value {
        if let Some(transformer) = transformer {
            return transformer.apply(value);
        }
        match SchemaExpr::parse(schema) {
            Ok(parsed) => coerce::decode(&parsed, value),
            Err(_) => value.clone(),
        }
    }

    fn build_transformer(&self, spec: &Value) -> EngineResult<Transformer> {
        coerce::build_transformer(spec)
    }

    fn strip_unknown_keys(&self, schema: &Value) -> Value {
        coerce::strip_unknown_keys(schema)
    }

    fn instrument(&self, name: &str, inner: Callable, schema: &Value) -> Callable {
        let engine = *self;
        let schema = schema.clone();
        let name = name.to_string();
        Arc::new(move |args: &[Value]| {
            if state::tracing_enabled() {
                if let Some(explanation) = engine.explain(&schema, &Value::Array(args.to_vec())) {
                    trace::instrument_violation(&name, &explanation);
                }
            }
            inner(args)
        })
    }
}
