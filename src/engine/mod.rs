//! Schema engine capability
//!
//! `SchemaEngine` is the abstract validation capability the guard pipeline
//! consumes: validate, explain, compile, coerce, decode, transformer
//! construction, strip variants, and native instrumentation. Any concrete
//! validation library can be substituted behind it; `JsonEngine` is the
//! default implementation over a JSON-encoded schema language.

pub mod coerce;
pub mod errors;
pub mod json;
pub mod schema;
pub mod validate;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::guard::Callable;

pub use errors::{json_type_name, EngineError, EngineResult, Explanation};
pub use json::JsonEngine;
pub use schema::SchemaExpr;

/// A validator predicate compiled once and bound in a closure.
pub type CompiledValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// An engine-built opaque decode function.
#[derive(Clone)]
pub struct Transformer(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Transformer {
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Applies the transformer to a value.
    pub fn apply(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transformer(<fn>)")
    }
}

/// The schema engine capability consumed by the guard pipeline.
///
/// Schemas are raw values in the engine's own language; the engine decides
/// how to interpret them. All operations are synchronous and must be safe to
/// call from concurrent threads.
pub trait SchemaEngine: Send + Sync {
    /// Returns whether `value` satisfies `schema`. An uninterpretable schema
    /// accepts nothing.
    fn validate(&self, schema: &Value, value: &Value) -> bool;

    /// Explains why `value` fails `schema`; `None` means the value is valid.
    fn explain(&self, schema: &Value, value: &Value) -> Option<Explanation>;

    /// Compiles a standalone validator predicate once. Callers hold the
    /// result for the lifetime of the wrapped function.
    fn compile(&self, schema: &Value) -> EngineResult<CompiledValidator>;

    /// Best-effort coercion of `value` toward `schema`.
    fn coerce(&self, schema: &Value, value: &Value) -> EngineResult<Value>;

    /// Decodes `value`: through `transformer` when given, otherwise through
    /// the schema's own decode semantics (strip variants drop undeclared
    /// keys). Decoding never fails; an uninterpretable schema passes the
    /// value through.
    fn decode(&self, schema: &Value, transformer: Option<&Transformer>, value: &Value) -> Value;

    /// Builds a transformer from its spec.
    fn build_transformer(&self, spec: &Value) -> EngineResult<Transformer>;

    /// Returns a variant of `schema` whose decode removes unknown keys.
    fn strip_unknown_keys(&self, schema: &Value) -> Value;

    /// The engine's native instrumentation: wraps `inner` with an additive
    /// layer of checking against `schema`. May report a violation the guard
    /// pipeline also reports; that duplication is expected.
    fn instrument(&self, name: &str, inner: Callable, schema: &Value) -> Callable;
}
