//! The definition combinator
//!
//! `define` turns a `FunctionSpec` into a `Guarded` callable:
//! 1. resolve the effective configuration (fails fast on malformed input)
//! 2. build the transformer, when configured
//! 3. bind one validator handle per schema member
//! 4. assemble the pipeline, wrap it with the stage composition, and, when
//!    requested, with the engine's native instrumentation as the outermost
//!    layer

use std::sync::Arc;

use serde_json::Value;

use crate::engine::{JsonEngine, SchemaEngine};
use crate::spec::{resolve, FunctionSpec, SpecError, SpecResult, ValidationConfig};

use super::cache::ValidatorHandle;
use super::pipeline::GuardedFn;
use super::router::ErrorRouter;
use super::{Callable, GuardResult};

/// The externally visible guarded function.
pub struct Guarded {
    inner: Arc<GuardedFn>,
    entry: Callable,
}

impl Guarded {
    /// Invokes the guarded function.
    pub fn call(&self, args: &[Value]) -> GuardResult<Value> {
        (self.entry)(args)
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn doc(&self) -> Option<&str> {
        self.inner.doc()
    }

    pub fn params(&self) -> &[String] {
        self.inner.params()
    }

    pub fn config(&self) -> &ValidationConfig {
        self.inner.config()
    }

    /// Returns the assembled entry point as a shared callable.
    pub fn as_callable(&self) -> Callable {
        Arc::clone(&self.entry)
    }
}

impl std::fmt::Debug for Guarded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guarded")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Defines a guarded function with the default JSON engine.
pub fn define(spec: FunctionSpec) -> SpecResult<Guarded> {
    define_with_engine(spec, Arc::new(JsonEngine::new()))
}

/// Defines a guarded function against an explicit schema engine.
pub fn define_with_engine(spec: FunctionSpec, engine: Arc<dyn SchemaEngine>) -> SpecResult<Guarded> {
    let config = Arc::new(resolve(&spec)?);

    let transformer = config
        .transform
        .as_ref()
        .map(|raw| {
            engine
                .build_transformer(raw)
                .map_err(|e| SpecError::MalformedTransform {
                    function: spec.name().to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()?;

    let (args_handle, ret_handle) = match &config.schema {
        Some(schema) => {
            let args = ValidatorHandle::bind(Arc::clone(&engine), schema.args.clone(), config.cache);
            let ret = schema
                .ret
                .as_ref()
                .map(|ret| ValidatorHandle::bind(Arc::clone(&engine), ret.clone(), config.cache));
            (Some(args), ret)
        }
        None => (None, None),
    };

    let router = ErrorRouter::new(spec.name(), config.on_error.clone(), config.error_fn.clone());
    let inner = Arc::new(GuardedFn::new(
        spec.name(),
        spec.doc().map(str::to_string),
        spec.params().to_vec(),
        Arc::clone(&config),
        spec.body().clone(),
        args_handle,
        ret_handle,
        router,
    ));

    let mut entry = inner.as_callable();
    entry = super::stage::compose(entry, &config, Arc::clone(&engine), transformer);

    // The instrumentation overlay is additive and outermost; it may report
    // a violation the pipeline reports again.
    if config.instrument {
        if let Some(schema) = &config.schema {
            entry = engine.instrument(spec.name(), entry, &schema.args);
        }
    }

    Ok(Guarded { inner, entry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::BodyFn;
    use serde_json::json;

    fn sum_body() -> BodyFn {
        Arc::new(|args: &[Value]| {
            let total: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!(total))
        })
    }

    #[test]
    fn test_define_exposes_spec_fields() {
        let guarded = define(
            FunctionSpec::new("add", sum_body())
                .with_doc("adds")
                .with_params(vec!["a", "b"]),
        )
        .unwrap();
        assert_eq!(guarded.name(), "add");
        assert_eq!(guarded.doc(), Some("adds"));
        assert_eq!(guarded.params(), ["a", "b"]);
    }

    #[test]
    fn test_no_schema_means_no_validation() {
        let guarded = define(FunctionSpec::new("add", sum_body())).unwrap();
        assert_eq!(guarded.call(&[json!("anything")]).unwrap(), json!(0));
    }

    #[test]
    fn test_definition_fails_fast_on_malformed_transform() {
        let spec = FunctionSpec::new("add", sum_body())
            .with_metadata(json!({"transform": {"unknown_op": 1}}))
            .unwrap();
        assert!(matches!(
            define(spec),
            Err(SpecError::MalformedTransform { .. })
        ));
    }

    #[test]
    fn test_guarded_call_round_trip() {
        let guarded = define(
            FunctionSpec::new("add", sum_body())
                .with_schema(json!({"args": ["tuple", "int", "int"], "ret": "pos_int"})),
        )
        .unwrap();
        assert_eq!(guarded.call(&[json!(2), json!(3)]).unwrap(), json!(5));
    }
}
