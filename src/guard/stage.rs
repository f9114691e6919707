//! Coercion, key-stripping, and transform stages
//!
//! Wraps the pipeline callable so that, on the way in, the argument tuple
//! meets coercion first, then key-stripping, then the custom transform, and
//! only then the pipeline's own hooks and checks. On the way out, return
//! coercion applies to the already-validated result before the caller sees
//! it. All three stages compose; none excludes another.
//!
//! A failed coercion falls back to the uncoerced value, so the ordinary
//! validation failure reports it through the error router.

use std::sync::Arc;

use serde_json::Value;

use crate::engine::{SchemaEngine, Transformer};
use crate::spec::ValidationConfig;

use super::Callable;

/// Applies the configured stages around the pipeline callable.
pub fn compose(
    inner: Callable,
    config: &ValidationConfig,
    engine: Arc<dyn SchemaEngine>,
    transformer: Option<Transformer>,
) -> Callable {
    let mut callable = inner;

    // Built inside-out: the last wrapper installed sees the args first.
    if let Some(transformer) = transformer {
        callable = transform_stage(callable, Arc::clone(&engine), transformer, config);
    }
    if config.strip_extra_keys {
        if let Some(schema) = &config.schema {
            callable = strip_stage(callable, Arc::clone(&engine), &schema.args);
        }
    }
    if config.coerce_args || config.coerce_ret {
        if let Some(schema) = &config.schema {
            callable = coerce_stage(
                callable,
                engine,
                schema.clone(),
                config.coerce_args,
                config.coerce_ret,
            );
        }
    }

    callable
}

fn coerce_stage(
    inner: Callable,
    engine: Arc<dyn SchemaEngine>,
    schema: crate::spec::ResolvedSchema,
    coerce_args: bool,
    coerce_ret: bool,
) -> Callable {

    Arc::new(move |args: &[Value]| {
        let coerced: Vec<Value> = if coerce_args {
            match engine.coerce(&schema.args, &Value::Array(args.to_vec())) {
                Ok(Value::Array(items)) => items,
                // Fall back to the raw args; validation reports the failure.
                _ => args.to_vec(),
            }
        } else {
            args.to_vec()
        };

        let result = inner(&coerced)?;

        if coerce_ret {
            if let Some(ret_schema) = &schema.ret {
                return Ok(engine.coerce(ret_schema, &result).unwrap_or(result));
            }
        }
        Ok(result)
    })
}

fn strip_stage(inner: Callable, engine: Arc<dyn SchemaEngine>, args_schema: &Value) -> Callable {
    // The strip variant is derived once at wrap time.
    let strip_schema = engine.strip_unknown_keys(args_schema);

    Arc::new(move |args: &[Value]| {
        let decoded = engine.decode(&strip_schema, None, &Value::Array(args.to_vec()));
        match decoded {
            Value::Array(items) => inner(&items),
            _ => inner(args),
        }
    })
}

fn transform_stage(
    inner: Callable,
    engine: Arc<dyn SchemaEngine>,
    transformer: Transformer,
    config: &ValidationConfig,
) -> Callable {
    let schema = config
        .schema
        .as_ref()
        .map(|s| s.args.clone())
        .unwrap_or(Value::Null);

    Arc::new(move |args: &[Value]| {
        let decoded: Vec<Value> = args
            .iter()
            .map(|arg| engine.decode(&schema, Some(&transformer), arg))
            .collect();
        inner(&decoded)
    })
}
