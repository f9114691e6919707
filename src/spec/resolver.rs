//! Configuration resolution
//!
//! Merges schema and option values found in up to three sources into one
//! effective `ValidationConfig`:
//! - options are read from name-metadata and the attribute map; the
//!   attribute map wins per key (shallow right-biased merge)
//! - schema sources in acceptance order: positional, then the primary alias
//!   `schema`, then the secondary alias `spec`
//! - with `combine_schemas` (the default) the first non-empty source wins;
//!   the aliases are never merged field-by-field
//! - without it the secondary alias is consulted only when the primary key
//!   is entirely absent
//!
//! A malformed map, option, or schema shape fails here, at definition time.

use serde_json::Value;

use crate::guard::{AfterFn, BeforeFn, ErrorFn, OnErrorFn};

use super::errors::{SpecError, SpecResult};
use super::function::{AttrValue, Attrs, FunctionSpec};
use super::normalize::{normalize, ResolvedSchema};

/// Primary metadata alias for the schema.
pub const PRIMARY_SCHEMA_ALIAS: &str = "schema";

/// Secondary metadata alias for the schema.
pub const SECONDARY_SCHEMA_ALIAS: &str = "spec";

/// Resolved, immutable per-function configuration. Built once at definition
/// time and shared read-only for the lifetime of the guarded callable.
#[derive(Clone)]
pub struct ValidationConfig {
    /// Effective schema, when any source resolved non-empty
    pub schema: Option<ResolvedSchema>,
    pub combine_schemas: bool,
    /// Declared but inert: no ambient-state introspection is performed
    pub validate_dynamic: bool,
    pub instrument: bool,
    pub debug: bool,
    pub coerce_args: bool,
    pub coerce_ret: bool,
    pub cache: bool,
    pub strip_extra_keys: bool,
    /// Raw transformer spec; built into a transformer at wrap time
    pub transform: Option<Value>,
    pub before_fn: Option<BeforeFn>,
    pub after_fn: Option<AfterFn>,
    pub on_error: Option<OnErrorFn>,
    pub error_fn: Option<ErrorFn>,
}

impl std::fmt::Debug for ValidationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationConfig")
            .field("schema", &self.schema)
            .field("combine_schemas", &self.combine_schemas)
            .field("validate_dynamic", &self.validate_dynamic)
            .field("instrument", &self.instrument)
            .field("debug", &self.debug)
            .field("coerce_args", &self.coerce_args)
            .field("coerce_ret", &self.coerce_ret)
            .field("cache", &self.cache)
            .field("strip_extra_keys", &self.strip_extra_keys)
            .field("transform", &self.transform)
            .field("before_fn", &self.before_fn.is_some())
            .field("after_fn", &self.after_fn.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("error_fn", &self.error_fn.is_some())
            .finish()
    }
}

/// Produces the effective configuration for a function spec.
pub fn resolve(spec: &FunctionSpec) -> SpecResult<ValidationConfig> {
    // Shallow right-biased merge: attribute-map entries win per key.
    let mut merged: Attrs = spec.metadata().clone();
    for (key, value) in spec.attrs() {
        merged.insert(key.clone(), value.clone());
    }

    let combine_schemas = read_bool(spec.name(), &merged, "combine_schemas", true)?;
    let raw_schema = select_schema(spec, &merged, combine_schemas)?;
    let schema = raw_schema
        .map(|raw| normalize(spec.name(), &raw))
        .transpose()?;

    Ok(ValidationConfig {
        schema,
        combine_schemas,
        validate_dynamic: read_bool(spec.name(), &merged, "validate_dynamic", false)?,
        instrument: read_bool(spec.name(), &merged, "instrument", false)?,
        debug: read_bool(spec.name(), &merged, "debug", false)?,
        coerce_args: read_bool(spec.name(), &merged, "coerce_args", false)?,
        coerce_ret: read_bool(spec.name(), &merged, "coerce_ret", false)?,
        cache: read_bool(spec.name(), &merged, "cache", false)?,
        strip_extra_keys: read_bool(spec.name(), &merged, "strip_extra_keys", false)?,
        transform: read_data(spec.name(), &merged, "transform")?,
        before_fn: read_before(spec.name(), &merged)?,
        after_fn: read_after(spec.name(), &merged)?,
        on_error: read_on_error(spec.name(), &merged)?,
        error_fn: read_error_fn(spec.name(), &merged)?,
    })
}

/// Schema selection across the three sources.
fn select_schema(
    spec: &FunctionSpec,
    merged: &Attrs,
    combine: bool,
) -> SpecResult<Option<Value>> {
    if let Some(positional) = spec.schema() {
        if !combine {
            // The combine flag governs the aliased slots; an explicit
            // positional schema is always the effective schema.
            return Ok(Some(positional.clone()));
        }
        if !is_empty_schema(positional) {
            return Ok(Some(positional.clone()));
        }
    }

    let primary = read_data(spec.name(), merged, PRIMARY_SCHEMA_ALIAS)?;
    let secondary = read_data(spec.name(), merged, SECONDARY_SCHEMA_ALIAS)?;

    if combine {
        for candidate in [primary, secondary].into_iter().flatten() {
            if !is_empty_schema(&candidate) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    } else {
        match primary {
            // A present-but-empty primary blocks the secondary and resolves
            // to "no schema".
            Some(value) => Ok((!is_empty_schema(&value)).then_some(value)),
            None => Ok(secondary.filter(|value| !is_empty_schema(value))),
        }
    }
}

fn is_empty_schema(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.is_empty(),
        _ => false,
    }
}

fn read_bool(function: &str, merged: &Attrs, key: &str, default: bool) -> SpecResult<bool> {
    match merged.get(key) {
        None => Ok(default),
        Some(AttrValue::Data(Value::Bool(b))) => Ok(*b),
        Some(other) => Err(SpecError::MalformedOption {
            function: function.to_string(),
            key: key.to_string(),
            expected: "a boolean",
            got: other.kind_name(),
        }),
    }
}

fn read_data(function: &str, merged: &Attrs, key: &str) -> SpecResult<Option<Value>> {
    match merged.get(key) {
        None => Ok(None),
        Some(AttrValue::Data(value)) => Ok(Some(value.clone())),
        Some(other) => Err(SpecError::MalformedOption {
            function: function.to_string(),
            key: key.to_string(),
            expected: "a data value",
            got: other.kind_name(),
        }),
    }
}

fn read_before(function: &str, merged: &Attrs) -> SpecResult<Option<BeforeFn>> {
    match merged.get("before_fn") {
        None => Ok(None),
        Some(AttrValue::Before(hook)) => Ok(Some(hook.clone())),
        Some(other) => Err(malformed_hook(function, "before_fn", other)),
    }
}

fn read_after(function: &str, merged: &Attrs) -> SpecResult<Option<AfterFn>> {
    match merged.get("after_fn") {
        None => Ok(None),
        Some(AttrValue::After(hook)) => Ok(Some(hook.clone())),
        Some(other) => Err(malformed_hook(function, "after_fn", other)),
    }
}

fn read_on_error(function: &str, merged: &Attrs) -> SpecResult<Option<OnErrorFn>> {
    match merged.get("on_error") {
        None => Ok(None),
        Some(AttrValue::OnError(hook)) => Ok(Some(hook.clone())),
        Some(other) => Err(malformed_hook(function, "on_error", other)),
    }
}

fn read_error_fn(function: &str, merged: &Attrs) -> SpecResult<Option<ErrorFn>> {
    match merged.get("error_fn") {
        None => Ok(None),
        Some(AttrValue::ErrorFn(hook)) => Ok(Some(hook.clone())),
        Some(other) => Err(malformed_hook(function, "error_fn", other)),
    }
}

fn malformed_hook(function: &str, key: &str, got: &AttrValue) -> SpecError {
    SpecError::MalformedOption {
        function: function.to_string(),
        key: key.to_string(),
        expected: "a hook",
        got: got.kind_name(),
    }
}
