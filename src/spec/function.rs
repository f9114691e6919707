//! Function specification
//!
//! `FunctionSpec` is the immutable definition-time capture: name, optional
//! docstring, optional positional schema, name-metadata, an attribute map,
//! the parameter list, and the body. Built once with the builder methods and
//! never mutated afterwards.
//!
//! Metadata and attribute entries share one value type, `AttrValue`, so the
//! per-key precedence rules apply uniformly to data options and hooks.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::engine::json_type_name;
use crate::guard::{AfterFn, BeforeFn, BodyFn, ErrorFn, OnErrorFn};

use super::errors::{SpecError, SpecResult};

/// One metadata or attribute entry: plain data or a hook.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain JSON data (schemas, booleans, transform specs)
    Data(Value),
    /// Hook run with the raw args before validation
    Before(BeforeFn),
    /// Hook run with the result after execution
    After(AfterFn),
    /// Recovery hook for routed failures
    OnError(OnErrorFn),
    /// Error presenter for routed failures
    ErrorFn(ErrorFn),
}

impl AttrValue {
    /// Returns the data value, if this entry is data.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            AttrValue::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a type name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::Data(v) => json_type_name(v),
            AttrValue::Before(_) => "before hook",
            AttrValue::After(_) => "after hook",
            AttrValue::OnError(_) => "on_error hook",
            AttrValue::ErrorFn(_) => "error_fn hook",
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Data(v) => write!(f, "Data({})", v),
            other => write!(f, "{}(<fn>)", other.kind_name()),
        }
    }
}

/// An ordered metadata or attribute map.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Immutable description of a function to be guarded, captured once at
/// definition time.
#[derive(Clone)]
pub struct FunctionSpec {
    name: String,
    doc: Option<String>,
    schema: Option<Value>,
    metadata: Attrs,
    attrs: Attrs,
    params: Vec<String>,
    body: BodyFn,
}

impl FunctionSpec {
    /// Create a spec from the two mandatory pieces: a name and a body.
    pub fn new(name: impl Into<String>, body: BodyFn) -> Self {
        Self {
            name: name.into(),
            doc: None,
            schema: None,
            metadata: Attrs::new(),
            attrs: Attrs::new(),
            params: Vec::new(),
            body,
        }
    }

    /// Attach a docstring.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Attach the positional schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Declare the parameter list.
    pub fn with_params(mut self, params: Vec<impl Into<String>>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Merge a JSON object of data entries into the name-metadata map.
    ///
    /// Fails fast when the value is not an object.
    pub fn with_metadata(mut self, map: Value) -> SpecResult<Self> {
        merge_data_entries(&mut self.metadata, map, &self.name, "metadata")?;
        Ok(self)
    }

    /// Merge a JSON object of data entries into the attribute map.
    pub fn with_attrs(mut self, map: Value) -> SpecResult<Self> {
        merge_data_entries(&mut self.attrs, map, &self.name, "attrs")?;
        Ok(self)
    }

    /// Insert one entry into the name-metadata map.
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Insert one entry into the attribute map.
    pub fn with_attr_entry(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Attach a before hook (attribute-map entry `before_fn`).
    pub fn with_before(self, hook: BeforeFn) -> Self {
        self.with_attr_entry("before_fn", AttrValue::Before(hook))
    }

    /// Attach an after hook (attribute-map entry `after_fn`).
    pub fn with_after(self, hook: AfterFn) -> Self {
        self.with_attr_entry("after_fn", AttrValue::After(hook))
    }

    /// Attach a recovery hook (attribute-map entry `on_error`).
    pub fn with_on_error(self, hook: OnErrorFn) -> Self {
        self.with_attr_entry("on_error", AttrValue::OnError(hook))
    }

    /// Attach an error presenter (attribute-map entry `error_fn`).
    pub fn with_error_fn(self, hook: ErrorFn) -> Self {
        self.with_attr_entry("error_fn", AttrValue::ErrorFn(hook))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    pub fn metadata(&self) -> &Attrs {
        &self.metadata
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &BodyFn {
        &self.body
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("schema", &self.schema)
            .field("metadata", &self.metadata)
            .field("attrs", &self.attrs)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn merge_data_entries(
    target: &mut Attrs,
    map: Value,
    function: &str,
    source_name: &'static str,
) -> SpecResult<()> {
    match map {
        Value::Object(entries) => {
            for (key, value) in entries {
                target.insert(key, AttrValue::Data(value));
            }
            Ok(())
        }
        other => Err(SpecError::MalformedAttrs {
            function: function.to_string(),
            source_name,
            got: json_type_name(&other),
        }),
    }
}
