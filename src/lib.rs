//! fnguard - definition-time guards for ordinary functions
//!
//! Turns a function definition into a runtime-checked, instrumented,
//! error-routed callable. A declarative spec names the function, its schema,
//! and a set of cross-cutting policies (coercion, key-stripping, transforms,
//! validator caching, hooks, debug tracing, error recovery); `define`
//! resolves the effective configuration once and assembles the call-time
//! pipeline around the raw body.
//!
//! ```
//! use std::sync::Arc;
//! use fnguard::guard::{define, BodyFn};
//! use fnguard::spec::FunctionSpec;
//! use serde_json::{json, Value};
//!
//! let body: BodyFn = Arc::new(|args: &[Value]| {
//!     Ok(json!(args[0].as_i64().unwrap() + args[1].as_i64().unwrap()))
//! });
//! let add = define(
//!     FunctionSpec::new("add", body)
//!         .with_schema(json!({"args": ["tuple", "int", "int"], "ret": "pos_int"})),
//! )
//! .unwrap();
//!
//! assert_eq!(add.call(&[json!(2), json!(3)]).unwrap(), json!(5));
//! assert!(add.call(&[json!(2), json!("three")]).is_err());
//! ```

pub mod engine;
pub mod guard;
pub mod spec;
pub mod state;
pub mod trace;

pub use engine::{JsonEngine, SchemaEngine};
pub use guard::{define, define_with_engine, FailureKind, GuardError, GuardResult, Guarded};
pub use spec::{FunctionSpec, SpecError, ValidationConfig};
