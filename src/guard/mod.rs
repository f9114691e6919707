//! Call-time guard machinery
//!
//! The shared callable and hook signatures, plus the per-call pipeline, the
//! validator cache, the coercion/strip/transform stage composition, the
//! error router, and the `define` factory that assembles them.

pub mod cache;
pub mod define;
pub mod errors;
pub mod pipeline;
pub mod router;
pub mod stage;

use std::sync::Arc;

use serde_json::Value;

use crate::engine::Explanation;

pub use cache::ValidatorHandle;
pub use define::{define, define_with_engine, Guarded};
pub use errors::{FailureKind, GuardError, GuardResult};
pub use pipeline::{CallContext, GuardedFn};
pub use router::ErrorRouter;

/// A failure raised by a function body or a hook.
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// The underlying function body: args in, value or failure out.
pub type BodyFn = Arc<dyn Fn(&[Value]) -> Result<Value, BodyError> + Send + Sync>;

/// A fully assembled guarded callable.
pub type Callable = Arc<dyn Fn(&[Value]) -> GuardResult<Value> + Send + Sync>;

/// Hook invoked with the raw argument tuple before validation. Failures are
/// isolated: they never abort the call.
pub type BeforeFn = Arc<dyn Fn(&[Value]) -> Result<(), BodyError> + Send + Sync>;

/// Hook invoked with the result after successful execution. Same isolation
/// contract as `BeforeFn`.
pub type AfterFn = Arc<dyn Fn(&Value) -> Result<(), BodyError> + Send + Sync>;

/// Recovery hook: its `Ok` value becomes the call's result; its `Err`
/// propagates to the caller.
pub type OnErrorFn =
    Arc<dyn Fn(FailureKind, &Explanation, &Value) -> GuardResult<Value> + Send + Sync>;

/// Error presenter: receives the constructed error and either raises it
/// onward or returns a recovery value.
pub type ErrorFn = Arc<dyn Fn(GuardError) -> GuardResult<Value> + Send + Sync>;
