//! The call-time state machine
//!
//! Every invocation of a guarded function flows through `GuardedFn::call`,
//! in strict order with no branching back:
//!
//! gate -> before hook -> args check -> execute -> after hook -> ret check
//!
//! Two failure exits, args-invalid and exec-failed/ret-invalid, both route
//! through the error router. When the validation gate is closed the raw body
//! runs directly: no hooks, no tracing, no checks, no routing.
//!
//! Hook failures are isolated: caught, never routed, never re-raised. They
//! are traced when tracing is active and otherwise lost.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::engine::Explanation;
use crate::spec::ValidationConfig;
use crate::state;
use crate::trace;

use super::cache::ValidatorHandle;
use super::errors::{FailureKind, GuardError, GuardResult};
use super::router::ErrorRouter;
use super::BodyFn;

/// Transient per-invocation state. Discarded when the call returns.
#[derive(Debug)]
pub struct CallContext {
    /// Correlation id included in trace output
    pub call_id: Uuid,
    /// The raw argument tuple
    pub args: Vec<Value>,
}

impl CallContext {
    fn new(args: &[Value]) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            args: args.to_vec(),
        }
    }

    /// The argument tuple viewed as one value for validation.
    fn args_value(&self) -> Value {
        Value::Array(self.args.clone())
    }
}

/// The wrapped callable: closes over the resolved configuration, the bound
/// validator handles, the error router, and the raw body. Immutable and
/// safe to share across threads.
pub struct GuardedFn {
    name: String,
    doc: Option<String>,
    params: Vec<String>,
    config: Arc<ValidationConfig>,
    body: BodyFn,
    args_handle: Option<ValidatorHandle>,
    ret_handle: Option<ValidatorHandle>,
    router: ErrorRouter,
}

impl GuardedFn {
    pub(crate) fn new(
        name: impl Into<String>,
        doc: Option<String>,
        params: Vec<String>,
        config: Arc<ValidationConfig>,
        body: BodyFn,
        args_handle: Option<ValidatorHandle>,
        ret_handle: Option<ValidatorHandle>,
        router: ErrorRouter,
    ) -> Self {
        Self {
            name: name.into(),
            doc,
            params,
            config,
            body,
            args_handle,
            ret_handle,
            router,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Runs one call through the pipeline.
    pub fn call(&self, args: &[Value]) -> GuardResult<Value> {
        // Validation gate: closed means the raw body runs directly. A body
        // failure still surfaces as an execution error, but without hooks,
        // tracing, or routing.
        if !state::validation_enabled() {
            return (self.body)(args)
                .map_err(|e| GuardError::execution_failed(&self.name, e.to_string(), args));
        }

        // A per-function debug flag forces the scoped trace toggle on for
        // the duration of this call, nested guarded calls included.
        let _debug_scope = self.config.debug.then(|| state::scoped_tracing(true));
        let tracing = state::tracing_enabled();

        let ctx = CallContext::new(args);
        if tracing {
            trace::call_entry(&self.name, ctx.call_id, &ctx.args);
        }

        if let Some(before) = &self.config.before_fn {
            if let Err(e) = before(&ctx.args) {
                if tracing {
                    trace::hook_failure(&self.name, ctx.call_id, "before", &e.to_string());
                }
            }
        }

        if let Some(handle) = &self.args_handle {
            let unit = ctx.args_value();
            if !handle.check(&unit) {
                let explanation = handle.explain(&unit);
                return self.fail(&ctx, tracing, FailureKind::Args, explanation, unit);
            }
        }

        let result = match (self.body)(&ctx.args) {
            Ok(value) => value,
            Err(e) => {
                let explanation = Explanation::execution(e.to_string());
                return self.fail(
                    &ctx,
                    tracing,
                    FailureKind::Execution,
                    explanation,
                    ctx.args_value(),
                );
            }
        };

        if let Some(after) = &self.config.after_fn {
            if let Err(e) = after(&result) {
                if tracing {
                    trace::hook_failure(&self.name, ctx.call_id, "after", &e.to_string());
                }
            }
        }

        if let Some(handle) = &self.ret_handle {
            if !handle.check(&result) {
                let explanation = handle.explain(&result);
                return self.fail(&ctx, tracing, FailureKind::Ret, explanation, result);
            }
        }

        if tracing {
            trace::call_exit(&self.name, ctx.call_id, &result);
        }
        Ok(result)
    }

    /// Traces a failure exit and routes it. A routed recovery value becomes
    /// the call's result and is not return-checked.
    fn fail(
        &self,
        ctx: &CallContext,
        tracing: bool,
        kind: FailureKind,
        explanation: Explanation,
        offending: Value,
    ) -> GuardResult<Value> {
        if tracing {
            trace::call_failure(&self.name, ctx.call_id, kind.stage(), explanation.message());
        }
        self.router.route(kind, explanation, offending)
    }

    /// Wraps this pipeline as a shared callable for the outer stages.
    pub fn as_callable(self: &Arc<Self>) -> super::Callable {
        let inner = Arc::clone(self);
        Arc::new(move |args: &[Value]| inner.call(args))
    }
}

impl std::fmt::Debug for GuardedFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedFn")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("config", &self.config)
            .field("args_handle", &self.args_handle)
            .field("ret_handle", &self.ret_handle)
            .finish_non_exhaustive()
    }
}
