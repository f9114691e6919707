//! Error routing
//!
//! Every call-time failure funnels through one router that decides
//! raise-vs-recover:
//! - `on_error` configured: its return value becomes the call's result; its
//!   failure propagates to the caller
//! - otherwise the error presenter receives the constructed error; the
//!   default presenter raises it, a custom one may return a recovery value
//!   under the same contract

use serde_json::Value;

use crate::engine::Explanation;

use super::errors::{FailureKind, GuardError, GuardResult};
use super::{ErrorFn, OnErrorFn};

/// Routes validation and execution failures for one guarded function.
#[derive(Clone)]
pub struct ErrorRouter {
    function: String,
    on_error: Option<OnErrorFn>,
    error_fn: Option<ErrorFn>,
}

impl ErrorRouter {
    pub fn new(
        function: impl Into<String>,
        on_error: Option<OnErrorFn>,
        error_fn: Option<ErrorFn>,
    ) -> Self {
        Self {
            function: function.into(),
            on_error,
            error_fn,
        }
    }

    /// Turns a failure into either a raised error or a recovered value.
    pub fn route(
        &self,
        kind: FailureKind,
        explanation: Explanation,
        offending: Value,
    ) -> GuardResult<Value> {
        if let Some(on_error) = &self.on_error {
            return on_error(kind, &explanation, &offending);
        }
        let error = GuardError::new(kind, &self.function, explanation, offending);
        match &self.error_fn {
            Some(error_fn) => error_fn(error),
            None => Err(error),
        }
    }
}

impl std::fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorRouter")
            .field("function", &self.function)
            .field("on_error", &self.on_error.is_some())
            .field("error_fn", &self.error_fn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn explanation() -> Explanation {
        Explanation::mismatch("$root[0]", "int", &json!("x"))
    }

    #[test]
    fn test_default_route_raises_structured_error() {
        let router = ErrorRouter::new("add", None, None);
        let err = router
            .route(FailureKind::Args, explanation(), json!(["x"]))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Args);
        assert_eq!(err.function(), "add");
        assert_eq!(err.offending(), &json!(["x"]));
    }

    #[test]
    fn test_on_error_return_value_is_the_result() {
        let on_error: OnErrorFn = Arc::new(|kind, _explanation, _offending| {
            assert_eq!(kind, FailureKind::Ret);
            Ok(json!("recovered"))
        });
        let router = ErrorRouter::new("add", Some(on_error), None);
        let result = router.route(FailureKind::Ret, explanation(), json!(-1));
        assert_eq!(result.unwrap(), json!("recovered"));
    }

    #[test]
    fn test_on_error_failure_propagates() {
        let on_error: OnErrorFn = Arc::new(|kind, explanation, offending| {
            Err(GuardError::new(
                kind,
                "add",
                explanation.clone(),
                offending.clone(),
            ))
        });
        let router = ErrorRouter::new("add", Some(on_error), None);
        assert!(router
            .route(FailureKind::Args, explanation(), json!([]))
            .is_err());
    }

    #[test]
    fn test_custom_error_fn_may_recover() {
        let error_fn: ErrorFn = Arc::new(|error| {
            assert_eq!(error.code(), "GUARD_EXEC_FAILED");
            Ok(json!(0))
        });
        let router = ErrorRouter::new("add", None, Some(error_fn));
        let result = router.route(FailureKind::Execution, explanation(), json!([]));
        assert_eq!(result.unwrap(), json!(0));
    }

    #[test]
    fn test_on_error_takes_precedence_over_error_fn() {
        let on_error: OnErrorFn = Arc::new(|_, _, _| Ok(json!("on_error")));
        let error_fn: ErrorFn = Arc::new(|_| Ok(json!("error_fn")));
        let router = ErrorRouter::new("add", Some(on_error), Some(error_fn));
        let result = router.route(FailureKind::Args, explanation(), json!([]));
        assert_eq!(result.unwrap(), json!("on_error"));
    }
}
