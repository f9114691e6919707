//! Call-time error types
//!
//! Error codes:
//! - GUARD_ARGS_INVALID (arguments rejected before execution)
//! - GUARD_RET_INVALID (result rejected after execution)
//! - GUARD_EXEC_FAILED (the underlying body raised)
//!
//! All three are routed through the error router, which decides
//! raise-vs-recover. Definition-time failures are `SpecError` and are never
//! routed.

use std::fmt;

use serde_json::Value;

use crate::engine::Explanation;

/// Which pipeline stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Argument validation failed; the body never ran
    Args,
    /// Return validation failed on the body's result
    Ret,
    /// The body itself raised
    Execution,
}

impl FailureKind {
    /// Returns the string error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::Args => "GUARD_ARGS_INVALID",
            FailureKind::Ret => "GUARD_RET_INVALID",
            FailureKind::Execution => "GUARD_EXEC_FAILED",
        }
    }

    /// Returns the stage name used in trace output.
    pub fn stage(&self) -> &'static str {
        match self {
            FailureKind::Args => "args",
            FailureKind::Ret => "ret",
            FailureKind::Execution => "execution",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Call-time error with full context: which stage failed, why, and the
/// offending value.
#[derive(Debug)]
pub struct GuardError {
    kind: FailureKind,
    function: String,
    message: String,
    explanation: Explanation,
    offending: Value,
}

impl GuardError {
    /// Create an error for a routed failure.
    pub fn new(
        kind: FailureKind,
        function: impl Into<String>,
        explanation: Explanation,
        offending: Value,
    ) -> Self {
        let function = function.into();
        let message = format!(
            "guarded call '{}' failed at {}: {}",
            function,
            kind.stage(),
            explanation.message()
        );
        Self {
            kind,
            function,
            message,
            explanation,
            offending,
        }
    }

    /// Create an execution error from the body's failure message.
    pub fn execution_failed(
        function: impl Into<String>,
        detail: impl Into<String>,
        args: &[Value],
    ) -> Self {
        Self::new(
            FailureKind::Execution,
            function,
            Explanation::execution(detail),
            Value::Array(args.to_vec()),
        )
    }

    /// Returns which stage failed.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the string error code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns the name of the guarded function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured explanation.
    pub fn explanation(&self) -> &Explanation {
        &self.explanation
    }

    /// Returns the offending value: the argument tuple for args/execution
    /// failures, the result for return failures.
    pub fn offending(&self) -> &Value {
        &self.offending
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for GuardError {}

/// Result type for guarded calls.
pub type GuardResult<T> = Result<T, GuardError>;
