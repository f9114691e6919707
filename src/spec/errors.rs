//! Definition-time error types
//!
//! Everything here is detected while building the guarded callable, before
//! any call can occur. These errors are always raised to the definer and
//! never routed through the error router.

use thiserror::Error;

/// Definition-time failures.
#[derive(Debug, Error)]
pub enum SpecError {
    /// An attribute or metadata map is not a JSON object.
    #[error("{source_name} for '{function}' must be an object, got {got}")]
    MalformedAttrs {
        function: String,
        /// Which map was malformed ("attrs" or "metadata")
        source_name: &'static str,
        got: &'static str,
    },

    /// A recognized option key carries a value of the wrong type.
    #[error("option '{key}' for '{function}' must be {expected}, got {got}")]
    MalformedOption {
        function: String,
        key: String,
        expected: &'static str,
        got: &'static str,
    },

    /// A resolved schema value is structurally malformed.
    #[error("malformed schema for '{function}': {reason}")]
    MalformedSchema { function: String, reason: String },

    /// The transform spec could not be built into a transformer.
    #[error("malformed transform spec for '{function}': {reason}")]
    MalformedTransform { function: String, reason: String },
}

/// Result type for definition-time operations.
pub type SpecResult<T> = Result<T, SpecError>;
