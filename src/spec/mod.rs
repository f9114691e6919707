//! Definition-time machinery
//!
//! Captures a function spec, resolves the effective configuration from its
//! schema/option sources, and normalizes the chosen schema. Everything here
//! runs before the first call; failures raise immediately to the definer.

pub mod errors;
pub mod function;
pub mod normalize;
pub mod resolver;

pub use errors::{SpecError, SpecResult};
pub use function::{AttrValue, Attrs, FunctionSpec};
pub use normalize::{normalize, ResolvedSchema};
pub use resolver::{resolve, ValidationConfig, PRIMARY_SCHEMA_ALIAS, SECONDARY_SCHEMA_ALIAS};
