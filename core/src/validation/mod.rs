//! # Validation
//!
//! Compiles each operation's parameters and request body into data-driven
//! validators, and runs them against incoming requests.

pub mod coercion;
pub mod compiler;
pub mod extract;

pub use coercion::BooleanForms;
pub use compiler::{CompiledValidator, FieldSpec, OperationValidators};
pub use extract::{decode_body, BODY_PREVIEW_CHARS};
