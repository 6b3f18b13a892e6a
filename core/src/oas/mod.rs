#![deny(missing_docs)]

//! # OpenAPI Contract Module
//!
//! - **pointer**: local JSON pointer parsing and traversal.
//! - **resolver**: `$ref` substitution over the raw document.
//! - **normalization**: parameter flattening, security defaulting, route keys.
//! - **models**: typed operations, parameters and security schemes.
//! - **index**: lookups by id, route, tag and path.
//! - **document**: the loaded [`Contract`].

pub mod document;
pub mod index;
pub mod models;
pub mod normalization;
pub(crate) mod pointer;
pub mod resolver;
pub(crate) mod shims;

pub use document::Contract;
pub use index::OperationIndex;
pub use models::{
    BodyField, Operation, ParamLocation, Parameter, PrimitiveType, SecurityRequirement,
    SecurityScheme, Verb,
};
pub use normalization::normalize;
pub use resolver::{contains_references, resolve_references};
