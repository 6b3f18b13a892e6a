#![deny(missing_docs)]

//! # Scaffold Core
//!
//! Compiles an OpenAPI contract into the runtime artifacts an HTTP service
//! needs per request: an operation index, per-operation parameter and body
//! validators, and per-operation authentication chains.
//!
//! ```no_run
//! use scaffold_core::{CallerContext, Contract, ContractConfig, RequestParts};
//! # use scaffold_core::{AppResult, Principal, PrincipalResolver, RequestView};
//! # struct Users;
//! # impl PrincipalResolver for Users {
//! #     type Identity = String;
//! #     fn resolve_login(&self, _: &dyn RequestView, u: &str, _: &str) -> AppResult<Principal<String>> {
//! #         Ok(Principal::new("user", u.to_string()))
//! #     }
//! #     fn resolve_token(&self, _: &dyn RequestView, t: &str) -> AppResult<Principal<String>> {
//! #         Ok(Principal::new("user", t.to_string()))
//! #     }
//! # }
//! # fn main() -> AppResult<()> {
//! let contract = Contract::from_file("api.yaml", ContractConfig::default())?;
//! let request = RequestParts::new("GET", "/widgets/{id}").with_path_param("id", "42");
//! let mut caller = CallerContext::new();
//! let prepared = contract.prepare(&request, &Users, &mut caller)?;
//! println!("{} {:?}", prepared.operation.id, prepared.params);
//! # Ok(())
//! # }
//! ```

/// Shared error types.
pub mod error;

/// Contract loading and validation settings.
pub mod config;

/// OpenAPI (OAS) contract loading, normalization and indexing.
pub mod oas;

/// Host request abstraction.
pub mod request;

/// Parameter and body validation.
pub mod validation;

/// Authentication mechanisms and principals.
pub mod auth;

/// Request-time control flow.
pub mod pipeline;

pub use auth::{CallerContext, Credentials, Mechanism, MechanismChain, Principal, PrincipalResolver};
pub use config::{ContractConfig, SecurityConfig, ValidationConfig};
pub use error::{AppError, AppResult, ErrorBody};
pub use oas::{
    Contract, Operation, OperationIndex, ParamLocation, Parameter, PrimitiveType,
    SecurityRequirement, SecurityScheme, Verb,
};
pub use pipeline::{error_response, PreparedRequest};
pub use request::{RequestParts, RequestView};
pub use validation::{CompiledValidator, OperationValidators};
