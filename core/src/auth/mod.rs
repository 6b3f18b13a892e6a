//! # Authentication
//!
//! Compiles each operation's security requirements into an ordered chain of
//! mechanisms and runs that chain against a request, binding the first
//! principal the host resolves.

pub mod chain;
pub mod mechanism;
pub mod principal;

pub use chain::MechanismChain;
pub use mechanism::{Credentials, KeyLocation, Mechanism};
pub use principal::{CallerContext, Principal, PrincipalResolver, ANONYMOUS_KIND};
