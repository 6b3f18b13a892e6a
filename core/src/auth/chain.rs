//! Ordered-fallback execution of an operation's mechanisms.

use crate::auth::mechanism::{Credentials, Mechanism};
use crate::auth::principal::{CallerContext, PrincipalResolver};
use crate::error::{AppError, AppResult};
use crate::oas::models::{Operation, SecurityScheme};
use crate::request::RequestView;
use indexmap::IndexMap;
use tracing::{debug, error};

/// Failure remembered while later mechanisms are still being tried.
///
/// Ordered so that `max` picks the one to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Pending {
    Missing,
    Malformed,
}

impl From<Pending> for AppError {
    fn from(pending: Pending) -> Self {
        match pending {
            Pending::Missing => AppError::MissingAuthentication,
            Pending::Malformed => AppError::MalformedAuthentication,
        }
    }
}

/// The compiled mechanisms of one operation, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismChain {
    operation_id: String,
    mechanisms: Vec<Mechanism>,
}

impl MechanismChain {
    /// Wraps an explicit mechanism list.
    pub fn new(operation_id: impl Into<String>, mechanisms: Vec<Mechanism>) -> Self {
        Self {
            operation_id: operation_id.into(),
            mechanisms,
        }
    }

    /// Compiles every security requirement of `operation`.
    pub fn compile(
        operation: &Operation,
        schemes: &IndexMap<String, SecurityScheme>,
    ) -> AppResult<Self> {
        let mechanisms = operation
            .security
            .iter()
            .map(|requirement| Mechanism::compile(requirement, schemes))
            .collect::<AppResult<Vec<_>>>()?;
        let kinds: Vec<&str> = mechanisms.iter().map(Mechanism::kind).collect();
        debug!(operation = %operation.id, mechanisms = ?kinds, "compiled authentication chain");
        Ok(Self::new(operation.id.clone(), mechanisms))
    }

    /// Mechanisms in the order they are tried.
    pub fn mechanisms(&self) -> &[Mechanism] {
        &self.mechanisms
    }

    /// Runs the chain and binds the first resolved principal into `context`.
    ///
    /// Absent or unparsable credentials move on to the next mechanism. An error
    /// from the resolver stops the chain immediately. When every mechanism is
    /// exhausted, `MalformedAuthentication` is reported over
    /// `MissingAuthentication`.
    pub fn authenticate<R: PrincipalResolver + ?Sized>(
        &self,
        request: &dyn RequestView,
        resolver: &R,
        context: &mut CallerContext<R::Identity>,
    ) -> AppResult<()> {
        if self.mechanisms.is_empty() {
            error!(operation = %self.operation_id, "operation has no authentication mechanisms");
            return Err(AppError::Internal(format!(
                "no authentication mechanisms for '{}'",
                self.operation_id
            )));
        }

        let mut pending: Option<Pending> = None;
        for mechanism in &self.mechanisms {
            let principal = match mechanism {
                Mechanism::None => resolver.resolve_anonymous(request)?,
                _ => match mechanism.extract(request) {
                    Ok(Some(Credentials::Login { username, password })) => {
                        resolver.resolve_login(request, &username, &password)?
                    }
                    Ok(Some(Credentials::Token(token))) => resolver.resolve_token(request, &token)?,
                    Ok(None) => {
                        debug!(operation = %self.operation_id, mechanism = mechanism.kind(), "no credentials presented");
                        pending = pending.max(Some(Pending::Missing));
                        continue;
                    }
                    Err(_) => {
                        debug!(operation = %self.operation_id, mechanism = mechanism.kind(), "malformed credentials");
                        pending = pending.max(Some(Pending::Malformed));
                        continue;
                    }
                },
            };

            debug!(operation = %self.operation_id, mechanism = mechanism.kind(), kind = %principal.kind, "authenticated");
            context.bind(principal);
            return Ok(());
        }

        Err(pending.unwrap_or(Pending::Missing).into())
    }
}
