//! Resolved identities and the host callbacks that produce them.

use crate::error::AppResult;
use crate::request::RequestView;
use serde::Serialize;

/// Kind reported for anonymous callers.
pub const ANONYMOUS_KIND: &str = "none";

/// The resolved identity of a caller, e.g. `("user", U1)` or `("none", nothing)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal<T> {
    /// What sort of caller this is.
    #[serde(rename = "type")]
    pub kind: String,
    /// The host's identity object, if any.
    pub value: Option<T>,
}

impl<T> Principal<T> {
    /// A principal carrying an identity.
    pub fn new(kind: impl Into<String>, value: T) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value),
        }
    }

    /// `("none", nothing)`.
    pub fn anonymous() -> Self {
        Self {
            kind: ANONYMOUS_KIND.to_string(),
            value: None,
        }
    }

    /// True for the anonymous principal.
    pub fn is_anonymous(&self) -> bool {
        self.kind == ANONYMOUS_KIND && self.value.is_none()
    }
}

/// Request-scoped slot holding at most one bound principal.
///
/// One instance per request; never shared between requests.
#[derive(Debug)]
pub struct CallerContext<T> {
    principal: Option<Principal<T>>,
}

impl<T> Default for CallerContext<T> {
    fn default() -> Self {
        Self { principal: None }
    }
}

impl<T> CallerContext<T> {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `principal`, replacing any previous one.
    pub fn bind(&mut self, principal: Principal<T>) {
        self.principal = Some(principal);
    }

    /// The bound principal.
    pub fn principal(&self) -> Option<&Principal<T>> {
        self.principal.as_ref()
    }

    /// Removes and returns the bound principal.
    pub fn take(&mut self) -> Option<Principal<T>> {
        self.principal.take()
    }
}

/// Host-supplied credential resolution.
///
/// Implementations may block (e.g. a database lookup); the pipeline calls them
/// synchronously. Returning `Err` (typically `AppError::InvalidCredentials`)
/// ends authentication for the request: no other mechanism is tried.
pub trait PrincipalResolver {
    /// The host's identity type.
    type Identity;

    /// Resolves a `basic` username and password.
    fn resolve_login(
        &self,
        request: &dyn RequestView,
        username: &str,
        password: &str,
    ) -> AppResult<Principal<Self::Identity>>;

    /// Resolves a `bearer` or `apiKey` token.
    fn resolve_token(
        &self,
        request: &dyn RequestView,
        token: &str,
    ) -> AppResult<Principal<Self::Identity>>;

    /// Resolves a caller that presented nothing, where anonymous access is allowed.
    fn resolve_anonymous(&self, _request: &dyn RequestView) -> AppResult<Principal<Self::Identity>> {
        Ok(Principal::anonymous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous() {
        let principal: Principal<u32> = Principal::anonymous();
        assert_eq!(principal.kind, "none");
        assert!(principal.is_anonymous());
        assert!(!Principal::new("user", 7).is_anonymous());
    }

    #[test]
    fn test_context_binding() {
        let mut ctx = CallerContext::new();
        assert!(ctx.principal().is_none());
        ctx.bind(Principal::new("user", "U1"));
        ctx.bind(Principal::new("company", "C1"));
        assert_eq!(ctx.principal().map(|p| p.kind.as_str()), Some("company"));
        assert_eq!(ctx.take().and_then(|p| p.value), Some("C1"));
        assert!(ctx.principal().is_none());
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let value = serde_json::to_value(Principal::new("user", "U1")).unwrap();
        assert_eq!(value, serde_json::json!({"type": "user", "value": "U1"}));
    }
}
