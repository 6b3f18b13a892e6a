//! # Request Pipeline
//!
//! The request-time control flow over a loaded [`Contract`]:
//! operation lookup, parameter extraction and validation, body validation,
//! then authentication. Errors leave the pipeline as [`AppError`] and are
//! translated once, by [`error_response`], into an [`ErrorBody`].

use crate::auth::{CallerContext, PrincipalResolver};
use crate::error::{AppError, AppResult, ErrorBody};
use crate::oas::{Contract, Operation};
use crate::request::RequestView;
use crate::validation::decode_body;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// A request that passed every check, ready for the host's handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRequest<'c> {
    /// The matched operation.
    pub operation: &'c Operation,
    /// Coerced and defaulted parameters.
    pub params: Map<String, Value>,
    /// Coerced and defaulted body fields.
    pub body: Map<String, Value>,
}

impl Contract {
    /// Runs one request through the pipeline.
    ///
    /// On success the caller's principal is bound in `context`. The first
    /// failure ends the run; nothing is bound in that case.
    pub fn prepare<R: PrincipalResolver + ?Sized>(
        &self,
        request: &dyn RequestView,
        resolver: &R,
        context: &mut CallerContext<R::Identity>,
    ) -> AppResult<PreparedRequest<'_>> {
        let operation = self
            .index()
            .by_request(request.method(), request.route_pattern())?;
        let validators = self.validators(&operation.id)?;

        let mut params = validators.params.extract(request)?;
        validators.params.validate(&mut params)?;

        let mut body = decode_body(request.body())?;
        validators.body.validate(&mut body)?;

        self.authenticate(&operation.id, request, resolver, context)?;

        debug!(operation = %operation.id, "prepared request");
        Ok(PreparedRequest {
            operation,
            params,
            body,
        })
    }
}

/// Translates a pipeline failure into its caller-facing form, logging it.
///
/// Server-side failures are logged at `error` with full detail; the caller
/// only ever sees the fixed internal message.
pub fn error_response(err: &AppError, request: &dyn RequestView) -> ErrorBody {
    let body = ErrorBody::from(err);
    if err.is_caller_error() {
        info!(
            method = request.method(),
            route = request.route_pattern(),
            code = %body.code,
            status = body.status,
            "rejected request: {}",
            body.message
        );
    } else {
        error!(
            method = request.method(),
            route = request.route_pattern(),
            status = body.status,
            "internal error: {}",
            err
        );
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::config::ContractConfig;
    use crate::error::INTERNAL_ERROR_MESSAGE;
    use crate::request::RequestParts;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Tokens;

    impl PrincipalResolver for Tokens {
        type Identity = String;

        fn resolve_login(&self, _r: &dyn RequestView, _u: &str, _p: &str) -> AppResult<Principal<String>> {
            Err(AppError::InvalidCredentials("logins are disabled".into()))
        }

        fn resolve_token(&self, _r: &dyn RequestView, token: &str) -> AppResult<Principal<String>> {
            match token {
                "t1" => Ok(Principal::new("user", "U1".to_string())),
                _ => Err(AppError::InvalidCredentials("unknown token".into())),
            }
        }
    }

    const NOTES: &str = r#"
components:
  securitySchemes:
    bearerAuth: {type: http, scheme: bearer}
paths:
  /notes:
    post:
      operationId: createNote
      security:
        - bearerAuth: []
      parameters:
        - {name: draft, in: query, required: false, schema: {type: boolean, default: false}}
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [text]
              properties:
                text: {type: string}
                pinned: {type: boolean, default: false}
"#;

    fn contract() -> Contract {
        Contract::from_yaml_str(NOTES, ContractConfig::default()).unwrap()
    }

    #[test]
    fn test_prepare_success() {
        let contract = contract();
        let request = RequestParts::new("POST", "/notes")
            .with_header("Authorization", "Bearer t1")
            .with_query("draft", "yes")
            .with_body(r#"{"text": "hello"}"#);
        let mut ctx = CallerContext::new();
        let prepared = contract.prepare(&request, &Tokens, &mut ctx).unwrap();

        assert_eq!(prepared.operation.id, "createNote");
        assert_eq!(Value::Object(prepared.params), json!({"draft": true}));
        assert_eq!(
            Value::Object(prepared.body),
            json!({"text": "hello", "pinned": false})
        );
        assert_eq!(ctx.principal(), Some(&Principal::new("user", "U1".to_string())));
    }

    #[test]
    fn test_validation_runs_before_authentication() {
        let contract = contract();
        let request = RequestParts::new("POST", "/notes").with_body("{}");
        let mut ctx = CallerContext::new();
        let err = contract.prepare(&request, &Tokens, &mut ctx).unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(n) if n == "text"));
        assert!(ctx.principal().is_none());
    }

    #[test]
    fn test_unknown_route() {
        let contract = contract();
        let request = RequestParts::new("GET", "/notes");
        let err = contract
            .prepare(&request, &Tokens, &mut CallerContext::new())
            .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_error_response() {
        let request = RequestParts::new("POST", "/notes");
        let body = error_response(&AppError::MissingAuthentication, &request);
        assert_eq!(body.status, 401);
        assert_eq!(body.message, "authentication is missing");

        let body = error_response(&AppError::Internal("secret detail".into()), &request);
        assert_eq!(body.status, 500);
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
    }
}
