use pretty_assertions::assert_eq;
use scaffold_core::{
    error_response, AppError, AppResult, CallerContext, Contract, ContractConfig, Principal,
    PrincipalResolver, RequestParts, RequestView,
};
use serde_json::{json, Value};
use std::cell::Cell;

const CONTRACT: &str = r#"
openapi: 3.0.0
components:
  securitySchemes:
    basicAuth: {type: http, scheme: basic}
    bearerAuth: {type: http, scheme: bearer}
    keyAuth: {type: apiKey, name: X-Api-Key, in: header}
paths:
  /widgets/{id}:
    get:
      operationId: getWidget
      parameters:
        - {name: id, in: path, schema: {type: string}}
      security:
        - {}
  /me:
    get:
      operationId: whoAmI
      security:
        - bearerAuth: []
  /reports:
    get:
      operationId: listReports
      parameters:
        - {name: year, in: query, schema: {type: integer}}
        - {name: limit, in: query, required: false, schema: {type: integer, default: 20}}
      security:
        - keyAuth: []
        - bearerAuth: []
  /session:
    post:
      operationId: login
      security:
        - basicAuth: []
        - {}
"#;

/// Knows user `alice:secret` and token `abc123`.
#[derive(Default)]
struct Directory {
    anonymous_calls: Cell<usize>,
}

impl PrincipalResolver for Directory {
    type Identity = String;

    fn resolve_login(
        &self,
        _request: &dyn RequestView,
        username: &str,
        password: &str,
    ) -> AppResult<Principal<String>> {
        if (username, password) == ("alice", "secret") {
            Ok(Principal::new("user", "alice".to_string()))
        } else {
            Err(AppError::InvalidCredentials("wrong username or password".into()))
        }
    }

    fn resolve_token(&self, _request: &dyn RequestView, token: &str) -> AppResult<Principal<String>> {
        if token == "abc123" {
            Ok(Principal::new("user", "U1".to_string()))
        } else {
            Err(AppError::InvalidCredentials("unknown token".into()))
        }
    }

    fn resolve_anonymous(&self, _request: &dyn RequestView) -> AppResult<Principal<String>> {
        self.anonymous_calls.set(self.anonymous_calls.get() + 1);
        Ok(Principal::anonymous())
    }
}

fn contract() -> Contract {
    Contract::from_yaml_str(CONTRACT, ContractConfig::default()).unwrap()
}

#[test]
fn test_anonymous_widget_lookup() {
    let contract = contract();
    let request = RequestParts::new("GET", "/widgets/{id}").with_path_param("id", "42");
    let mut caller = CallerContext::new();

    let prepared = contract.prepare(&request, &Directory::default(), &mut caller).unwrap();
    assert_eq!(Value::Object(prepared.params), json!({"id": "42"}));
    let principal = caller.principal().unwrap();
    assert_eq!(principal.kind, "none");
    assert_eq!(principal.value, None);
}

#[test]
fn test_bearer_token_resolves_user() {
    let contract = contract();
    let request = RequestParts::new("GET", "/me").with_header("Authorization", "Bearer abc123");
    let mut caller = CallerContext::new();

    contract.prepare(&request, &Directory::default(), &mut caller).unwrap();
    assert_eq!(caller.take(), Some(Principal::new("user", "U1".to_string())));
}

#[test]
fn test_empty_bearer_token_is_malformed() {
    let contract = contract();
    let request = RequestParts::new("GET", "/me").with_header("Authorization", "Bearer ");
    let err = contract
        .prepare(&request, &Directory::default(), &mut CallerContext::new())
        .unwrap_err();
    assert!(matches!(err, AppError::MalformedAuthentication));

    let body = error_response(&err, &request);
    assert_eq!(body.status, 401);
    assert_eq!(body.code, "MalformedAuthentication");
}

#[test]
fn test_missing_beats_invalid_for_required_parameter() {
    let contract = contract();
    // `year` is absent, `limit` would fail coercion.
    let request = RequestParts::new("GET", "/reports")
        .with_query("limit", "lots")
        .with_header("X-Api-Key", "k");
    let err = contract
        .prepare(&request, &Directory::default(), &mut CallerContext::new())
        .unwrap_err();
    assert!(matches!(err, AppError::MissingParameter(name) if name == "year"));
}

#[test]
fn test_defaults_and_coercion() {
    let contract = contract();
    let request = RequestParts::new("GET", "/reports")
        .with_query("year", "2024")
        .with_header("Authorization", "Bearer abc123");
    let prepared = contract
        .prepare(&request, &Directory::default(), &mut CallerContext::new())
        .unwrap();
    assert_eq!(Value::Object(prepared.params), json!({"year": 2024, "limit": 20}));

    let bad = RequestParts::new("GET", "/reports").with_query("year", "MMXXIV");
    let err = contract
        .prepare(&bad, &Directory::default(), &mut CallerContext::new())
        .unwrap_err();
    assert_eq!(
        error_response(&err, &bad).message,
        "'year' was \"MMXXIV\" but must be a integer"
    );
}

#[test]
fn test_malformed_api_key_beats_missing_bearer() {
    let contract = contract();
    let request = RequestParts::new("GET", "/reports")
        .with_query("year", "2024")
        .with_header("X-Api-Key", "");
    let err = contract
        .prepare(&request, &Directory::default(), &mut CallerContext::new())
        .unwrap_err();
    assert!(matches!(err, AppError::MalformedAuthentication));
}

#[test]
fn test_nothing_presented_is_missing() {
    let contract = contract();
    let request = RequestParts::new("GET", "/reports").with_query("year", "2024");
    let err = contract
        .prepare(&request, &Directory::default(), &mut CallerContext::new())
        .unwrap_err();
    assert!(matches!(err, AppError::MissingAuthentication));
    assert_eq!(error_response(&err, &request).message, "authentication is missing");
}

#[test]
fn test_rejected_login_does_not_fall_back_to_anonymous() {
    let contract = contract();
    let directory = Directory::default();
    // alice:wrong
    let request =
        RequestParts::new("POST", "/session").with_header("Authorization", "Basic YWxpY2U6d3Jvbmc=");
    let mut caller = CallerContext::new();

    let err = contract.prepare(&request, &directory, &mut caller).unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials(_)));
    assert_eq!(directory.anonymous_calls.get(), 0);
    assert!(caller.principal().is_none());
}

#[test]
fn test_good_login_and_anonymous_fallback() {
    let contract = contract();
    let directory = Directory::default();

    // alice:secret
    let request =
        RequestParts::new("POST", "/session").with_header("Authorization", "Basic YWxpY2U6c2VjcmV0");
    let mut caller = CallerContext::new();
    contract.prepare(&request, &directory, &mut caller).unwrap();
    assert_eq!(caller.principal().map(|p| p.kind.as_str()), Some("user"));

    let mut caller = CallerContext::new();
    contract
        .prepare(&RequestParts::new("post", "/session"), &directory, &mut caller)
        .unwrap();
    assert!(caller.principal().unwrap().is_anonymous());
    assert_eq!(directory.anonymous_calls.get(), 1);
}
