//! Authentication mechanisms and their credential extractors.

use crate::error::{AppError, AppResult};
use crate::oas::models::{SecurityRequirement, SecurityScheme};
use crate::request::RequestView;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use std::fmt;

const AUTHORIZATION: &str = "Authorization";
const BASIC_PREFIX: &str = "Basic ";
const BEARER_PREFIX: &str = "Bearer ";

/// Where an API key travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    /// Request header.
    Header,
    /// URL query string.
    Query,
    /// Cookie.
    Cookie,
}

/// One way of authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    /// Anonymous access; has no extractor.
    None,
    /// `Authorization: Basic <base64(user:pass)>`.
    Basic,
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// A token under a named key.
    ApiKey {
        /// Header, query or cookie key.
        name: String,
        /// Where to look.
        location: KeyLocation,
    },
}

/// Raw credential material pulled from a request, not yet checked.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// From `basic`.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// From `bearer` or `apiKey`.
    Token(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

impl Mechanism {
    /// Compiles one security requirement against the contract's scheme table.
    pub fn compile(
        requirement: &SecurityRequirement,
        schemes: &IndexMap<String, SecurityScheme>,
    ) -> AppResult<Self> {
        if requirement.is_anonymous() {
            return Ok(Mechanism::None);
        }
        if requirement.schemes.len() > 1 {
            let names: Vec<&str> = requirement.schemes.keys().map(String::as_str).collect();
            return Err(AppError::UnsupportedSecurityScheme(format!(
                "combined requirement [{}]",
                names.join(", ")
            )));
        }

        let Some(name) = requirement.schemes.keys().next() else {
            return Ok(Mechanism::None);
        };
        let scheme = schemes.get(name).ok_or_else(|| {
            AppError::UnsupportedSecurityScheme(format!("'{}' is not declared", name))
        })?;

        match scheme.kind.as_str() {
            "http" => match scheme.scheme.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("basic") => Ok(Mechanism::Basic),
                Some("bearer") => Ok(Mechanism::Bearer),
                other => Err(AppError::UnsupportedSecurityScheme(format!(
                    "'{}' uses http scheme '{}'",
                    name,
                    other.unwrap_or("")
                ))),
            },
            "apiKey" => {
                let key = scheme.name.clone().ok_or_else(|| {
                    AppError::Internal(format!("apiKey scheme '{}' has no 'name'", name))
                })?;
                let location = match scheme.location.as_deref() {
                    Some("header") => KeyLocation::Header,
                    Some("query") => KeyLocation::Query,
                    Some("cookie") => KeyLocation::Cookie,
                    other => {
                        return Err(AppError::Internal(format!(
                            "apiKey scheme '{}' has unknown location '{}'",
                            name,
                            other.unwrap_or("")
                        )))
                    }
                };
                Ok(Mechanism::ApiKey {
                    name: key,
                    location,
                })
            }
            other => Err(AppError::UnsupportedSecurityScheme(format!(
                "'{}' has type '{}'",
                name, other
            ))),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Mechanism::None => "none",
            Mechanism::Basic => "basic",
            Mechanism::Bearer => "bearer",
            Mechanism::ApiKey { .. } => "apiKey",
        }
    }

    /// Pulls credential material from `request`.
    ///
    /// `Ok(None)` means nothing was presented for this mechanism;
    /// `Err(MalformedAuthentication)` means something was presented but could
    /// not be parsed. [`Mechanism::None`] never finds anything.
    pub fn extract(&self, request: &dyn RequestView) -> AppResult<Option<Credentials>> {
        match self {
            Mechanism::None => Ok(None),
            Mechanism::Basic => parse_basic(request.header(AUTHORIZATION)),
            Mechanism::Bearer => parse_bearer(request.header(AUTHORIZATION)),
            Mechanism::ApiKey { name, location } => {
                let raw = match location {
                    KeyLocation::Header => request.header(name),
                    KeyLocation::Query => request.query(name),
                    KeyLocation::Cookie => request.cookie(name),
                };
                token_credentials(raw)
            }
        }
    }
}

fn parse_basic(header: Option<&str>) -> AppResult<Option<Credentials>> {
    let Some(payload) = header.and_then(|h| h.strip_prefix(BASIC_PREFIX)) else {
        return Ok(None);
    };
    let decoded = STANDARD
        .decode(payload.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(AppError::MalformedAuthentication)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AppError::MalformedAuthentication)?;
    Ok(Some(Credentials::Login {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

fn parse_bearer(header: Option<&str>) -> AppResult<Option<Credentials>> {
    token_credentials(header.and_then(|h| h.strip_prefix(BEARER_PREFIX)))
}

/// A presented but blank token is malformed.
fn token_credentials(raw: Option<&str>) -> AppResult<Option<Credentials>> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Err(AppError::MalformedAuthentication),
        Some(token) => Ok(Some(Credentials::Token(token.to_string()))),
    }
}
