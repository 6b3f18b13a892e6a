//! # Contract Models
//!
//! Typed records for the parts of an OpenAPI document the core compiles:
//! operations, their parameters and body fields, and security schemes.
//!
//! These are produced once at load time and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP verbs that may appear as keys of an OpenAPI Path Item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// `get`
    Get,
    /// `put`
    Put,
    /// `post`
    Post,
    /// `delete`
    Delete,
    /// `options`
    Options,
    /// `head`
    Head,
    /// `patch`
    Patch,
    /// `trace`
    Trace,
}

impl Verb {
    /// All verbs in document order.
    pub const ALL: [Verb; 8] = [
        Verb::Get,
        Verb::Put,
        Verb::Post,
        Verb::Delete,
        Verb::Options,
        Verb::Head,
        Verb::Patch,
        Verb::Trace,
    ];

    /// Lowercase name as used for Path Item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Post => "post",
            Verb::Delete => "delete",
            Verb::Options => "options",
            Verb::Head => "head",
            Verb::Patch => "patch",
            Verb::Trace => "trace",
        }
    }

    /// Matches a Path Item key exactly (keys are lowercase in OpenAPI).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == key)
    }

    /// Matches a request method case-insensitively (`GET`, `get`, `Get`).
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// URL query string.
    Query,
    /// Request header.
    Header,
    /// Templated path segment.
    Path,
    /// Cookie.
    Cookie,
}

impl ParamLocation {
    /// Parses the value of a parameter's `in` field.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "path" => Some(ParamLocation::Path),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }

    /// The `in` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Path => "path",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// The primitive schema types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
}

impl PrimitiveType {
    /// Parses a schema `type` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "boolean" => Some(PrimitiveType::Boolean),
            "integer" => Some(PrimitiveType::Integer),
            "number" => Some(PrimitiveType::Number),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }

    /// The schema `type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Wire name.
    pub name: String,
    /// Wire location.
    pub location: ParamLocation,
    /// Declared primitive type.
    #[serde(rename = "type")]
    pub ty: PrimitiveType,
    /// Defaults to true when the contract does not say otherwise.
    pub required: bool,
    /// Value used when the parameter is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// One property of a request body object schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyField {
    /// Property name.
    pub name: String,
    /// Declared primitive type.
    #[serde(rename = "type")]
    pub ty: PrimitiveType,
    /// Listed in the schema's `required` array.
    pub required: bool,
    /// Value used when the field is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// One alternative of an operation's `security` list.
///
/// An empty requirement permits anonymous access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecurityRequirement {
    /// Scheme name to required scopes.
    pub schemes: IndexMap<String, Vec<String>>,
}

impl SecurityRequirement {
    /// The `{}` requirement.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A requirement on a single named scheme.
    pub fn scheme(name: impl Into<String>) -> Self {
        let mut schemes = IndexMap::new();
        schemes.insert(name.into(), Vec::new());
        Self { schemes }
    }

    /// True for `{}`.
    pub fn is_anonymous(&self) -> bool {
        self.schemes.is_empty()
    }
}

/// A named entry of `components.securitySchemes`.
///
/// Kept loose on purpose: schemes this crate cannot execute still load, and
/// only fail when an operation that needs them is first authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// `http`, `apiKey`, `oauth2`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// For `http`: `basic`, `bearer`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// For `apiKey`: header/query/cookie key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// For `apiKey`: `header`, `query` or `cookie`.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One verb on one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    /// Contract-wide unique `operationId`.
    pub id: String,
    /// HTTP verb.
    pub verb: Verb,
    /// Templated path, e.g. `/users/{userId}/widgets`.
    pub route_pattern: String,
    /// Tags in declaration order.
    pub tags: Vec<String>,
    /// Flattened parameters (local first, then inherited).
    pub parameters: Vec<Parameter>,
    /// Request body fields; empty means no body is expected.
    pub request_body: Vec<BodyField>,
    /// Never empty after normalization.
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    /// Looks up a parameter by location and name.
    pub fn parameter(&self, location: ParamLocation, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.location == location && p.name == name)
    }

    /// True if anonymous access is one of the alternatives.
    pub fn allows_anonymous(&self) -> bool {
        self.security.iter().any(SecurityRequirement::is_anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parsing() {
        assert_eq!(Verb::from_key("get"), Some(Verb::Get));
        assert_eq!(Verb::from_key("GET"), None);
        assert_eq!(Verb::from_key("parameters"), None);
        assert_eq!(Verb::from_method("PATCH"), Some(Verb::Patch));
        assert_eq!(Verb::from_method("connect"), None);
        assert_eq!(Verb::Trace.to_string(), "trace");
    }

    #[test]
    fn test_location_and_type_parsing() {
        assert_eq!(ParamLocation::parse("cookie"), Some(ParamLocation::Cookie));
        assert_eq!(ParamLocation::parse("matrix"), None);
        assert_eq!(PrimitiveType::parse("number"), Some(PrimitiveType::Number));
        assert_eq!(PrimitiveType::parse("array"), None);
    }

    #[test]
    fn test_security_requirement() {
        assert!(SecurityRequirement::anonymous().is_anonymous());
        let req = SecurityRequirement::scheme("bearerAuth");
        assert!(!req.is_anonymous());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"bearerAuth": []})
        );
    }

    #[test]
    fn test_scheme_deserialization() {
        let scheme: SecurityScheme =
            serde_json::from_value(serde_json::json!({"type": "apiKey", "name": "X-Key", "in": "header"}))
                .unwrap();
        assert_eq!(scheme.kind, "apiKey");
        assert_eq!(scheme.name.as_deref(), Some("X-Key"));
        assert_eq!(scheme.location.as_deref(), Some("header"));
        assert_eq!(scheme.scheme, None);
    }
}
