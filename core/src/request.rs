//! # Request View
//!
//! The narrow window this crate gets onto a host framework's request. Route
//! matching is the host's job: by the time a request reaches the core it
//! already knows which route pattern it matched.

use std::collections::HashMap;

/// Read-only access to the parts of an inbound request the core needs.
pub trait RequestView {
    /// Request method, any case.
    fn method(&self) -> &str;

    /// The route pattern the host matched, e.g. `/users/{userId}`.
    fn route_pattern(&self) -> &str;

    /// Header value by name. Hosts should match names case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// Query string value by name.
    fn query(&self, name: &str) -> Option<&str>;

    /// Templated path segment by name.
    fn path_param(&self, name: &str) -> Option<&str>;

    /// Cookie value by name.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Raw body payload, if any.
    fn body(&self) -> Option<&[u8]>;
}

/// An owned [`RequestView`] for hosts without a request type of their own.
///
/// Header names are stored lowercased and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParts {
    method: String,
    route_pattern: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    path: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl RequestParts {
    /// Starts a request for `method` on an already matched route pattern.
    pub fn new(method: impl Into<String>, route_pattern: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route_pattern: route_pattern.into(),
            ..Self::default()
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Adds a query string value.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a path segment value.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Adds a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl RequestView for RequestParts {
    fn method(&self) -> &str {
        &self.method
    }

    fn route_pattern(&self) -> &str {
        &self.route_pattern
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
