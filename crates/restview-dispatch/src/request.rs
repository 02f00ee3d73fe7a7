//! The request contract between the HTTP layer and the pipeline.
//!
//! The pipeline only needs three things from an incoming request: its method,
//! form fields (for the method override) and combined query/form values (for
//! the requested output format). Any HTTP stack can implement [`Request`];
//! [`IncomingRequest`] is a plain owned implementation for adapters and tests.

use std::collections::HashMap;

/// Keyword arguments extracted from the route pattern (`/users/<id>` → `id`).
pub type PathArgs = serde_json::Map<String, serde_json::Value>;

/// Read access to one incoming HTTP request.
pub trait Request {
    /// The literal HTTP method (`"GET"`, `"POST"`, ...).
    fn method(&self) -> &str;

    /// A form field from the request body.
    fn form(&self, field: &str) -> Option<&str>;

    /// A request value: query parameter first, then form field.
    fn value(&self, name: &str) -> Option<&str>;
}

/// An owned request assembled by the HTTP layer.
///
/// # Example
///
/// ```rust
/// use restview_dispatch::{IncomingRequest, Request};
///
/// let req = IncomingRequest::new("POST")
///     .with_form("__method__", "PUT")
///     .with_query("format", "json");
///
/// assert_eq!(req.method(), "POST");
/// assert_eq!(req.form("__method__"), Some("PUT"));
/// assert_eq!(req.value("format"), Some("json"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRequest {
    method: String,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
}

impl IncomingRequest {
    /// Creates a request with the given method and no parameters.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get() -> Self {
        Self::new("GET")
    }

    /// Shorthand for a `POST` request.
    pub fn post() -> Self {
        Self::new("POST")
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a form field.
    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }
}

impl Request for IncomingRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn form(&self, field: &str) -> Option<&str> {
        self.form.get(field).map(String::as_str)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .or_else(|| self.form.get(name))
            .map(String::as_str)
    }
}
