//! Error types for rendering.
//!
//! [`RenderError`] is the single error type returned by renderers, whether they
//! serialize the result object directly or hand it to a template engine.

use thiserror::Error;

/// Errors that can occur while turning a result object into output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The result object could not be serialized to the requested format.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Template syntax error or a failure while executing the template.
    #[error("template error: {0}")]
    Template(String),

    /// The template engine has no template with this name.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A template renderer was selected but no engine was configured.
    #[error("no template engine configured to render `{0}`")]
    NoTemplateEngine(String),

    /// Other renderer-specific failure.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Serialization(e.to_string())
    }
}

impl From<crate::serialize::SerializeError> for RenderError {
    fn from(e: crate::serialize::SerializeError) -> Self {
        RenderError::Serialization(e.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(e: minijinja::Error) -> Self {
        RenderError::Template(e.to_string())
    }
}
