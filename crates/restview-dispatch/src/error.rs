//! Error types for handler construction and dispatch.
//!
//! The pipeline performs no local recovery: every failure is returned to the
//! HTTP layer, which alone decides the response (405 for
//! [`DispatchError::MethodNotAllowed`], whatever a domain error maps to, and so
//! on). Errors raised by user code travel as [`anyhow::Error`] and are never
//! rewrapped, so the original type stays reachable through `downcast_ref`.

use restview_render::RenderError;
use thiserror::Error;

use crate::verb::VerbSet;

/// A handler definition that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The handler never declared a route.
    #[error("handler `{0}` must declare a route")]
    MissingRoute(String),
}

/// A failure while dispatching one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The effective verb is not in the handler's capability set.
    #[error("{verb} is an invalid method")]
    MethodNotAllowed {
        /// The attempted verb, upper-cased.
        verb: String,
        /// The verbs the handler does implement.
        allowed: VerbSet,
    },

    /// A setup hook refused the request.
    #[error(transparent)]
    Setup(anyhow::Error),

    /// The validator rejected the request.
    #[error(transparent)]
    Validation(anyhow::Error),

    /// The verb method failed.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// The result object could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DispatchError {
    /// Returns `true` for [`DispatchError::MethodNotAllowed`].
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, DispatchError::MethodNotAllowed { .. })
    }

    /// The error raised by user code, for setup, validation and handler failures.
    pub fn user_error(&self) -> Option<&anyhow::Error> {
        match self {
            DispatchError::Setup(e) | DispatchError::Validation(e) | DispatchError::Handler(e) => {
                Some(e)
            }
            DispatchError::MethodNotAllowed { .. } | DispatchError::Render(_) => None,
        }
    }

    /// Downcasts the user-code error to its original type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.user_error().and_then(|e| e.downcast_ref::<E>())
    }
}
