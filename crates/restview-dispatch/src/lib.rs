//! Verb dispatch for inheritable HTTP handlers.
//!
//! `restview-dispatch` sits between a web framework's router and your
//! business logic. A handler declares one route and implements any of the
//! verbs GET, POST, PUT, DELETE and HEAD; for each request the pipeline
//! resolves the effective verb, runs the verb's validator, invokes the verb
//! method and renders the result in the requested format.
//!
//! # Features
//!
//! - **Capabilities from slots**: the verbs a handler accepts are exactly the
//!   verb methods it was given
//! - **Method override**: HTML forms can `POST` with `__method__=PUT`
//! - **Validators**: per-verb request validation producing [`Params`]
//! - **Content negotiation**: `?format=json` picks a renderer, falling back to
//!   a `"<template>.<format>"` template, then to the raw result
//! - **Hooks**: setup/teardown around each dispatch with typed per-request
//!   [`Extensions`]
//! - **Inheritance**: clone a [`HandlerBuilder`] and add what differs
//!
//! # Example
//!
//! ```rust
//! use restview_dispatch::{HandlerBuilder, IncomingRequest, Output, Params, PathArgs};
//! use serde_json::json;
//!
//! let users = HandlerBuilder::new("Users")
//!     .route("/users/<id>")
//!     .get(|_ctx, params: Params| {
//!         let id = params.get("id").cloned().unwrap_or_default();
//!         Ok::<_, anyhow::Error>(json!({"id": id, "name": "ada"}))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut args = PathArgs::new();
//! args.insert("id".into(), json!(1));
//!
//! let req = IncomingRequest::get().with_query("format", "json");
//! let output = users.dispatch(&req, args).unwrap();
//! assert!(matches!(output, Output::Rendered { ref format, .. } if format == "json"));
//!
//! let err = users.dispatch(&IncomingRequest::new("DELETE"), PathArgs::new()).unwrap_err();
//! assert_eq!(err.to_string(), "DELETE is an invalid method");
//! ```
//!
//! # Errors
//!
//! Nothing is recovered locally. Validation, handler and setup failures keep
//! the user's error (see [`DispatchError::downcast_ref`]); the HTTP layer maps
//! them to responses.

mod context;
mod error;
mod handler;
mod hooks;
mod params;
mod pipeline;
mod registration;
mod request;
mod verb;

pub use context::{DispatchContext, Extensions, Stage};

pub use error::{ConfigurationError, DispatchError};

pub use handler::{
    HandlerBuilder, HandlerDefinition, IntoResultObject, ValidateFn, VerbFn, DEFAULT_FORMAT,
    DEFAULT_METHOD_OVERRIDE_FIELD,
};

pub use hooks::{EnterFn, ExitFn, Hooks};

pub use params::Params;

pub use pipeline::{Output, FORMAT_FIELD};

pub use registration::{add_handlers, Registration, RouteRegistrar};

pub use request::{IncomingRequest, PathArgs, Request};

pub use verb::{UnknownVerb, Verb, VerbSet};

// Re-export the render layer so handlers need one import
pub use restview_render::{
    from_fn, MiniJinjaEngine, RenderError, RenderFn, Renderer, RendererRegistry, TemplateEngine,
};
