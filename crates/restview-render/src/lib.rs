//! Output rendering for restview handlers.
//!
//! `restview-render` turns the result object produced by a handler's business
//! method into final output. It knows nothing about requests or verbs: it is
//! handed a format key, an optional template name and a `serde_json::Value`.
//!
//! # Output strategies
//!
//! - **Registered renderers**: a [`RendererRegistry`] maps format keys to
//!   [`RenderFn`]s. The process-wide [`RendererRegistry::builtin`] table
//!   serializes results to JSON, YAML, XML and CSV.
//! - **Template fallback**: when no renderer is registered for the format and
//!   the handler names a template, the result is rendered by a
//!   [`TemplateEngine`] using the template `"<template_name>.<format>"`.
//! - **Pass-through**: when neither applies, resolution yields no renderer and
//!   the HTTP layer receives the raw result.
//!
//! # Example
//!
//! ```rust
//! use restview_render::{from_fn, RendererRegistry};
//! use serde_json::json;
//!
//! // Handler-local layer over the shared built-ins
//! let registry = RendererRegistry::layered(RendererRegistry::builtin())
//!     .with_renderer("txt", from_fn(|data| Ok(data.to_string())));
//!
//! let renderer = registry.resolve("json", Some("profile")).unwrap();
//! let body = renderer.render(&json!({"name": "ada"})).unwrap();
//! assert!(body.contains("\"name\": \"ada\""));
//! ```

mod error;
mod registry;
mod serialize;
mod template;

pub use error::RenderError;

pub use registry::{from_fn, structured, RenderFn, Renderer, RendererRegistry};

pub use serialize::{to_csv, to_json, to_xml, to_yaml, SerializeError, StructuredFormat, XML_ROOT};

pub use template::{MiniJinjaEngine, TemplateEngine};
