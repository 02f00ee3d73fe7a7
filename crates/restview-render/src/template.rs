//! Template engine abstraction.
//!
//! The dispatch core never parses or loads templates itself. When a handler
//! falls back to a template renderer, the template identifier
//! (`"<template_name>.<format>"`) and the result object are handed to a
//! [`TemplateEngine`]. [`MiniJinjaEngine`] is the bundled implementation.

use std::path::Path;

use minijinja::{Environment, ErrorKind, Value};

use crate::error::RenderError;

/// A template engine that renders a named template against a context object.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template identified by `name` with `context`.
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, RenderError>;

    /// Checks if a template with the given name can be rendered.
    fn has_template(&self, name: &str) -> bool;
}

/// MiniJinja-based template engine.
///
/// Templates are either registered inline via [`add_template`](Self::add_template)
/// or resolved from a directory by file name, so `profile.html` maps to
/// `<dir>/profile.html`.
///
/// # Example
///
/// ```rust
/// use restview_render::{MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let mut engine = MiniJinjaEngine::new();
/// engine.add_template("profile.html", "<h1>{{ name }}</h1>").unwrap();
///
/// let out = engine.render("profile.html", &json!({"name": "ada"})).unwrap();
/// assert_eq!(out, "<h1>ada</h1>");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Creates an engine with no templates.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Creates an engine that loads templates from `dir` on demand.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref()));
        Self { env }
    }

    /// Registers an inline template under `name`.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    /// Returns a mutable reference to the underlying MiniJinja environment,
    /// for registering filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, RenderError> {
        let tmpl = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(name.to_string()),
            _ => RenderError::from(e),
        })?;
        Ok(tmpl.render(Value::from_serialize(context))?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}
