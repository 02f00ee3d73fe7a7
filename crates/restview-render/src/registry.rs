//! Format-keyed renderer registry.
//!
//! A [`RendererRegistry`] maps a format key (`"json"`, `"csv"`, ...) to a
//! [`RenderFn`] that turns a result object into output. Registries layer: a
//! handler owns a local registry whose parent is the shared, process-wide
//! table of built-ins, so overrides never mutate shared state.
//!
//! # Resolution
//!
//! [`RendererRegistry::resolve`] picks the output strategy for one request:
//!
//! ```text
//! format ──► local entries ──► parent entries ──► "<template>.<format>" ──► none
//! ```
//!
//! The first hit wins. A registry can also carry the [`TemplateEngine`] used by
//! template renderers; it is inherited through the parent chain like entries.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::RenderError;
use crate::serialize::StructuredFormat;
use crate::template::TemplateEngine;

/// The render function signature.
///
/// Receives the raw result object and produces the final output.
pub type RenderFn = Arc<dyn Fn(&Value) -> Result<String, RenderError> + Send + Sync>;

static BUILTIN: Lazy<Arc<RendererRegistry>> = Lazy::new(|| {
    let registry = StructuredFormat::ALL
        .into_iter()
        .fold(RendererRegistry::new(), |registry, format| {
            registry.with_renderer(format.key(), structured(format))
        });
    Arc::new(registry)
});

/// Creates a render function from a closure.
pub fn from_fn<F>(f: F) -> RenderFn
where
    F: Fn(&Value) -> Result<String, RenderError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Creates a render function that serializes the result in a structured format.
pub fn structured(format: StructuredFormat) -> RenderFn {
    from_fn(move |data| Ok(format.serialize(data)?))
}

/// A layered map from format keys to render functions.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    entries: HashMap<String, RenderFn>,
    parent: Option<Arc<RendererRegistry>>,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl RendererRegistry {
    /// Creates an empty registry with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table of built-in renderers (`json`, `yaml`, `xml`, `csv`).
    ///
    /// Initialized once on first use and never mutated afterwards.
    pub fn builtin() -> Arc<RendererRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Creates an empty registry that falls back to `parent`.
    pub fn layered(parent: Arc<RendererRegistry>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Adds (or replaces) the renderer for `format` in this layer.
    pub fn with_renderer(mut self, format: impl Into<String>, render: RenderFn) -> Self {
        self.insert(format, render);
        self
    }

    /// Sets the template engine used by template renderers resolved here.
    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(engine);
        self
    }

    /// Adds (or replaces) the renderer for `format` in this layer.
    pub fn insert(&mut self, format: impl Into<String>, render: RenderFn) -> Option<RenderFn> {
        self.entries.insert(format.into(), render)
    }

    /// Returns the parent layer, if any.
    pub fn parent(&self) -> Option<&Arc<RendererRegistry>> {
        self.parent.as_ref()
    }

    /// Looks up the renderer for `format`, this layer first, then the parents.
    pub fn get(&self, format: &str) -> Option<&RenderFn> {
        self.entries
            .get(format)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(format)))
    }

    /// Returns `true` if any layer has a renderer for `format`.
    pub fn contains(&self, format: &str) -> bool {
        self.get(format).is_some()
    }

    /// The template engine of the nearest layer that has one.
    pub fn template_engine(&self) -> Option<&Arc<dyn TemplateEngine>> {
        self.templates
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.template_engine()))
    }

    /// All format keys visible from this layer, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();
        self.collect_formats(&mut keys);
        keys.into_iter().collect()
    }

    fn collect_formats(&self, keys: &mut BTreeSet<String>) {
        keys.extend(self.entries.keys().cloned());
        if let Some(parent) = &self.parent {
            parent.collect_formats(keys);
        }
    }

    /// Picks the renderer for `format`.
    ///
    /// A registered renderer wins; otherwise, when `template_name` is set, a
    /// template renderer bound to `"<template_name>.<format>"`. Returns `None`
    /// when neither applies and the raw result should be passed through.
    pub fn resolve(&self, format: &str, template_name: Option<&str>) -> Option<Renderer> {
        if let Some(render) = self.get(format) {
            tracing::trace!(format, "resolved registered renderer");
            return Some(Renderer::Registered {
                format: format.to_string(),
                render: Arc::clone(render),
            });
        }

        let template_name = template_name?;
        let template = format!("{}.{}", template_name, format);
        tracing::trace!(format, template = %template, "resolved template renderer");
        Some(Renderer::Template {
            format: format.to_string(),
            template,
            engine: self.template_engine().cloned(),
        })
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut local: Vec<&String> = self.entries.keys().collect();
        local.sort();
        f.debug_struct("RendererRegistry")
            .field("local", &local)
            .field("has_parent", &self.parent.is_some())
            .field("has_template_engine", &self.templates.is_some())
            .finish()
    }
}

/// The output strategy chosen for one request.
#[derive(Clone)]
pub enum Renderer {
    /// A registered render function receiving the raw result object.
    Registered { format: String, render: RenderFn },
    /// A template executed by the template engine with the result as context.
    Template {
        format: String,
        template: String,
        engine: Option<Arc<dyn TemplateEngine>>,
    },
}

impl Renderer {
    /// The format this renderer produces.
    pub fn format(&self) -> &str {
        match self {
            Renderer::Registered { format, .. } | Renderer::Template { format, .. } => format,
        }
    }

    /// The bound template identifier, for template renderers.
    pub fn template(&self) -> Option<&str> {
        match self {
            Renderer::Template { template, .. } => Some(template),
            Renderer::Registered { .. } => None,
        }
    }

    /// Applies this renderer to a result object.
    ///
    /// Template renderers check [`TemplateEngine::has_template`] first, so a
    /// missing template is reported as [`RenderError::TemplateNotFound`]
    /// whatever the engine.
    pub fn render(&self, context: &Value) -> Result<String, RenderError> {
        match self {
            Renderer::Registered { render, .. } => render(context),
            Renderer::Template {
                template, engine, ..
            } => match engine {
                Some(engine) if !engine.has_template(template) => {
                    Err(RenderError::TemplateNotFound(template.clone()))
                }
                Some(engine) => engine.render(template, context),
                None => Err(RenderError::NoTemplateEngine(template.clone())),
            },
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Registered { format, .. } => f
                .debug_struct("Registered")
                .field("format", format)
                .finish_non_exhaustive(),
            Renderer::Template {
                format,
                template,
                engine,
            } => f
                .debug_struct("Template")
                .field("format", format)
                .field("template", template)
                .field("has_engine", &engine.is_some())
                .finish(),
        }
    }
}
