//! A set of handlers sharing settings, renderers and a template engine.
//!
//! [`Site`] is the composition root: it owns the renderer defaults every
//! handler layers over, hands out [`HandlerBuilder`]s pre-seeded with the site
//! settings, and registers the mounted handlers with a router in one call.
//!
//! ```rust
//! use restview::prelude::*;
//! use serde_json::json;
//!
//! let mut site = Site::builder()
//!     .settings(Settings { default_format: "json".into(), ..Settings::default() })
//!     .build();
//!
//! let hello = site.handler("Hello").route("/hello").get(|_ctx, _p: Params| {
//!     Ok::<_, anyhow::Error>(json!({"greeting": "hi"}))
//! });
//! site.mount(hello).unwrap();
//!
//! let mut routes: Vec<Registration> = Vec::new();
//! site.register_all(&mut routes).unwrap();
//! assert_eq!(routes.len(), 1);
//! ```

use std::sync::Arc;

use restview_dispatch::{
    add_handlers, ConfigurationError, HandlerBuilder, HandlerDefinition, RouteRegistrar,
};
use restview_render::{MiniJinjaEngine, RenderFn, RendererRegistry, TemplateEngine};

use crate::settings::Settings;

/// Builder for [`Site`].
#[derive(Default)]
pub struct SiteBuilder {
    settings: Settings,
    renderers: Vec<(String, RenderFn)>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
}

impl SiteBuilder {
    /// Starts with default settings and the built-in renderers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the site settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds a site-wide renderer, shadowing a built-in one for `format`.
    pub fn renderer(mut self, format: impl Into<String>, render: RenderFn) -> Self {
        self.renderers.push((format.into(), render));
        self
    }

    /// Sets the template engine.
    ///
    /// Without one, a [`MiniJinjaEngine`] reading `template_dir` is used when
    /// the settings name a directory.
    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.template_engine = Some(engine);
        self
    }

    pub fn build(self) -> Site {
        let mut renderers = RendererRegistry::layered(RendererRegistry::builtin());
        for (format, render) in self.renderers {
            renderers.insert(format, render);
        }

        let engine = self.template_engine.or_else(|| {
            self.settings.template_dir.as_ref().map(|dir| {
                tracing::debug!(dir = %dir.display(), "loading templates from directory");
                Arc::new(MiniJinjaEngine::from_dir(dir)) as Arc<dyn TemplateEngine>
            })
        });
        if let Some(engine) = engine {
            renderers = renderers.with_template_engine(engine);
        }

        Site {
            settings: self.settings,
            renderers: Arc::new(renderers),
            handlers: Vec::new(),
        }
    }
}

/// Mounted handlers plus the defaults they were built with.
pub struct Site {
    settings: Settings,
    renderers: Arc<RendererRegistry>,
    handlers: Vec<Arc<HandlerDefinition>>,
}

impl Site {
    pub fn builder() -> SiteBuilder {
        SiteBuilder::new()
    }

    /// The site settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The renderer defaults shared by every handler.
    pub fn renderers(&self) -> &Arc<RendererRegistry> {
        &self.renderers
    }

    /// Starts a handler seeded with the site's format, override field and
    /// renderer defaults.
    pub fn handler(&self, name: impl Into<String>) -> HandlerBuilder {
        let builder = HandlerBuilder::new(name)
            .default_format(self.settings.default_format.clone())
            .renderer_defaults(Arc::clone(&self.renderers));
        match self.settings.method_override() {
            Some(field) => builder.method_override(field),
            None => builder.no_method_override(),
        }
    }

    /// Builds `builder` and adds the handler to the site.
    pub fn mount(
        &mut self,
        builder: HandlerBuilder,
    ) -> Result<Arc<HandlerDefinition>, ConfigurationError> {
        let handler = Arc::new(builder.build()?);
        self.handlers.push(Arc::clone(&handler));
        Ok(handler)
    }

    /// The mounted handlers, in mount order.
    pub fn handlers(&self) -> &[Arc<HandlerDefinition>] {
        &self.handlers
    }

    /// Finds a mounted handler by endpoint name.
    pub fn find(&self, name: &str) -> Option<&Arc<HandlerDefinition>> {
        self.handlers.iter().find(|h| h.name() == name)
    }

    /// Registers every mounted handler with `registrar`.
    pub fn register_all<R>(&self, registrar: &mut R) -> Result<(), R::Error>
    where
        R: RouteRegistrar + ?Sized,
    {
        add_handlers(registrar, self.handlers.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restview_dispatch::{from_fn, IncomingRequest, Output, Params, PathArgs, Registration};
    use serde_json::json;
    use std::fs;

    fn ok(
        _ctx: &restview_dispatch::DispatchContext<'_>,
        _params: Params,
    ) -> Result<serde_json::Value, anyhow::Error> {
        Ok(json!({"name": "ada"}))
    }

    #[test]
    fn test_handler_inherits_settings() {
        let site = Site::builder()
            .settings(Settings {
                default_format: "yaml".into(),
                method_override_field: "_m".into(),
                template_dir: None,
            })
            .build();

        let handler = site.handler("H").route("/h").get(ok).build().unwrap();
        assert_eq!(handler.default_format(), "yaml");
        assert_eq!(handler.method_override_field(), Some("_m"));
    }

    #[test]
    fn test_disabled_override_propagates() {
        let site = Site::builder()
            .settings(Settings {
                method_override_field: String::new(),
                ..Settings::default()
            })
            .build();
        let handler = site.handler("H").route("/h").build().unwrap();
        assert_eq!(handler.method_override_field(), None);
    }

    #[test]
    fn test_site_renderer_shared_by_handlers() {
        let site = Site::builder()
            .renderer("txt", from_fn(|data| Ok(format!("txt:{}", data["name"]))))
            .build();

        let handler = site.handler("H").route("/h").get(ok).build().unwrap();
        let req = IncomingRequest::get().with_query("format", "txt");
        let output = handler.dispatch(&req, PathArgs::new()).unwrap();
        assert_eq!(output.body(), Some("txt:\"ada\""));
        assert!(handler.renderers().contains("json"));
    }

    #[test]
    fn test_template_dir_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("profile.html"), "Hello {{ name }}").unwrap();

        let site = Site::builder()
            .settings(Settings {
                template_dir: Some(dir.path().to_path_buf()),
                ..Settings::default()
            })
            .build();

        let handler = site
            .handler("Profile")
            .route("/profile")
            .template("profile")
            .get(ok)
            .build()
            .unwrap();

        let output = handler
            .dispatch(&IncomingRequest::get(), PathArgs::new())
            .unwrap();
        assert_eq!(
            output,
            Output::Rendered {
                format: "html".into(),
                body: "Hello ada".into()
            }
        );
    }

    #[test]
    fn test_mount_and_register() {
        let mut site = Site::builder().build();
        site.mount(site.handler("A").route("/a").get(ok)).unwrap();
        site.mount(site.handler("B").route("/b").get(ok).put(ok)).unwrap();

        assert!(site.find("B").is_some());
        assert!(site.find("C").is_none());

        let mut routes: Vec<Registration> = Vec::new();
        site.register_all(&mut routes).unwrap();
        let verbs: Vec<_> = routes.iter().map(|r| r.allowed_verbs.to_string()).collect();
        assert_eq!(verbs, vec!["GET", "GET, PUT"]);
    }

    #[test]
    fn test_mount_rejects_missing_route() {
        let mut site = Site::builder().build();
        let err = site.mount(site.handler("NoRoute").get(ok)).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingRoute("NoRoute".into()));
        assert!(site.handlers().is_empty());
    }
}
