//! Handler definitions.
//!
//! A handler binds one route to up to five verb methods (`get`, `post`, `put`,
//! `delete`, `head`), each optionally preceded by a validator. Handlers are
//! assembled with a [`HandlerBuilder`] and frozen into a [`HandlerDefinition`]
//! at startup; the definition is immutable and shared by every request.
//!
//! # Capabilities
//!
//! The capability set is never declared: it is exactly the set of verbs whose
//! method slot was filled before [`HandlerBuilder::build`]. A handler with no
//! verb methods builds fine and answers every request with
//! [`DispatchError::MethodNotAllowed`](crate::DispatchError::MethodNotAllowed).
//!
//! # Inheritance
//!
//! Builders are cheap to clone, so a base handler can carry shared validation
//! and derived handlers only add what differs:
//!
//! ```rust
//! use restview_dispatch::{HandlerBuilder, Params, Request, Verb};
//! use serde_json::json;
//!
//! let signed_user = HandlerBuilder::new("SignedUser")
//!     .template("profile")
//!     .validate(Verb::Get, |req: &dyn Request, _args| {
//!         let token = req.value("access_token").ok_or_else(|| anyhow::anyhow!("no token"))?;
//!         Ok::<_, anyhow::Error>(Params::single(json!({"name": token})))
//!     });
//!
//! let friends = signed_user
//!     .clone()
//!     .name("SignedUserFriends")
//!     .route("/me/friends")
//!     .get(|_ctx, params: Params| Ok::<_, anyhow::Error>(json!({"user": params.into_value(), "friends": []})))
//!     .build()
//!     .unwrap();
//!
//! assert!(friends.implements(Verb::Get));
//! assert!(friends.has_validator(Verb::Get));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use restview_render::{RenderFn, RendererRegistry, TemplateEngine};
use serde::Serialize;
use serde_json::Value;

use crate::context::DispatchContext;
use crate::error::ConfigurationError;
use crate::hooks::Hooks;
use crate::params::Params;
use crate::request::{PathArgs, Request};
use crate::verb::{Verb, VerbSet};

/// Output format used when the request does not ask for one.
pub const DEFAULT_FORMAT: &str = "html";

/// Form field that lets a `POST` stand in for another verb.
pub const DEFAULT_METHOD_OVERRIDE_FIELD: &str = "__method__";

/// A verb method: business logic producing the result object.
pub type VerbFn =
    Arc<dyn Fn(&DispatchContext<'_>, Params) -> Result<Value, anyhow::Error> + Send + Sync>;

/// A validator: turns the request and path arguments into the parameter set.
pub type ValidateFn =
    Arc<dyn Fn(&dyn Request, &PathArgs) -> Result<Params, anyhow::Error> + Send + Sync>;

/// Types a verb method may return.
///
/// Any `Result<T, E>` with a serializable `T` works; the value becomes the
/// result object handed to the renderer.
pub trait IntoResultObject {
    /// Converts into the result object, or the method's error.
    fn into_result_object(self) -> Result<Value, anyhow::Error>;
}

impl<T, E> IntoResultObject for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_result_object(self) -> Result<Value, anyhow::Error> {
        let value = self.map_err(Into::into)?;
        Ok(serde_json::to_value(value)?)
    }
}

/// Assembles a [`HandlerDefinition`].
#[derive(Clone)]
pub struct HandlerBuilder {
    name: String,
    route: Option<String>,
    template_name: Option<String>,
    default_format: String,
    method_override_field: Option<String>,
    methods: BTreeMap<Verb, VerbFn>,
    validators: BTreeMap<Verb, ValidateFn>,
    renderers: HashMap<String, RenderFn>,
    renderer_defaults: Arc<RendererRegistry>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
    hooks: Hooks,
}

impl HandlerBuilder {
    /// Starts a handler called `name`, the endpoint name used at registration.
    ///
    /// Renderer defaults start as [`RendererRegistry::builtin`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: None,
            template_name: None,
            default_format: DEFAULT_FORMAT.to_string(),
            method_override_field: Some(DEFAULT_METHOD_OVERRIDE_FIELD.to_string()),
            methods: BTreeMap::new(),
            validators: BTreeMap::new(),
            renderers: HashMap::new(),
            renderer_defaults: RendererRegistry::builtin(),
            template_engine: None,
            hooks: Hooks::new(),
        }
    }

    /// Renames the handler; derived handlers need their own endpoint name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the route pattern this handler binds to. Required.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Names the template used when no renderer matches the format.
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    /// Sets the format used when the request does not ask for one.
    pub fn default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = format.into();
        self
    }

    /// Sets the form field a `POST` may use to override its method.
    pub fn method_override(mut self, field: impl Into<String>) -> Self {
        self.method_override_field = Some(field.into());
        self
    }

    /// Disables the method override; `POST` is always `POST`.
    pub fn no_method_override(mut self) -> Self {
        self.method_override_field = None;
        self
    }

    /// Fills the method slot for `verb`.
    pub fn method<F, R>(mut self, verb: Verb, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.methods
            .insert(verb, Arc::new(move |ctx, params| f(ctx, params).into_result_object()));
        self
    }

    /// Implements GET.
    pub fn get<F, R>(self, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.method(Verb::Get, f)
    }

    /// Implements POST.
    pub fn post<F, R>(self, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.method(Verb::Post, f)
    }

    /// Implements PUT.
    pub fn put<F, R>(self, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.method(Verb::Put, f)
    }

    /// Implements DELETE.
    pub fn delete<F, R>(self, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.method(Verb::Delete, f)
    }

    /// Implements HEAD.
    pub fn head<F, R>(self, f: F) -> Self
    where
        F: Fn(&DispatchContext<'_>, Params) -> R + Send + Sync + 'static,
        R: IntoResultObject,
    {
        self.method(Verb::Head, f)
    }

    /// Removes the method slot for `verb`, dropping the capability.
    pub fn without(mut self, verb: Verb) -> Self {
        self.methods.remove(&verb);
        self
    }

    /// Sets the validator run before the `verb` method.
    ///
    /// Its [`Params`] replace the path arguments as the method's input. Its
    /// error is returned to the caller unchanged.
    pub fn validate<F, E>(mut self, verb: Verb, f: F) -> Self
    where
        F: Fn(&dyn Request, &PathArgs) -> Result<Params, E> + Send + Sync + 'static,
        E: Into<anyhow::Error>,
    {
        self.validators
            .insert(verb, Arc::new(move |req, args| f(req, args).map_err(Into::into)));
        self
    }

    /// Adds a handler-local renderer, shadowing any default for `format`.
    pub fn renderer(mut self, format: impl Into<String>, render: RenderFn) -> Self {
        self.renderers.insert(format.into(), render);
        self
    }

    /// Replaces the shared renderer defaults the local renderers layer over.
    pub fn renderer_defaults(mut self, defaults: Arc<RendererRegistry>) -> Self {
        self.renderer_defaults = defaults;
        self
    }

    /// Sets a handler-local template engine, shadowing the defaults' engine.
    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.template_engine = Some(engine);
        self
    }

    /// Appends setup/teardown hooks.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = self.hooks.extend(hooks);
        self
    }

    /// Freezes the definition and derives its capability set.
    pub fn build(self) -> Result<HandlerDefinition, ConfigurationError> {
        let route = self
            .route
            .clone()
            .ok_or_else(|| ConfigurationError::MissingRoute(self.name.clone()))?;

        let capabilities: VerbSet = self.methods.keys().copied().collect();
        if capabilities.is_empty() {
            tracing::warn!(handler = %self.name, route = %route, "handler implements no verbs");
        }

        let mut renderers = RendererRegistry::layered(Arc::clone(&self.renderer_defaults));
        for (format, render) in &self.renderers {
            renderers.insert(format.clone(), Arc::clone(render));
        }
        if let Some(engine) = &self.template_engine {
            renderers = renderers.with_template_engine(Arc::clone(engine));
        }

        tracing::debug!(
            handler = %self.name,
            route = %route,
            verbs = %capabilities,
            "handler defined"
        );

        Ok(HandlerDefinition {
            route,
            capabilities,
            renderers,
            builder: self,
        })
    }
}

impl fmt::Debug for HandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBuilder")
            .field("name", &self.name)
            .field("route", &self.route)
            .field("template_name", &self.template_name)
            .field("default_format", &self.default_format)
            .field("method_override_field", &self.method_override_field)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// An immutable handler: route, capabilities, slots and render configuration.
pub struct HandlerDefinition {
    route: String,
    capabilities: VerbSet,
    renderers: RendererRegistry,
    builder: HandlerBuilder,
}

impl HandlerDefinition {
    /// The endpoint name.
    pub fn name(&self) -> &str {
        &self.builder.name
    }

    /// The route pattern.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The template name, if the handler renders through templates.
    pub fn template_name(&self) -> Option<&str> {
        self.builder.template_name.as_deref()
    }

    /// The format used when the request does not ask for one.
    pub fn default_format(&self) -> &str {
        &self.builder.default_format
    }

    /// The form field that overrides a `POST`, if enabled.
    pub fn method_override_field(&self) -> Option<&str> {
        self.builder.method_override_field.as_deref()
    }

    /// The verbs this handler implements.
    pub fn capabilities(&self) -> VerbSet {
        self.capabilities
    }

    /// Returns `true` if the method slot for `verb` is filled.
    pub fn implements(&self, verb: Verb) -> bool {
        self.capabilities.contains(verb)
    }

    /// Returns `true` if a validator is registered for `verb`.
    pub fn has_validator(&self, verb: Verb) -> bool {
        self.builder.validators.contains_key(&verb)
    }

    /// The handler's renderer registry (local layer over the defaults).
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    /// Reopens the definition as a builder, to derive another handler.
    pub fn to_builder(&self) -> HandlerBuilder {
        self.builder.clone()
    }

    pub(crate) fn method_for(&self, verb: Verb) -> Option<&VerbFn> {
        self.builder.methods.get(&verb)
    }

    pub(crate) fn validator_for(&self, verb: Verb) -> Option<&ValidateFn> {
        self.builder.validators.get(&verb)
    }

    pub(crate) fn hooks(&self) -> &Hooks {
        &self.builder.hooks
    }
}

impl fmt::Debug for HandlerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDefinition")
            .field("name", &self.builder.name)
            .field("route", &self.route)
            .field("capabilities", &self.capabilities)
            .field("template_name", &self.builder.template_name)
            .field("default_format", &self.builder.default_format)
            .field("renderers", &self.renderers)
            .finish_non_exhaustive()
    }
}
