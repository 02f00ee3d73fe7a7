//! The dispatch pipeline.
//!
//! ```text
//! request + path args
//!   → setup hooks
//!   → verb resolution      (method override, capability check)
//!   → validation           (validator for the verb, else path args)
//!   → verb method          (result object)
//!   → rendering            (registered renderer, template, or raw)
//!   → teardown hooks
//! Output or DispatchError
//! ```
//!
//! Every failure is returned as-is; teardown hooks observe it before the
//! caller does.

use restview_render::Renderer;
use serde_json::Value;

use crate::context::{DispatchContext, Stage};
use crate::error::DispatchError;
use crate::handler::HandlerDefinition;
use crate::params::Params;
use crate::request::{PathArgs, Request};
use crate::verb::Verb;

/// Request value naming the output format.
pub const FORMAT_FIELD: &str = "format";

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A renderer applied.
    Rendered { format: String, body: String },
    /// No renderer matched; the result object is passed through.
    Raw(Value),
}

impl Output {
    /// The rendered body, if a renderer applied.
    pub fn body(&self) -> Option<&str> {
        match self {
            Output::Rendered { body, .. } => Some(body),
            Output::Raw(_) => None,
        }
    }

    /// The format, if a renderer applied.
    pub fn format(&self) -> Option<&str> {
        match self {
            Output::Rendered { format, .. } => Some(format),
            Output::Raw(_) => None,
        }
    }

    /// The raw result object, if no renderer applied.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Output::Raw(value) => Some(value),
            Output::Rendered { .. } => None,
        }
    }
}

impl HandlerDefinition {
    /// The format the request asks for, else the handler's default.
    ///
    /// An empty `format` value counts as absent.
    pub fn requested_format(&self, request: &dyn Request) -> String {
        match request.value(FORMAT_FIELD) {
            Some(format) if !format.is_empty() => format.to_string(),
            _ => self.default_format().to_string(),
        }
    }

    /// Determines the effective verb of `request`.
    ///
    /// A `POST` carrying a non-empty override field is treated as the verb
    /// named there. The result must be a known verb the handler implements.
    pub fn resolve_verb(&self, request: &dyn Request) -> Result<Verb, DispatchError> {
        let mut method = request.method();
        if method.eq_ignore_ascii_case("POST") {
            if let Some(field) = self.method_override_field() {
                if let Some(overridden) = request.form(field).filter(|m| !m.is_empty()) {
                    method = overridden;
                }
            }
        }

        match method.parse::<Verb>() {
            Ok(verb) if self.implements(verb) => Ok(verb),
            _ => Err(DispatchError::MethodNotAllowed {
                verb: method.to_ascii_uppercase(),
                allowed: self.capabilities(),
            }),
        }
    }

    /// Picks the renderer for `request`, or `None` to pass the result through.
    pub fn resolve_renderer(&self, request: &dyn Request) -> Option<Renderer> {
        let format = self.requested_format(request);
        self.renderers().resolve(&format, self.template_name())
    }

    /// Serves one request.
    ///
    /// Setup hooks run first; if one fails the dispatch stops with
    /// [`DispatchError::Setup`] and only the teardown hooks bound to the setup
    /// hooks that succeeded run. Otherwise every teardown hook runs exactly
    /// once, after rendering, after the first failure, or while unwinding
    /// from a panic.
    pub fn dispatch(
        &self,
        request: &dyn Request,
        path_args: PathArgs,
    ) -> Result<Output, DispatchError> {
        let span = tracing::debug_span!("dispatch", handler = self.name(), route = self.route());
        let _guard = span.enter();

        let format = self.requested_format(request);
        let ctx = DispatchContext::new(self.name(), request, &path_args, format);
        let mut scope = self.hooks().scope(ctx);

        if let Err(e) = scope.enter() {
            scope.ctx().advance(Stage::Failed);
            tracing::debug!(error = %e, "setup hook refused request");
            let failure = DispatchError::Setup(e);
            scope.close(Some(&failure));
            return Err(failure);
        }

        let outcome = self.run_stages(scope.ctx());
        match &outcome {
            Ok(_) => scope.ctx().advance(Stage::Done),
            Err(e) => {
                scope.ctx().advance(Stage::Failed);
                if e.is_method_not_allowed() {
                    tracing::warn!(error = %e, allowed = %self.capabilities(), "method not allowed");
                } else {
                    tracing::debug!(error = %e, "dispatch failed");
                }
            }
        }

        scope.close(outcome.as_ref().err());
        outcome
    }

    fn run_stages(&self, ctx: &mut DispatchContext<'_>) -> Result<Output, DispatchError> {
        let request = ctx.request();

        let verb = self.resolve_verb(request)?;
        ctx.set_verb(verb);
        ctx.advance(Stage::VerbResolved);
        tracing::debug!(verb = %verb, format = ctx.format(), "resolved");

        let params = match self.validator_for(verb) {
            Some(validate) => {
                validate(request, ctx.path_args()).map_err(DispatchError::Validation)?
            }
            None => Params::Named(ctx.path_args().clone()),
        };
        ctx.advance(Stage::Validated);

        let method = self
            .method_for(verb)
            .ok_or_else(|| DispatchError::MethodNotAllowed {
                verb: verb.as_str().to_string(),
                allowed: self.capabilities(),
            })?;
        let result = method(&*ctx, params).map_err(DispatchError::Handler)?;
        ctx.advance(Stage::Invoked);

        let output = match self.renderers().resolve(ctx.format(), self.template_name()) {
            Some(renderer) => {
                let body = renderer.render(&result)?;
                Output::Rendered {
                    format: renderer.format().to_string(),
                    body,
                }
            }
            None => Output::Raw(result),
        };
        ctx.advance(Stage::Rendered);

        Ok(output)
    }
}
