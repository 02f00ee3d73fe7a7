//! # restview - Inheritable REST handlers
//!
//! `restview` lets one handler type serve a route for several HTTP verbs. A
//! handler supplies a business method per verb and, optionally, a validator
//! per verb; the dispatch pipeline picks the verb (honouring a `POST` method
//! override), validates the request, runs the method and renders its result
//! in the format the client asked for.
//!
//! ## Crates
//!
//! - [`restview_dispatch`]: verbs, handlers, hooks, the pipeline, registration
//! - [`restview_render`]: renderer registry, structured serializers, templates
//!
//! This crate re-exports both and adds [`Settings`] and [`Site`].
//!
//! ## Quick Start
//!
//! ```rust
//! use restview::prelude::*;
//! use serde_json::json;
//!
//! let base = HandlerBuilder::new("User")
//!     .validate(Verb::Get, |_req: &dyn Request, args: &PathArgs| {
//!         let id = args.get("id").and_then(|v| v.as_u64()).ok_or_else(|| anyhow::anyhow!("user not found"))?;
//!         Ok::<_, anyhow::Error>(Params::single(json!({"id": id, "name": "ada"})))
//!     });
//!
//! let profile = base
//!     .clone()
//!     .name("Profile")
//!     .route("/users/<id>")
//!     .get(|_ctx, params: Params| Ok::<_, anyhow::Error>(params.into_value()))
//!     .build()
//!     .unwrap();
//!
//! let mut args = PathArgs::new();
//! args.insert("id".into(), json!(7));
//! let output = profile
//!     .dispatch(&IncomingRequest::get().with_query("format", "json"), args)
//!     .unwrap();
//! assert!(output.body().unwrap().contains("\"name\": \"ada\""));
//! ```

mod settings;
mod site;

pub use settings::{Settings, SettingsError};
pub use site::{Site, SiteBuilder};

pub use restview_dispatch;
pub use restview_render;

pub use restview_dispatch::{
    add_handlers, ConfigurationError, DispatchContext, DispatchError, Extensions, HandlerBuilder,
    HandlerDefinition, Hooks, IncomingRequest, Output, Params, PathArgs, Registration, Request,
    RouteRegistrar, Stage, Verb, VerbSet,
};

pub use restview_render::{
    from_fn, structured, MiniJinjaEngine, RenderError, RenderFn, Renderer, RendererRegistry,
    StructuredFormat, TemplateEngine,
};

/// Everything a handler module usually needs.
pub mod prelude {
    pub use crate::{
        from_fn, DispatchError, HandlerBuilder, HandlerDefinition, Hooks, IncomingRequest, Output,
        Params, PathArgs, Registration, Request, Settings, Site, Verb,
    };
}
