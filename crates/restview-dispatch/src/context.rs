//! Per-request dispatch state.
//!
//! A [`DispatchContext`] is created when a request enters the pipeline and
//! dropped once the output is produced. It carries the request, the path
//! arguments, the resolved verb and format, the current [`Stage`] and a typed
//! [`Extensions`] map where setup hooks park per-request resources.
//!
//! # Extensions
//!
//! Setup hooks acquire resources and insert them; verb methods read them;
//! teardown hooks take them back out:
//!
//! ```rust
//! use restview_dispatch::{HandlerBuilder, Hooks, IncomingRequest, Params};
//! use std::time::Instant;
//!
//! struct Started(Instant);
//!
//! let hooks = Hooks::new()
//!     .on_enter(|ctx| {
//!         ctx.extensions.insert(Started(Instant::now()));
//!         Ok(())
//!     })
//!     .on_exit(|ctx, _failure| {
//!         let started = ctx.extensions.remove::<Started>();
//!         assert!(started.is_some());
//!     });
//!
//! let handler = HandlerBuilder::new("Timed")
//!     .route("/timed")
//!     .hooks(hooks)
//!     .get(|ctx, _params: Params| {
//!         let started = ctx.extensions.get_required::<Started>()?;
//!         Ok::<_, anyhow::Error>(started.0.elapsed().as_secs() < 60)
//!     })
//!     .build()
//!     .unwrap();
//!
//! handler.dispatch(&IncomingRequest::get(), Default::default()).unwrap();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::request::{PathArgs, Request};
use crate::verb::Verb;

/// Type-safe container for per-request resources.
///
/// One value per type. Use `Arc<T>` inside the extension to share state that
/// outlives the request.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Creates a new empty extensions container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, val: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(val))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Gets a reference to the value of type `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Gets a mutable reference to the value of type `T`.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Gets the value of type `T`, or an error naming the missing type.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "Extension missing: type {} not found in context",
                std::any::type_name::<T>()
            )
        })
    }

    /// Removes the value of type `T`, returning it if it existed.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Where a dispatch currently is.
///
/// ```text
/// Start → VerbResolved → Validated → Invoked → Rendered → Done
///   └──────────┴────────────┴───────────┴──────────┴──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    VerbResolved,
    Validated,
    Invoked,
    Rendered,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::VerbResolved => "verb-resolved",
            Stage::Validated => "validated",
            Stage::Invoked => "invoked",
            Stage::Rendered => "rendered",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Ephemeral state for one request travelling through the pipeline.
pub struct DispatchContext<'r> {
    request: &'r dyn Request,
    path_args: &'r PathArgs,
    handler: &'r str,
    verb: Option<Verb>,
    format: String,
    stage: Stage,
    /// Per-request resources, filled by setup hooks.
    pub extensions: Extensions,
}

impl<'r> DispatchContext<'r> {
    /// Creates a context in the [`Stage::Start`] state.
    pub fn new(
        handler: &'r str,
        request: &'r dyn Request,
        path_args: &'r PathArgs,
        format: String,
    ) -> Self {
        Self {
            request,
            path_args,
            handler,
            verb: None,
            format,
            stage: Stage::Start,
            extensions: Extensions::new(),
        }
    }

    /// The incoming request.
    pub fn request(&self) -> &'r dyn Request {
        self.request
    }

    /// Keyword arguments extracted from the route.
    pub fn path_args(&self) -> &'r PathArgs {
        self.path_args
    }

    /// Name of the handler serving this request.
    pub fn handler(&self) -> &'r str {
        self.handler
    }

    /// The effective verb, once resolved.
    pub fn verb(&self) -> Option<Verb> {
        self.verb
    }

    /// The output format: the requested one, or the handler's default.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The current pipeline stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn set_verb(&mut self, verb: Verb) {
        self.verb = Some(verb);
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        tracing::trace!(handler = self.handler, from = %self.stage, to = %stage, "stage");
        self.stage = stage;
    }
}

impl fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("handler", &self.handler)
            .field("method", &self.request.method())
            .field("verb", &self.verb)
            .field("format", &self.format)
            .field("stage", &self.stage)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}
