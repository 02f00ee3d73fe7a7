//! Binding handlers to an application's routing table.
//!
//! The pipeline does not route. A [`RouteRegistrar`] is whatever owns the URL
//! map (an HTTP framework's router, or a plain `Vec` in tests); each handler
//! hands it a [`Registration`] naming the route, the endpoint and the verbs it
//! accepts.

use std::fmt;
use std::sync::Arc;

use crate::handler::HandlerDefinition;
use crate::verb::VerbSet;

/// One route binding.
#[derive(Clone)]
pub struct Registration {
    /// The route pattern.
    pub route: String,
    /// The endpoint name, the handler's name.
    pub name: String,
    /// The handler serving the route.
    pub endpoint: Arc<HandlerDefinition>,
    /// The verbs the router should accept for the route.
    pub allowed_verbs: VerbSet,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("route", &self.route)
            .field("name", &self.name)
            .field("allowed_verbs", &self.allowed_verbs)
            .finish_non_exhaustive()
    }
}

impl HandlerDefinition {
    /// The route binding for this handler.
    pub fn registration(self: &Arc<Self>) -> Registration {
        Registration {
            route: self.route().to_string(),
            name: self.name().to_string(),
            endpoint: Arc::clone(self),
            allowed_verbs: self.capabilities(),
        }
    }
}

/// Receives route bindings.
pub trait RouteRegistrar {
    /// Error raised when a binding is refused (e.g. a duplicate endpoint).
    type Error;

    /// Binds one route.
    fn register(&mut self, registration: Registration) -> Result<(), Self::Error>;
}

impl RouteRegistrar for Vec<Registration> {
    type Error = std::convert::Infallible;

    fn register(&mut self, registration: Registration) -> Result<(), Self::Error> {
        self.push(registration);
        Ok(())
    }
}

/// Registers every handler with `registrar`, in order.
///
/// Stops at the first refused binding.
///
/// ```rust
/// use restview_dispatch::{add_handlers, HandlerBuilder, Params, Registration};
/// use std::sync::Arc;
///
/// let index = Arc::new(
///     HandlerBuilder::new("Index")
///         .route("/")
///         .get(|_ctx, _p: Params| Ok::<_, anyhow::Error>("hello"))
///         .build()
///         .unwrap(),
/// );
///
/// let mut routes: Vec<Registration> = Vec::new();
/// add_handlers(&mut routes, [index]).unwrap();
/// assert_eq!(routes[0].route, "/");
/// assert_eq!(routes[0].allowed_verbs.names(), vec!["GET"]);
/// ```
pub fn add_handlers<R, I>(registrar: &mut R, handlers: I) -> Result<(), R::Error>
where
    R: RouteRegistrar + ?Sized,
    I: IntoIterator<Item = Arc<HandlerDefinition>>,
{
    for handler in handlers {
        let registration = handler.registration();
        tracing::debug!(
            endpoint = %registration.name,
            route = %registration.route,
            verbs = %registration.allowed_verbs,
            "registering handler"
        );
        registrar.register(registration)?;
    }
    Ok(())
}
