use axum::Router;
use crate::app::AppContext;

/// A group of routes that share a concern.
///
/// Modules return a router that still needs [`AppContext`]; the state is
/// applied once by [`App`](crate::App) after every module is merged.
pub trait RouteModule {
    fn routes(&self) -> Router<AppContext>;

    /// Optional path prefix for every route in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Add this module's routes to `router`.
    fn register(self, router: Router<AppContext>) -> Router<AppContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}
