//! HTTP adapter: route modules and response wrappers.
//!
//! Handlers only translate between HTTP and the core services on
//! [`AppContext`](crate::AppContext).

mod admin;
mod public;
pub mod response;
pub mod routes;

pub use admin::{AdminRoutes, AdminStatus, LoginResponse};
pub use public::{DataStatus, PublicRoutes, PublicStatus};
pub use response::{AcceptedResponse, ApiResponse};
pub use routes::RouteModule;
