//! Cross-origin access for the dashboard page.

mod config;
mod layer;

pub use config::CorsConfig;
pub use layer::build_cors_layer;
