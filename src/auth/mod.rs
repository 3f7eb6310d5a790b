//! Admin authentication.
//!
//! A single admin credential guards the refresh and settings routes. A
//! successful login yields an opaque bearer token backed by a
//! [`Session`](crate::session::Session) with an absolute expiry.

mod admin;
mod config;
mod error;
pub mod extractors;
pub mod password;
pub mod token;

pub use admin::{ADMIN_ACTOR, AdminAuthenticator};
pub use config::AdminConfig;
pub use error::AuthError;
pub use extractors::{AdminSession, BearerToken};
pub use password::{AdminCredential, PasswordConfig, PasswordHasher};
pub use token::{TokenExtractor, generate_session_token};
