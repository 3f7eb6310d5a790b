//! Admin session storage.
//!
//! Sessions are opaque bearer tokens with an absolute expiry. The store
//! itself only keeps and expires them; issuing and checking credentials is
//! done by [`crate::auth::AdminAuthenticator`].

mod in_memory;
mod store;

pub use in_memory::InMemorySessionStore;
pub use store::{Role, Session, SessionStore};
