/// Authentication failures.
///
/// `InvalidCredentials` and `NotAuthenticated` are client errors (401); the
/// other variants mean the server itself is misconfigured or broken.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Admin credential error: {0}")]
    Credential(String),

    #[error("Session store error: {0}")]
    Store(String),
}
