use crate::app::AppContext;
use crate::auth::token::TokenExtractor;
use crate::error::DashboardError;
use crate::session::Session;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::future::Future;

/// Axum extractor for routes that require an admin session
///
/// The request is rejected with 401 unless it carries
/// `Authorization: Bearer <token>` for a live session.
///
/// ```rust,ignore
/// async fn refresh(AdminSession(session): AdminSession, ...) -> ...
/// ```
pub struct AdminSession(pub Session);

impl FromRequestParts<AppContext> for AdminSession {
    type Rejection = DashboardError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth = state.auth.clone();
        let token = TokenExtractor::from_header(parts);

        async move {
            let token = token?;
            let session = auth.validate(&token).await?;
            Ok(AdminSession(session))
        }
    }
}

/// The raw bearer token, whether or not it names a live session.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = DashboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TokenExtractor::from_header(parts).map(BearerToken)
    }
}
