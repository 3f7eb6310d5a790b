use crate::{
    app::AppContext,
    cors::build_cors_layer,
    health,
    http::{AdminRoutes, PublicRoutes, RouteModule},
    middleware::MakeRequestUuid,
    schedule::spawn_session_purge,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The dashboard service: routes, middleware and background tasks around an
/// [`AppContext`].
pub struct App {
    router: Router<AppContext>,
    context: AppContext,
}

impl App {
    /// Mount the admin, public and health routes.
    pub fn new(context: AppContext) -> Self {
        let router = Router::<AppContext>::new().route("/health", get(health::health_handler));
        let router = AdminRoutes.register(router);
        let router = PublicRoutes.register(router);
        Self { router, context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// The fully layered router with state applied.
    ///
    /// Tests drive this with [`testing`](crate::testing) scenarios.
    pub fn router(&self) -> Router {
        self.layered().with_state(self.context.clone())
    }

    fn layered(&self) -> Router<AppContext> {
        let config = &self.context.config;
        let mut router = self.router.clone();

        // Innermost first: body limit, CORS, request id, trace.
        router = router.layer(DefaultBodyLimit::max(config.server.max_body_size));

        if let Some(cors_layer) = build_cors_layer(&config.cors) {
            router = router.layer(cors_layer);
        }

        // Set runs before Propagate reads the header.
        router = router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        router.layer(TraceLayer::new_for_http())
    }

    /// Serve until Ctrl+C or SIGTERM.
    ///
    /// Starts the auto-refresh scheduler and the session purge; both are
    /// stopped before this returns.
    pub async fn serve(self) -> anyhow::Result<()> {
        let config = self.context.config.clone();
        let addr = config.server.addr()?;

        let scheduler = self.context.scheduler.clone();
        scheduler.start().await;
        let purge = spawn_session_purge(
            self.context.auth.as_ref().clone(),
            config.schedule.session_purge_interval(),
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Server starting on http://{}", addr);
        tracing::info!("Health check available at http://{}/health", addr);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        scheduler.shutdown().await;
        purge.stop().await;
        tracing::info!("Shutdown complete");

        result.map_err(Into::into)
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
}
