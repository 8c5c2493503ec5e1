//! Web layer: axum router and server loop.
//!
//! Routes:
//! - `GET /` landing page with the assessment form
//! - `POST /predict` urlencoded or multipart form submission, JSON result
//! - `GET /api/info` loaded model snapshot
//! - `/static/*` files from the configured static directory
//!
//! Unknown paths get the HTML 404 page and handler panics the HTML 500 page.

mod handlers;
mod pages;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::application::ScoringService;
use crate::config::ServiceConfig;

/// Shared handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub scoring: Arc<ScoringService>,
}

impl AppState {
    #[must_use]
    pub fn new(scoring: ScoringService) -> Self {
        Self {
            scoring: Arc::new(scoring),
        }
    }
}

fn routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .route("/api/info", get(handlers::api_info))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
}

fn with_layers(router: Router<AppState>) -> Router<AppState> {
    router
        .layer(CatchPanicLayer::custom(handlers::internal_error))
        .layer(TraceLayer::new_for_http())
}

/// Build the application router.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    with_layers(routes(static_dir)).with_state(state)
}

/// Bind and serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(config: &ServiceConfig, scoring: ScoringService) -> crate::Result<()> {
    if !config.static_dir.exists() {
        tracing::warn!(
            "Static directory {:?} does not exist; /static will return 404",
            config.static_dir
        );
    }

    let app = router(AppState::new(scoring), &config.static_dir);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down...");
}
