//! HTTP surface for the course catalog.
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET | `/api/courses?q=&category=` | all courses, optionally filtered |
//! | POST | `/api/courses` | create a course |
//! | GET / PUT | `/api/courses/:id` | one course / edit its metadata |
//! | POST | `/api/courses/:id/chapters` | create a chapter |
//! | GET | `/api/categories` | distinct categories |
//! | GET / HEAD | `/<mount>/:course/:chapter/:file` | stream a lecture file |

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod error;
pub mod routes;
pub mod state;

use crate::config::ResolvedConfig;
use crate::library::Catalog;
use routes::{
    create_chapter, create_course, get_course, list_categories, list_courses, serve_media,
    update_course,
};
pub use state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let media_route = format!("/{}/:course/:chapter/:file", state.scan_options.mount);

    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/:id", get(get_course).put(update_course))
        .route("/api/courses/:id/chapters", post(create_chapter))
        .route("/api/categories", get(list_categories))
        .route(&media_route, get(serve_media))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: ResolvedConfig) -> Result<()> {
    let state = AppState::new(config);

    info!("Content root: {}", state.content_root().display());
    match Catalog::build(state.content_root(), &state.scan_options).await {
        Ok(catalog) => info!("Found {} courses", catalog.len()),
        Err(e) => warn!("Initial catalog scan failed: {}", e),
    }

    let address = state.config.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
