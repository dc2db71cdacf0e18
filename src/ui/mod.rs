//! Web form UI.
//!
//! One HTML page with a tab per store operation. Forms post to the routes
//! below; each handler makes one [`ChunkStore`] call and renders the page
//! again with the result or the error.
//!
//! | Route | Store call |
//! |-------|------------|
//! | `GET /` | none (`?tab=` picks the tab) |
//! | `POST /insert` | [`ChunkStore::insert_chunk`] |
//! | `POST /delete` | [`ChunkStore::delete`] |
//! | `POST /search` | [`ChunkStore::search_dense`] |
//! | `POST /search/text` | [`ChunkStore::search_by_text`] |
//! | `POST /list` | [`ChunkStore::list_all`] |
//! | `POST /list/files` | [`ChunkStore::list_by_filename`] |
//! | `POST /drop-table` | [`ChunkStore::drop_table`] |
//! | `POST /drop-workspace` | [`ChunkStore::drop_workspace`] |
//! | `POST /recreate` | [`ChunkStore::ensure_table`], [`ChunkStore::ensure_index`] |
//! | `GET /metrics` | none (Prometheus exposition) |
//! | `GET /health` | none |

mod error;
mod handlers;
mod page;

pub use error::{UiError, status_for_error};
pub use page::{Outcome, Tab, escape, render};

use crate::services::ChunkStore;
use crate::storage::SqliteEngine;
use crate::{Error, Result};
use axum::Router;
use axum::http::header;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Page title.
pub const PAGE_TITLE: &str = "chunkbase";

/// Shared state of the UI.
#[derive(Clone)]
pub struct AppState {
    /// The store every handler calls.
    pub store: Arc<ChunkStore<SqliteEngine>>,
    /// Prometheus handle when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates UI state without metrics.
    #[must_use]
    pub const fn new(store: Arc<ChunkStore<SqliteEngine>>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Serves `handle` at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

/// Builds the router with security headers and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/insert", post(handlers::insert))
        .route("/delete", post(handlers::delete))
        .route("/search", post(handlers::search))
        .route("/search/text", post(handlers::search_text))
        .route("/list", post(handlers::list))
        .route("/list/files", post(handlers::list_files))
        .route("/drop-table", post(handlers::drop_table))
        .route("/drop-workspace", post(handlers::drop_workspace))
        .route("/recreate", post(handlers::recreate))
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'",
            ),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the UI until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| Error::operation("bind", format!("{host}:{port}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| Error::operation("local_addr", e))?;
    tracing::info!(%addr, "Serving form UI");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::operation("serve", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down form UI");
}
