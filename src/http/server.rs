//! HTTP Server
//!
//! Binds the listener, builds the router and serves until shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::error::{Result, StoreError};

use super::{handlers, AppState};

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::show_help))
        .route("/health", get(handlers::health))
        .route("/config/get", post(handlers::get_config))
        .route("/config/set", post(handlers::set_config))
        .route("/config/remove", post(handlers::remove_config))
        .route(
            "/config/getall",
            post(handlers::get_all_for_application).get(handlers::get_all_config),
        )
        .route("/applications/getall", get(handlers::get_all_applications))
        .route("/store/init", post(handlers::init_store))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .with_state(state)
}

/// HTTP server bound to a listening socket
pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Bind `addr` (host:port); port 0 picks a free port
    pub async fn bind(addr: &str, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StoreError::Server(format!("Failed to bind {}: {}", addr, e)))?;

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes, then drain in-flight requests
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "Listening for HTTP requests");

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| StoreError::Server(e.to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// CORS headers and preflight handling
async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let allowed = state.allow_origin(origin.as_deref());

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(value) = allowed.and_then(|o| HeaderValue::from_str(&o).ok()) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
    }

    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}
