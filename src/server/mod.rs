//! HTTP server for a GitHub robot.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub, validates them, and hands them to the
//!   dispatcher
//! - Provides health checks for liveness probes
//! - Drains in-flight handlers on shutdown
//!
//! # Endpoints
//!
//! - `<hook path>` (default `/github-hook`) - Accepts GitHub webhook
//!   deliveries. Every method is routed here so that non-POST requests get
//!   the validator's 405.
//! - `GET /` and `GET /health` - Return 200 if the server is running

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::webhooks::WebhookValidator;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

/// Default route for webhook deliveries.
pub const DEFAULT_HOOK_PATH: &str = "/github-hook";

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    validator: WebhookValidator,
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(validator: WebhookValidator, dispatcher: Arc<Dispatcher>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                validator,
                dispatcher,
            }),
        }
    }

    pub fn validator(&self) -> &WebhookValidator {
        &self.inner.validator
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState, hook_path: &str) -> axum::Router {
    use axum::routing::{any, get};

    axum::Router::new()
        .route(hook_path, any(webhook_handler))
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

/// Serves until Ctrl-C, then waits for in-flight handlers to finish.
pub async fn serve(listener: TcpListener, app_state: AppState, hook_path: &str) -> anyhow::Result<()> {
    serve_until(
        listener,
        app_state,
        hook_path,
        shutdown_on(tokio::signal::ctrl_c()),
    )
    .await
}

/// Resolves when `signal` fires. If the signal handler could not be
/// installed, never resolves.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to install Ctrl-C handler, serving until killed");
        std::future::pending::<()>().await;
    }
}

/// Serves until `shutdown` resolves. New connections stop being accepted,
/// open requests complete, and then every dispatched handler is drained.
pub async fn serve_until(
    listener: TcpListener,
    app_state: AppState,
    hook_path: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let dispatcher = Arc::clone(app_state.dispatcher());
    let app = build_router(app_state, hook_path);

    if let Ok(addr) = listener.local_addr() {
        let handlers = dispatcher.handlers().kinds();
        info!(%addr, hook_path, ?handlers, "Listening for webhooks");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("webhook server exited unexpectedly")?;

    info!(in_flight = dispatcher.in_flight(), "Server stopped, draining handlers");
    dispatcher.wait().await;
    info!("All handlers finished");
    Ok(())
}
