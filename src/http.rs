//! HTTP transport module for the study-guide service
//!
//! Serves the form page and its assets, plus the two JSON endpoints the page
//! calls: `/generate` and `/get_component_details`.

use std::time::Duration;

use axum::{
    Json, Router, async_trait,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::{Result, StudyGuideError};
use crate::guide::{ComponentRequest, GenerateRequest, GuideResponse};
use crate::page;
use crate::server::StudyGuideServer;

/// JSON body whose rejections are reported as `{"error": ..}` like every other failure
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = StudyGuideError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Bound each request; an expired request answers with the JSON error body
async fn request_timeout(State(timeout): State<Duration>, req: Request, next: Next) -> Response {
    let operation = format!("{} {}", req.method(), req.uri().path());
    match tokio::time::timeout(timeout, next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => StudyGuideError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }
        .into_response(),
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Form page with the configured default step count
pub async fn index_handler(State(server): State<StudyGuideServer>) -> impl IntoResponse {
    Html(page::render_index(server.config.guide.default_steps))
}

pub async fn app_js_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        page::APP_JS,
    )
}

pub async fn style_css_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        page::STYLE_CSS,
    )
}

pub async fn generate_handler(
    State(server): State<StudyGuideServer>,
    JsonBody(req): JsonBody<GenerateRequest>,
) -> Result<Json<GuideResponse>> {
    let markdown = server.generate_step(&req).await?;
    Ok(Json(GuideResponse::from_markdown(markdown)))
}

pub async fn component_details_handler(
    State(server): State<StudyGuideServer>,
    JsonBody(req): JsonBody<ComponentRequest>,
) -> Result<Json<GuideResponse>> {
    let markdown = server.explain(&req).await?;
    Ok(Json(GuideResponse::from_markdown(markdown)))
}

/// Router with every route and layer, ready to serve or to drive in tests
pub fn build_router(server: StudyGuideServer) -> Router {
    let timeout = Duration::from_millis(server.config.server.request_timeout_ms);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/static/app.js", get(app_js_handler))
        .route("/static/style.css", get(style_css_handler))
        .route("/generate", post(generate_handler))
        .route("/get_component_details", post(component_details_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(timeout, request_timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(server)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_http_server(server: StudyGuideServer) -> Result<()> {
    let bind = server.config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener on {}: {}", bind, e))?;

    tracing::info!(
        "Starting study guide server on http://{} (model={}, cache={})",
        bind,
        server.model.name(),
        server.store.path().display()
    );

    axum::serve(listener, build_router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
