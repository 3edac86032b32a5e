//! Course generation HTTP API (Axum)
//!
//! - `GET /` - welcome message
//! - `POST /generate-course` - run the workflow for a [`CourseRequest`]
//!
//! Each generation runs in its own task. The workflow itself never fails, so
//! a 500 only happens when that task panics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::course::{CourseOutline, CourseRequest};
use crate::workflow::CourseWorkflow;

pub const WELCOME_MESSAGE: &str = "Welcome to the Course Generation API!";

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<CourseWorkflow>,
}

/// Build the API router around one long-lived workflow.
pub fn router(workflow: Arc<CourseWorkflow>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/generate-course", post(generate_course))
        .with_state(AppState { workflow })
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, workflow: Arc<CourseWorkflow>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, workflow, shutdown_signal()).await
}

/// Serve the API on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    workflow: Arc<CourseWorkflow>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Starting course generation API");

    axum::serve(listener, router(workflow))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Course generation API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

// =============================================================================
// HANDLERS
// =============================================================================
async fn welcome() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

async fn generate_course(
    State(state): State<AppState>,
    Json(request): Json<CourseRequest>,
) -> Result<Json<CourseOutline>, ApiError> {
    let workflow = state.workflow.clone();
    let task = tokio::spawn(async move { workflow.generate(&request).await });

    match task.await {
        Ok(outline) => Ok(Json(outline)),
        Err(e) => {
            error!(error = %e, "Course generation task failed");
            Err(ApiError {
                detail: e.to_string(),
            })
        }
    }
}

/// Error body returned as `{"detail": ...}` with status 500.
#[derive(Debug)]
pub struct ApiError {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.detail })),
        )
            .into_response()
    }
}
