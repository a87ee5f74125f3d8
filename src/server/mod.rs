//! A thin HTTP control surface (health/readiness) wrapping the façade (C7).
//! Not part of the messaging contract itself — a demonstration harness for
//! running a `poker-service` process, in the teacher's `server::routes`
//! shape (an `Extension`-carried context, CORS, request logging).

mod error;
mod logging;

pub use error::ApiError;

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::facade::ServiceFacade;

const LOG_TARGET: &str = "server::http";

#[derive(Clone)]
struct ControlContext {
    facade: Arc<ServiceFacade>,
}

/// Builds the `poker-service` control router: `/healthz` always reports the
/// process is alive, `/readyz` reflects whether the façade's transport is
/// still running (i.e. hasn't been torn down by the shutdown coordinator).
pub fn build_router(facade: Arc<ServiceFacade>) -> Router {
    let context = ControlContext { facade };
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(Extension(context))
        .layer(middleware::from_fn(logging::log_requests))
        .layer(cors)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn readyz(Extension(ctx): Extension<ControlContext>) -> Result<Json<HealthResponse>, ApiError> {
    if ctx.facade.transport().is_running() {
        Ok(Json(HealthResponse { status: "ready" }))
    } else {
        tracing::warn!(target: LOG_TARGET, "readiness check failed: transport not running");
        Err(ApiError::internal("transport not running"))
    }
}
