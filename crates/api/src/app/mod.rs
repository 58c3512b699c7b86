//! HTTP API application wiring (Axum router + shared state).
//!
//! - `services.rs`: state shared by every handler
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use shopbooks_infra::BackOffice;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(office: BackOffice, backup_dir: PathBuf) -> Router {
    let services = Arc::new(services::AppServices::new(office, backup_dir));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
