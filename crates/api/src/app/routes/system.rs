use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Copy the primary data file into the configured backup directory.
pub async fn backup(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let path = services.office.backup(&services.backup_dir).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "backend": services.office.backend_name(),
            "path": path.display().to_string(),
        })),
    )
        .into_response())
}
