use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use shopbooks_core::CustomerId;
use shopbooks_parties::{CustomerDetails, CustomerUpdate};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CustomerDetails>,
) -> ApiResult {
    let customer = services.office.create_customer(body).await?;
    Ok((StatusCode::CREATED, Json(dto::customer_to_json(&customer))).into_response())
}

pub async fn list_customers(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .customers()
        .await?
        .iter()
        .map(dto::customer_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CustomerId = dto::parse_id(&id)?;
    let customer = services.office.customer(id).await?;
    Ok((StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response())
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<CustomerUpdate>,
) -> ApiResult {
    let id: CustomerId = dto::parse_id(&id)?;
    let customer = services.office.update_customer(id, body).await?;
    Ok((StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response())
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CustomerId = dto::parse_id(&id)?;
    services.office.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
