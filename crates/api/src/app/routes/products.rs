use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use shopbooks_core::ProductId;
use shopbooks_products::{CategoryDetails, ProductDetails, ProductUpdate};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/stock", get(available_stock))
        .route("/:id/reconcile", post(reconcile_stock))
}

pub fn categories_router() -> Router {
    Router::new().route("/", post(create_category).get(list_categories))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CategoryDetails>,
) -> ApiResult {
    let category = services.office.create_category(body).await?;
    Ok((StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response())
}

pub async fn list_categories(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .categories()
        .await?
        .iter()
        .map(dto::category_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProductDetails>,
) -> ApiResult {
    let product = services.office.create_product(body).await?;
    Ok((StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response())
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .products()
        .await?
        .iter()
        .map(dto::product_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = dto::parse_id(&id)?;
    let product = services.office.product(id).await?;
    Ok((StatusCode::OK, Json(dto::product_to_json(&product))).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> ApiResult {
    let id: ProductId = dto::parse_id(&id)?;
    let product = services.office.update_product(id, body).await?;
    Ok((StatusCode::OK, Json(dto::product_to_json(&product))).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = dto::parse_id(&id)?;
    services.office.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Stock derived from movement history, next to the cached counter.
pub async fn available_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = dto::parse_id(&id)?;
    let level = services.office.available_stock(id).await?;
    let product = services.office.product(id).await?;
    Ok((StatusCode::OK, Json(dto::stock_level_to_json(&product, &level))).into_response())
}

pub async fn reconcile_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = dto::parse_id(&id)?;
    let report = services.office.reconcile_stock(id).await?;
    Ok((StatusCode::OK, Json(dto::reconciliation_to_json(&report))).into_response())
}
