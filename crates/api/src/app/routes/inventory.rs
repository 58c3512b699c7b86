//! Stock movement routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use shopbooks_core::ProductId;
use shopbooks_inventory::{NewStockIn, NewStockOut};

use crate::app::dto::{self, StockQuery};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/in", post(record_stock_in).get(list_stock_ins))
        .route("/out", post(record_stock_out).get(list_stock_outs))
}

fn product_filter(query: &StockQuery) -> Result<Option<ProductId>, ApiError> {
    query.product_id.as_deref().map(dto::parse_id).transpose()
}

pub async fn record_stock_in(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewStockIn>,
) -> ApiResult {
    let receipt = services.office.record_stock_in(body).await?;
    Ok((StatusCode::CREATED, Json(dto::stock_in_to_json(&receipt))).into_response())
}

pub async fn record_stock_out(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewStockOut>,
) -> ApiResult {
    let issue = services.office.record_stock_out(body).await?;
    Ok((StatusCode::CREATED, Json(dto::stock_out_to_json(&issue))).into_response())
}

pub async fn list_stock_ins(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<StockQuery>,
) -> ApiResult {
    let product = product_filter(&query)?;
    let items = services
        .office
        .stock_ins(product)
        .await?
        .iter()
        .map(dto::stock_in_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn list_stock_outs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<StockQuery>,
) -> ApiResult {
    let product = product_filter(&query)?;
    let items = services
        .office
        .stock_outs(product)
        .await?
        .iter()
        .map(dto::stock_out_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}
