use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;

use shopbooks_core::{InvoiceId, InvoiceItemId};
use shopbooks_invoicing::{InvoiceItemUpdate, NewInstallment, NewInvoice, NewInvoiceLine};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_invoice).get(list_invoices))
        .route("/:id", get(get_invoice).delete(delete_invoice))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", patch(update_item).delete(remove_item))
        .route("/:id/installments", post(add_installment).get(list_installments))
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewInvoice>,
) -> ApiResult {
    let detail = services.office.create_invoice(body).await?;
    Ok((StatusCode::CREATED, Json(dto::invoice_detail_to_json(&detail))).into_response())
}

pub async fn list_invoices(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .invoices()
        .await?
        .iter()
        .map(dto::invoice_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let detail = services.office.invoice(id).await?;
    Ok((StatusCode::OK, Json(dto::invoice_detail_to_json(&detail))).into_response())
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    services.office.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NewInvoiceLine>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let detail = services.office.add_invoice_item(id, body).await?;
    Ok((StatusCode::CREATED, Json(dto::invoice_detail_to_json(&detail))).into_response())
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<InvoiceItemUpdate>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let item_id: InvoiceItemId = dto::parse_id(&item_id)?;
    let detail = services.office.update_invoice_item(id, item_id, body).await?;
    Ok((StatusCode::OK, Json(dto::invoice_detail_to_json(&detail))).into_response())
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let item_id: InvoiceItemId = dto::parse_id(&item_id)?;
    let detail = services.office.remove_invoice_item(id, item_id).await?;
    Ok((StatusCode::OK, Json(dto::invoice_detail_to_json(&detail))).into_response())
}

pub async fn add_installment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NewInstallment>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let (installment, invoice) = services.office.add_installment(id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "installment": dto::installment_to_json(&installment),
            "invoice": dto::invoice_to_json(&invoice),
        })),
    )
        .into_response())
}

pub async fn list_installments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: InvoiceId = dto::parse_id(&id)?;
    let items = services
        .office
        .installments(id)
        .await?
        .iter()
        .map(dto::installment_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}
