//! Bank registers and bank accounts.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use shopbooks_accounting::{NewBank, NewBankAccount, NewBankDetail, NewBankTransaction};
use shopbooks_core::money::format_money;
use shopbooks_core::{BankAccountId, BankId};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn banks_router() -> Router {
    Router::new()
        .route("/", post(create_bank).get(list_banks))
        .route("/:id/details", post(add_bank_detail).get(list_bank_details))
}

pub fn accounts_router() -> Router {
    Router::new()
        .route("/", post(create_account).get(list_accounts))
        .route("/:id", get(get_account))
        .route("/:id/transactions", post(record_transaction).get(list_transactions))
        .route("/:id/recompute", post(recompute_balance))
}

pub async fn create_bank(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewBank>,
) -> ApiResult {
    let bank = services.office.create_bank(body).await?;
    Ok((StatusCode::CREATED, Json(dto::bank_to_json(&bank))).into_response())
}

pub async fn list_banks(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .banks()
        .await?
        .iter()
        .map(dto::bank_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn add_bank_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NewBankDetail>,
) -> ApiResult {
    let id: BankId = dto::parse_id(&id)?;
    let detail = services.office.add_bank_detail(id, body).await?;
    Ok((StatusCode::CREATED, Json(dto::bank_detail_to_json(&detail))).into_response())
}

/// Register rows plus the derived balance (Σ credit − Σ debit).
pub async fn list_bank_details(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: BankId = dto::parse_id(&id)?;
    let details = services.office.bank_details(id).await?;
    let balance = shopbooks_accounting::bank_balance(&details);
    let items = details.iter().map(dto::bank_detail_to_json).collect::<Vec<_>>();
    Ok((
        StatusCode::OK,
        Json(json!({ "items": items, "balance": format_money(balance) })),
    )
        .into_response())
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewBankAccount>,
) -> ApiResult {
    let account = services.office.create_bank_account(body).await?;
    Ok((StatusCode::CREATED, Json(dto::account_to_json(&account))).into_response())
}

pub async fn list_accounts(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .bank_accounts()
        .await?
        .iter()
        .map(dto::account_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: BankAccountId = dto::parse_id(&id)?;
    let account = services.office.bank_account(id).await?;
    Ok((StatusCode::OK, Json(dto::account_to_json(&account))).into_response())
}

pub async fn record_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NewBankTransaction>,
) -> ApiResult {
    let id: BankAccountId = dto::parse_id(&id)?;
    let (transaction, balance) = services.office.record_bank_transaction(id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "transaction": dto::bank_transaction_to_json(&transaction),
            "current_balance": format_money(balance),
        })),
    )
        .into_response())
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: BankAccountId = dto::parse_id(&id)?;
    let items = services
        .office
        .bank_transactions(id)
        .await?
        .iter()
        .map(dto::bank_transaction_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn recompute_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: BankAccountId = dto::parse_id(&id)?;
    let account = services.office.recompute_account_balance(id).await?;
    Ok((StatusCode::OK, Json(dto::account_to_json(&account))).into_response())
}
