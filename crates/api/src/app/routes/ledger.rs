//! Customer ledger routes, mounted under `/customers`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use shopbooks_core::{CustomerId, DomainError};

use crate::app::dto::{self, LedgerEntryRequest};
use crate::app::errors::{self, ApiResult};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/:id/ledger", get(get_ledger))
        .route("/:id/ledger/add", post(add_debit))
        .route("/:id/ledger/pay", post(add_credit))
}

pub async fn get_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CustomerId = dto::parse_id(&id)?;
    let ledger = services.office.customer_ledger(id).await?;
    Ok((StatusCode::OK, Json(dto::ledger_to_json(&ledger))).into_response())
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Debit,
    Credit,
}

/// Record an amount owed by the customer.
pub async fn add_debit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<LedgerEntryRequest>, JsonRejection>,
) -> Response {
    write_entry(services, id, body, Side::Debit).await
}

/// Record a payment received from the customer.
pub async fn add_credit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<LedgerEntryRequest>, JsonRejection>,
) -> Response {
    write_entry(services, id, body, Side::Credit).await
}

async fn write_entry(
    services: Arc<AppServices>,
    id: String,
    body: Result<Json<LedgerEntryRequest>, JsonRejection>,
    side: Side,
) -> Response {
    let customer: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::ledger_error_response(e.into()),
    };
    let entry = match body {
        Ok(Json(req)) => req.into_entry(),
        Err(rejection) => Err(DomainError::validation(rejection.body_text())),
    };
    let entry = match entry {
        Ok(v) => v,
        Err(e) => return errors::ledger_error_response(e.into()),
    };

    let written = match side {
        Side::Debit => services.office.add_debit(customer, entry).await,
        Side::Credit => services.office.add_credit(customer, entry).await,
    };
    match written {
        Ok((entry, totals)) => {
            (StatusCode::OK, Json(dto::ledger_write_to_json(&entry, &totals))).into_response()
        }
        Err(e) => errors::ledger_error_response(e),
    }
}
