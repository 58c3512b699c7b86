//! Expenses and period reports.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde_json::json;

use shopbooks_accounting::{NewExpense, NewExpenseCategory};

use crate::app::dto::{self, PeriodQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", post(create_expense).get(list_expenses))
}

pub fn categories_router() -> Router {
    Router::new().route("/", post(create_category).get(list_categories))
}

pub fn reports_router() -> Router {
    Router::new()
        .route("/summary", get(period_summary))
        .route("/monthly/:year/:month", get(monthly_report))
        .route("/daily/:date", get(daily_log))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewExpenseCategory>,
) -> ApiResult {
    let category = services.office.create_expense_category(body).await?;
    Ok((StatusCode::CREATED, Json(dto::expense_category_to_json(&category))).into_response())
}

pub async fn list_categories(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let items = services
        .office
        .expense_categories()
        .await?
        .iter()
        .map(dto::expense_category_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewExpense>,
) -> ApiResult {
    let expense = services.office.create_expense(body).await?;
    Ok((StatusCode::CREATED, Json(dto::expense_to_json(&expense))).into_response())
}

pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(range): Query<PeriodQuery>,
) -> ApiResult {
    let items = services
        .office
        .expenses(range.from, range.to)
        .await?
        .iter()
        .map(dto::expense_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(json!({ "items": items }))).into_response())
}

pub async fn period_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(range): Query<PeriodQuery>,
) -> ApiResult {
    let summary = services.office.period_summary(range.from, range.to).await?;
    Ok((StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response())
}

pub async fn monthly_report(
    Extension(services): Extension<Arc<AppServices>>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult {
    let summary = services.office.monthly_report(year, month).await?;
    Ok((StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response())
}

pub async fn daily_log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(date): Path<NaiveDate>,
) -> ApiResult {
    let summary = services.office.daily_log(date).await?;
    Ok((StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response())
}
