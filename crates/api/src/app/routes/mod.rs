use axum::{Router, routing::post};

pub mod banking;
pub mod customers;
pub mod expenses;
pub mod inventory;
pub mod invoices;
pub mod ledger;
pub mod products;
pub mod system;

/// Router for every business endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/system/backup", post(system::backup))
        .nest("/customers", customers::router().merge(ledger::router()))
        .nest("/categories", products::categories_router())
        .nest("/products", products::router())
        .nest("/stock", inventory::router())
        .nest("/invoices", invoices::router())
        .nest("/banks", banking::banks_router())
        .nest("/accounts", banking::accounts_router())
        .nest("/expense-categories", expenses::categories_router())
        .nest("/expenses", expenses::router())
        .nest("/reports", expenses::reports_router())
}
