use axum::{Router, routing::get};

pub mod adjustments;
pub mod alerts;
pub mod inventory;
pub mod movements;
pub mod predictions;
pub mod products;
pub mod reports;
pub mod suppliers;
pub mod system;
pub mod transfers;
pub mod users;
pub mod warehouses;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/suppliers", suppliers::router())
        .nest("/warehouses", warehouses::router())
        .nest("/inventory", inventory::router())
        .nest("/movements", movements::router())
        .nest("/transfers", transfers::router())
        .nest("/adjustments", adjustments::router())
        .nest("/reports", reports::router())
        .nest("/predictions", predictions::router())
        .nest("/alerts", alerts::router())
        .nest("/users", users::router())
}
