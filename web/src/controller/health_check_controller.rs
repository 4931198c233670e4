use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness probe for load balancers; needs neither a session nor the database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is accepting requests", body = String),
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
