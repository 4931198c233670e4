pub(crate) mod authenticated_user;

use axum::http::StatusCode;

/// Status and message returned when the request carries no signed-in session.
type SessionRejection = (StatusCode, String);
