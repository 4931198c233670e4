use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::user::AuthSession;
use log::*;

/// Returns the user the current session belongs to.
///
/// Pass the session cookie issued by the Google sign-in callback, e.g.:
/// curl -v --header "Cookie: id=07bbbe54-bd35-425f-8e63-618a8d8612df" --request GET http://localhost:4000/user_sessions
#[utoipa::path(
    get,
    path = "/user_sessions",
    responses(
        (status = 200, description = "The signed-in user", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    debug!("Session belongs to user {}", user.id);

    Json(ApiResponse::new(StatusCode::OK.into(), user))
}

/// Logs the user out of the platform by destroying their session.
/// Test this with curl: curl -v \
/// --header "Cookie: id=07bbbe54-bd35-425f-8e63-618a8d8612df" \
/// --request DELETE http://localhost:4000/user_sessions
#[utoipa::path(
    delete,
    path = "/user_sessions",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 500, description = "Session store failure"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(mut auth_session: AuthSession) -> impl IntoResponse {
    trace!("UserSessionController::delete()");
    match auth_session.logout().await {
        Ok(_) => Json(ApiResponse::<()>::no_content(StatusCode::OK.into())).into_response(),
        Err(e) => {
            error!("Failed to log out session: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
