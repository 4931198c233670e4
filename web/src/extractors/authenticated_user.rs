use crate::extractors::SessionRejection;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::user::AuthSession;
use domain::users;
use log::*;
use tower_sessions::Session;

pub(crate) struct AuthenticatedUser(pub users::Model);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    // Wraps axum_login's AuthSession extractor and yields the signed-in user, or 401.
    // Saving the session on each authenticated request pushes out its inactivity expiry.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg.to_string()))?;

        let user = match session.user {
            Some(user) => user,
            None => return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        };

        if let Ok(tower_session) = Session::from_request_parts(parts, state).await {
            if let Err(e) = tower_session.save().await {
                warn!("Failed to touch session for activity renewal: {e:?}");
            } else {
                trace!("Session touched successfully for activity renewal");
            }
        }

        Ok(AuthenticatedUser(user))
    }
}
