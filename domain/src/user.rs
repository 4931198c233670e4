use crate::gateway::google_oauth::GoogleUserInfo;
use crate::{error::Error, users, Id};
use chrono::Utc;
use log::*;
use sea_orm::ConnectionTrait;

pub use entity_api::user::{AuthSession, Backend};

/// Resolves the user for a Google profile: the existing row for its `google_id`, or a
/// newly inserted one. Profile fields of existing users are left untouched.
pub async fn find_or_create_from_google(
    db: &impl ConnectionTrait,
    user_info: &GoogleUserInfo,
) -> Result<users::Model, Error> {
    if let Some(user) = entity_api::user::find_by_google_id(db, &user_info.google_id).await? {
        debug!(
            "Found existing user {} for Google account {}",
            user.id, user_info.google_id
        );
        return Ok(user);
    }

    let now = Utc::now();
    let user_model = users::Model {
        id: Id::nil(),
        google_id: user_info.google_id.clone(),
        name: user_info.name.clone(),
        email: user_info.email.clone(),
        picture: user_info.picture.clone(),
        created_at: now.into(),
        updated_at: now.into(),
    };

    let user = entity_api::user::create_if_absent(db, user_model).await?;
    info!(
        "Created user {} for Google account {}",
        user.id, user_info.google_id
    );

    Ok(user)
}
