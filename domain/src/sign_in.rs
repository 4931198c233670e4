//! The Google sign-in sequence run by the OAuth callback.

use crate::error::Error;
use crate::gateway::google_oauth::OAuthProvider;
use crate::oauth::ValidatedCallback;
use crate::{user, users};
use log::*;
use sea_orm::ConnectionTrait;

/// Exchanges the callback's code (with its PKCE verifier), fetches the Google profile
/// and resolves the user it belongs to, creating one on first sign-in.
///
/// Nothing is written to the database unless both provider calls succeed.
pub async fn sign_in(
    db: &impl ConnectionTrait,
    provider: &dyn OAuthProvider,
    callback: ValidatedCallback,
) -> Result<users::Model, Error> {
    let tokens = provider
        .exchange_code(&callback.code, &callback.code_verifier)
        .await
        .inspect_err(|e| warn!("Failed to exchange Google authorization code: {e:?}"))?;

    let user_info = provider
        .get_user_info(&tokens.access_token)
        .await
        .inspect_err(|e| warn!("Failed to get Google user info: {e:?}"))?;

    let user = user::find_or_create_from_google(db, &user_info).await?;
    info!("Google account {} signed in as user {}", user.google_id, user.id);

    Ok(user)
}
