use super::error::{EntityApiErrorKind, Error};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use chrono::Utc;

use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, DatabaseConnection, Set};
use serde::Deserialize;
use std::sync::Arc;

pub async fn find_by_google_id(
    db: &impl ConnectionTrait,
    google_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::GoogleId.eq(google_id))
        .one(db)
        .await?)
}

/// Inserts a new user for `user_model.google_id` unless one already exists, then
/// returns the stored row for that Google account.
///
/// The insert relies on the unique index over `google_id` with `ON CONFLICT DO NOTHING`,
/// so concurrent first sign-ins for the same account never produce two rows; every
/// caller gets back whichever row won the race. The `id` and timestamps on
/// `user_model` are ignored and generated here.
pub async fn create_if_absent(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {user_model:?}");

    let google_id = user_model.google_id.clone();
    let now = Utc::now();
    let user_active_model = ActiveModel {
        id: Set(Id::new_v4()),
        google_id: Set(user_model.google_id),
        name: Set(user_model.name),
        email: Set(user_model.email),
        picture: Set(user_model.picture),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    let rows_inserted = Entity::insert(user_active_model)
        .on_conflict(OnConflict::column(Column::GoogleId).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    if rows_inserted == 0 {
        info!("User for Google account {google_id} was created concurrently, using existing row");
    }

    find_by_google_id(db, &google_id).await?.ok_or(Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotInserted,
    })
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

/// Credentials for `AuthnBackend::authenticate`, which the trait requires. Sign-in
/// verifies the Google account itself and calls `AuthSession::login` directly.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub google_id: String,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self {
            // Arc is cloned, but the source DatabaseConnection refers to the same instance
            // as the one passed in to new() (see the Arc documentation for more info)
            db: Arc::clone(db),
        }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Model;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match find_by_google_id(self.db.as_ref(), &creds.google_id).await? {
            Some(user) => Ok(Some(user)),
            None => Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordUnauthenticated,
            }),
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(Entity::find_by_id(*user_id).one(self.db.as_ref()).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
