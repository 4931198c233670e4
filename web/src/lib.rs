use axum_login::AuthManagerLayerBuilder;
use domain::gateway::google_oauth::OAuthProvider;
use domain::user::Backend;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions::cookie::SameSite;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

mod controller;
mod error;
mod extractors;
pub mod router;

pub use error::{Error, Result};

/// Web-level state: the infrastructure from `service` plus the Google OAuth gateway
/// the sign-in handlers call through.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
    pub oauth_provider: Arc<dyn OAuthProvider>,
}

impl AppState {
    pub fn new(service_state: service::AppState, oauth_provider: Arc<dyn OAuthProvider>) -> Self {
        Self {
            database_connection: service_state.database_connection,
            config: service_state.config,
            oauth_provider,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    info!("Connecting to DB with URI: {}", app_state.config.database_url());

    // Sessions live in the same Postgres database the users table does.
    let session_store =
        PostgresStore::new(app_state.db_conn_ref().get_postgres_connection_pool().clone());
    session_store
        .migrate()
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{host}:{}", app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, app(app_state, session_store)).await
}

/// Builds the complete application: every route, wrapped in the session and
/// authentication layers backed by `session_store`.
pub fn app<Store>(app_state: AppState, session_store: Store) -> axum::Router
where
    Store: SessionStore + Clone,
{
    let session_layer = session_layer(session_store, &app_state.config);

    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    router::define_routes(app_state).layer(auth_layer)
}

fn session_layer<Store>(session_store: Store, config: &Config) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(session_store)
        .with_secure(config.session_cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            config.session_expiry_seconds as i64,
        )))
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind};
    use domain::gateway::google_oauth::{GoogleUserInfo, TokenResponse};
    use domain::{users, Id};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tower_sessions::MemoryStore;

    pub(crate) const GOOGLE_ID: &str = "108234567890";
    pub(crate) const AUTH_CODE: &str = "4/0AX4XfWh-valid";

    /// Stands in for Google: accepts `AUTH_CODE` exactly once, like a real
    /// authorization server, and rejects anything else with `invalid_grant`.
    #[derive(Default)]
    pub(crate) struct FakeGoogle {
        redeemed: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl OAuthProvider for FakeGoogle {
        fn authorization_url(&self, state: &str, pkce_challenge: &str) -> String {
            format!(
                "https://accounts.google.test/o/oauth2/v2/auth?state={state}&code_challenge={pkce_challenge}"
            )
        }

        async fn exchange_code(
            &self,
            code: &str,
            _pkce_verifier: &str,
        ) -> core::result::Result<TokenResponse, DomainError> {
            let first_use = self
                .redeemed
                .lock()
                .map(|mut redeemed| redeemed.insert(code.to_string()))
                .unwrap_or(false);

            if code != AUTH_CODE || !first_use {
                return Err(DomainError {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::OAuth(
                        "invalid_grant".to_string(),
                    )),
                });
            }

            Ok(TokenResponse {
                access_token: "ya29.access-token".to_string(),
                expires_in: Some(3599),
                token_type: Some("Bearer".to_string()),
                scope: "openid email profile".to_string(),
                id_token: None,
            })
        }

        async fn get_user_info(
            &self,
            _access_token: &str,
        ) -> core::result::Result<GoogleUserInfo, DomainError> {
            Ok(GoogleUserInfo {
                google_id: GOOGLE_ID.to_string(),
                email: "ada@example.com".to_string(),
                name: Some("Ada Lovelace".to_string()),
                picture: None,
            })
        }
    }

    pub(crate) fn google_user() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            google_id: GOOGLE_ID.to_string(),
            name: Some("Ada Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            picture: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    pub(crate) fn test_app(db: DatabaseConnection) -> axum::Router {
        let config = Config::from_args(["google_signin"]);
        let db = Arc::new(db);
        let app_state = AppState::new(
            service::AppState::new(config, &db),
            Arc::new(FakeGoogle::default()),
        );

        app(app_state, MemoryStore::default())
    }
}
