//! Controller for the "Sign in with Google" flow.
//!
//! Both endpoints are reached through browser redirects, so neither requires an
//! existing session.

use crate::{AppState, Error};

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use domain::oauth::{AuthorizationRequest, CallbackParams, CODE_VERIFIER_COOKIE, STATE_COOKIE};
use domain::sign_in;
use domain::user::AuthSession;
use log::*;
use serde::Deserialize;

/// How long a started sign-in may take before its state cookies expire.
const AUTHORIZATION_COOKIE_MAX_AGE_MINUTES: i64 = 10;

/// Query parameters Google appends to the callback redirect.
///
/// Both are optional here so that a missing parameter is reported through the
/// same validation path as a missing cookie.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// GET /auth/google
///
/// Starts a sign-in: stores a fresh CSRF state and PKCE verifier in short-lived
/// cookies and redirects the browser to Google's consent screen.
#[utoipa::path(
    get,
    path = "/auth/google",
    responses(
        (status = 303, description = "Redirect to Google's authorization endpoint, setting the state and PKCE verifier cookies"),
    )
)]
pub async fn authorize(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let request = AuthorizationRequest::new(app_state.oauth_provider.as_ref());
    let secure = app_state.config.session_cookie_secure;

    debug!("Starting Google sign-in, redirecting to authorization endpoint");

    let jar = jar
        .add(authorization_cookie(STATE_COOKIE, request.state, secure))
        .add(authorization_cookie(
            CODE_VERIFIER_COOKIE,
            request.pkce_verifier,
            secure,
        ));

    (jar, Redirect::to(&request.url))
}

/// GET /auth/google/callback
///
/// Completes a sign-in: validates the returned state against the stored one,
/// exchanges the code, resolves (or creates) the user and issues a session.
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(
        ("code" = String, Query, description = "Authorization code from Google"),
        ("state" = String, Query, description = "CSRF state issued by /auth/google"),
    ),
    responses(
        (status = 302, description = "Signed in; redirect to / with the session cookie set"),
        (status = 400, description = "Missing or mismatched state, missing parameters, or a code Google rejected"),
        (status = 500, description = "Token exchange, profile fetch, database or session failure"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    mut auth_session: AuthSession,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, Error> {
    let callback = CallbackParams {
        code: query.code,
        state: query.state,
        stored_state: jar.get(STATE_COOKIE).map(|c| c.value().to_string()),
        code_verifier: jar.get(CODE_VERIFIER_COOKIE).map(|c| c.value().to_string()),
    }
    .validate()?;

    let user = sign_in::sign_in(
        app_state.db_conn_ref(),
        app_state.oauth_provider.as_ref(),
        callback,
    )
    .await?;

    if let Err(login_error) = auth_session.login(&user).await {
        return Err(Error::from(DomainError {
            source: Some(Box::new(login_error)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Session login failed".to_string(),
            )),
        }));
    }

    // The state and verifier are single use.
    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/"))
        .remove(Cookie::build(CODE_VERIFIER_COOKIE).path("/"));

    Ok((StatusCode::FOUND, jar, [(header::LOCATION, "/")]))
}

fn authorization_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::minutes(AUTHORIZATION_COOKIE_MAX_AGE_MINUTES))
        .build()
}
