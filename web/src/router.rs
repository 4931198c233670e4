use crate::AppState;
use axum::{routing::get, Router};

use crate::controller::{health_check_controller, oauth_controller, user_session_controller};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Google Sign-In API"
        ),
        paths(
            health_check_controller::health_check,
            oauth_controller::authorize,
            oauth_controller::callback,
            user_session_controller::read,
            user_session_controller::delete,
        ),
        components(
            schemas(
                domain::users::Model,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "google_signin", description = "Sign in with Google and cookie based sessions")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from a successful Google sign-in via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(oauth_routes(app_state))
        .merge(user_session_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

/// Routes for the Google sign-in flow. Neither requires a session: the browser
/// arrives at both through redirects.
fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/google", get(oauth_controller::authorize))
        .route("/auth/google/callback", get(oauth_controller::callback))
        .with_state(app_state)
}

fn user_session_routes() -> Router {
    Router::new().route(
        "/user_sessions",
        get(user_session_controller::read).delete(user_session_controller::delete),
    )
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod router_tests {
    use crate::test_support::test_app;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn user_sessions_requires_a_session() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user_sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_session_cookie_is_unauthorized() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user_sessions")
                    .header("cookie", "id=not-a-real-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_without_a_session_succeeds() {
        let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/user_sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
