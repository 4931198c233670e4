use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Validation => StatusCode::BAD_REQUEST,
                InternalErrorKind::Entity(EntityErrorKind::Unauthenticated) => {
                    StatusCode::UNAUTHORIZED
                }
                InternalErrorKind::Entity(_)
                | InternalErrorKind::Config
                | InternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::OAuth(_) => StatusCode::BAD_REQUEST,
                ExternalErrorKind::Network | ExternalErrorKind::Other(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

// Responses never carry error details; the full error tree only goes to the log.
// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let source = StdError::source(&self.0).map(|source| source.to_string());

        if status_code.is_server_error() {
            error!(
                "Request failed with {status_code}: {:?} (source: {source:?})",
                self.0.error_kind
            );
        } else {
            warn!(
                "Request rejected with {status_code}: {:?} (source: {source:?})",
                self.0.error_kind
            );
        }

        status_code.into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn web_error(error_kind: DomainErrorKind) -> Error {
        Error(DomainError {
            source: None,
            error_kind,
        })
    }

    #[test]
    fn client_correctable_errors_map_to_bad_request() {
        assert_eq!(
            Error::from(DomainError::validation("missing code")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            web_error(DomainErrorKind::External(ExternalErrorKind::OAuth(
                "invalid_grant".to_string()
            )))
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthenticated_maps_to_unauthorized() {
        assert_eq!(
            web_error(DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Unauthenticated
            )))
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn infrastructure_errors_map_to_internal_server_error() {
        for error_kind in [
            DomainErrorKind::External(ExternalErrorKind::Network),
            DomainErrorKind::External(ExternalErrorKind::Other("bad body".to_string())),
            DomainErrorKind::Internal(InternalErrorKind::Config),
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Other(
                "EntityErrorKind".to_string(),
            ))),
        ] {
            assert_eq!(
                web_error(error_kind).status_code(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[tokio::test]
    async fn response_body_is_empty() {
        let response = Error::from(DomainError::validation("OAuth state mismatch")).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
