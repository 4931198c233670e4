//! Google OAuth client.
//!
//! Builds the consent URL, exchanges authorization codes (with PKCE) for tokens and
//! fetches the signed-in account's profile from the userinfo endpoint.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::oauth::CHALLENGE_METHOD;
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;
use std::time::Duration;

const SCOPES: &str = "openid email profile";

/// OAuth token response from Google
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile of the signed-in Google account.
///
/// `sub` and `email` are required; a payload without them is rejected as an invalid
/// response. `name` and `picture` may be withheld by the account's privacy settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(rename = "sub")]
    pub google_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// RFC 6749 section 5.2 error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Request to exchange authorization code for tokens
#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// Configuration for Google OAuth URLs
#[derive(Debug, Clone)]
pub struct GoogleOAuthUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// The calls the sign-in flow makes against an OAuth provider. Handlers receive an
/// `Arc<dyn OAuthProvider>` so tests can substitute a scripted provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent URL carrying the CSRF state and the S256 PKCE challenge.
    fn authorization_url(&self, state: &str, pkce_challenge: &str) -> String;

    /// Exchange an authorization code for tokens. A rejection by the provider is
    /// reported as `ExternalErrorKind::OAuth`.
    async fn exchange_code(&self, code: &str, pkce_verifier: &str)
        -> Result<TokenResponse, Error>;

    /// Fetch the profile of the account the access token was issued for.
    async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error>;
}

/// Google OAuth client backed by `reqwest`
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    urls: GoogleOAuthUrls,
}

impl GoogleOAuthClient {
    /// Create a new Google OAuth client with configurable URLs
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        urls: GoogleOAuthUrls,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            urls,
        })
    }

    /// Create a client from the Google settings in `Config`. Fails with a `Config`
    /// error when the client id, secret or redirect URI is not set.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client_id = config
            .google_client_id()
            .ok_or_else(|| Error::config("GOOGLE_CLIENT_ID is not set"))?;
        let client_secret = config
            .google_client_secret()
            .ok_or_else(|| Error::config("GOOGLE_CLIENT_SECRET is not set"))?;
        let redirect_uri = config
            .google_redirect_uri()
            .ok_or_else(|| Error::config("GOOGLE_REDIRECT_URI is not set"))?;

        Self::new(
            &client_id,
            &client_secret,
            &redirect_uri,
            GoogleOAuthUrls {
                auth_url: config.google_auth_url().to_string(),
                token_url: config.google_token_url().to_string(),
                userinfo_url: config.google_userinfo_url().to_string(),
            },
            Duration::from_secs(config.google_http_timeout_secs),
        )
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str, pkce_challenge: &str) -> String {
        format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            state={}&\
            code_challenge={}&\
            code_challenge_method={}",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
            urlencoding::encode(pkce_challenge),
            CHALLENGE_METHOD,
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code,
            code_verifier: pkce_verifier,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            grant_type: "authorization_code",
        };

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to exchange Google OAuth code: {:?}", e);
                Error::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            let tokens: TokenResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse Google token response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Google OAuth".to_string(),
                    )),
                }
            })?;
            info!("Successfully exchanged Google OAuth code for tokens");
            return Ok(tokens);
        }

        let error_text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<OAuthErrorResponse>(&error_text) {
            Ok(oauth_error) if status.is_client_error() => {
                warn!(
                    "Google rejected the authorization code: {} ({})",
                    oauth_error.error,
                    oauth_error.error_description.as_deref().unwrap_or("no description")
                );
                Err(Error {
                    source: Some(error_text.into()),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::OAuth(
                        oauth_error.error,
                    )),
                })
            }
            _ => {
                warn!("Google OAuth error ({status}): {error_text}");
                Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                        "Token endpoint returned {status}"
                    ))),
                })
            }
        }
    }

    async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error> {
        let response = self
            .client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to get Google user info: {:?}", e);
                Error::from(e)
            })?;

        if response.status().is_success() {
            let user_info: GoogleUserInfo = response.json().await.map_err(|e| {
                warn!("Failed to parse Google user info: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Google".to_string(),
                    )),
                }
            })?;
            Ok(user_info)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google user info error ({status}): {error_text}");
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "Userinfo endpoint returned {status}"
                ))),
            })
        }
    }
}
