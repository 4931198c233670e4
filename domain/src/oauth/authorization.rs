//! Starting a sign-in: the CSRF state and PKCE verifier the browser must hand back.

use rand::Rng;

use super::pkce::PkceVerifier;
use crate::gateway::google_oauth::OAuthProvider;

/// Everything needed to send the browser to Google and later validate its return.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// CSRF state parameter, echoed back by Google on the callback.
    pub state: String,
    /// PKCE verifier, kept by the browser until the code exchange.
    pub pkce_verifier: String,
}

impl AuthorizationRequest {
    /// Generates a fresh state and PKCE verifier and builds the provider's consent URL.
    pub fn new(provider: &dyn OAuthProvider) -> Self {
        let state = generate_state();
        let verifier = PkceVerifier::generate();
        let url = provider.authorization_url(&state, verifier.challenge().as_str());

        Self {
            url,
            state,
            pkce_verifier: verifier.into_string(),
        }
    }
}

/// 32 random bytes, hex encoded.
fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gateway::google_oauth::{GoogleUserInfo, TokenResponse};
    use crate::oauth::pkce::PkceChallenge;
    use async_trait::async_trait;

    struct UrlOnlyProvider;

    #[async_trait]
    impl OAuthProvider for UrlOnlyProvider {
        fn authorization_url(&self, state: &str, pkce_challenge: &str) -> String {
            format!("https://accounts.test/auth?state={state}&code_challenge={pkce_challenge}")
        }

        async fn exchange_code(&self, _: &str, _: &str) -> Result<TokenResponse, Error> {
            unreachable!("not used when starting authorization")
        }

        async fn get_user_info(&self, _: &str) -> Result<GoogleUserInfo, Error> {
            unreachable!("not used when starting authorization")
        }
    }

    #[test]
    fn new_request_binds_state_and_challenge_into_the_url() {
        let request = AuthorizationRequest::new(&UrlOnlyProvider);

        assert_eq!(request.state.len(), 64);
        let challenge =
            PkceChallenge::from_verifier(&PkceVerifier::from_string(request.pkce_verifier.clone()));
        assert_eq!(
            request.url,
            format!(
                "https://accounts.test/auth?state={}&code_challenge={}",
                request.state,
                challenge.as_str()
            )
        );
    }

    #[test]
    fn each_request_gets_a_distinct_state() {
        let first = AuthorizationRequest::new(&UrlOnlyProvider);
        let second = AuthorizationRequest::new(&UrlOnlyProvider);
        assert_ne!(first.state, second.state);
        assert_ne!(first.pkce_verifier, second.pkce_verifier);
    }
}
