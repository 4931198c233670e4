//! OAuth 2.0 sign-in flow: starting authorization and validating the callback.

mod authorization;
mod callback;
mod pkce;

pub use authorization::AuthorizationRequest;
pub use callback::{CallbackParams, ValidatedCallback, CODE_VERIFIER_COOKIE, STATE_COOKIE};
pub use pkce::{PkceChallenge, PkceVerifier, CHALLENGE_METHOD};
