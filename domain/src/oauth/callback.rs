//! Validation of the redirect Google sends back to `/auth/google/callback`.

use crate::error::Error;
use log::*;
use subtle::ConstantTimeEq;

/// Name of the cookie holding the CSRF state issued when sign-in started.
pub const STATE_COOKIE: &str = "google_oauth_state";
/// Name of the cookie holding the PKCE verifier issued when sign-in started.
pub const CODE_VERIFIER_COOKIE: &str = "google_oauth_code_verifier";

/// Raw callback inputs as they arrive: query parameters and the two sign-in cookies.
#[derive(Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub stored_state: Option<String>,
    pub code_verifier: Option<String>,
}

/// A callback whose state matched and which carries everything the code exchange needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCallback {
    pub code: String,
    pub code_verifier: String,
}

impl CallbackParams {
    /// Checks presence of all four inputs and that `state` equals the stored state.
    /// Empty strings count as absent. Performs no I/O.
    pub fn validate(self) -> Result<ValidatedCallback, Error> {
        let code = required(self.code, "code")?;
        let state = required(self.state, "state")?;
        let stored_state = required(self.stored_state, STATE_COOKIE)?;
        let code_verifier = required(self.code_verifier, CODE_VERIFIER_COOKIE)?;

        if !constant_time_eq(state.as_bytes(), stored_state.as_bytes()) {
            warn!("OAuth callback state does not match the stored state");
            return Err(Error::validation("OAuth state mismatch"));
        }

        Ok(ValidatedCallback {
            code,
            code_verifier,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            warn!("OAuth callback is missing {name}");
            Err(Error::validation(&format!("Missing {name}")))
        }
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};

    fn complete_params() -> CallbackParams {
        CallbackParams {
            code: Some("4/0AX4XfWh".to_string()),
            state: Some("b6f1c0".to_string()),
            stored_state: Some("b6f1c0".to_string()),
            code_verifier: Some("verifier".to_string()),
        }
    }

    fn assert_validation_error(result: Result<ValidatedCallback, Error>) {
        assert_eq!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation)
        );
    }

    #[test]
    fn complete_matching_params_validate() {
        let validated = complete_params().validate().unwrap();
        assert_eq!(
            validated,
            ValidatedCallback {
                code: "4/0AX4XfWh".to_string(),
                code_verifier: "verifier".to_string(),
            }
        );
    }

    #[test]
    fn each_missing_input_is_rejected() {
        assert_validation_error(
            CallbackParams {
                code: None,
                ..complete_params()
            }
            .validate(),
        );
        assert_validation_error(
            CallbackParams {
                state: None,
                ..complete_params()
            }
            .validate(),
        );
        assert_validation_error(
            CallbackParams {
                stored_state: None,
                ..complete_params()
            }
            .validate(),
        );
        assert_validation_error(
            CallbackParams {
                code_verifier: None,
                ..complete_params()
            }
            .validate(),
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        assert_validation_error(
            CallbackParams {
                code: Some(String::new()),
                ..complete_params()
            }
            .validate(),
        );
        // Two empty states would otherwise compare equal.
        assert_validation_error(
            CallbackParams {
                state: Some(String::new()),
                stored_state: Some(String::new()),
                ..complete_params()
            }
            .validate(),
        );
    }

    #[test]
    fn mismatched_state_is_rejected() {
        assert_validation_error(
            CallbackParams {
                state: Some("forged".to_string()),
                ..complete_params()
            }
            .validate(),
        );
    }

    #[test]
    fn state_of_different_length_is_rejected() {
        assert_validation_error(
            CallbackParams {
                state: Some("b6f1c0ff".to_string()),
                ..complete_params()
            }
            .validate(),
        );
    }

    #[test]
    fn constant_time_eq_compares_contents_and_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
