//! Authentication failures and the signed-in user's credentials.
//!
//! The identity provider itself is an external service. What the library sees of it is a
//! bearer token (carried in [`Credentials`]) and a numeric status code when sign-in fails,
//! which [`AuthFailure::from_status_code`] turns into one of a fixed set of user-readable causes.

use thiserror::Error;

use super::*;

/// The known reasons why signing in or calling an authenticated endpoint can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
  /// The user backed out of the sign-in flow.
  #[error("Sign-in was cancelled")]
  Cancelled,
  /// The identity provider could not be reached.
  #[error("Network error during sign-in, check your connection and try again")]
  Network,
  /// The account was rejected, or a token was refused by a backend.
  #[error("This account is not valid, sign in with a different account")]
  InvalidAccount,
  /// No credentials are available for an endpoint that needs them.
  #[error("You need to sign in first")]
  SignInRequired,
  /// The client is misconfigured for the identity provider.
  #[error("Sign-in is misconfigured, please report this to the developers")]
  Developer,
}

impl AuthFailure {
  /// Maps an identity provider status code to a failure cause.
  ///
  /// Codes that aren't in the known set are reported as [`AuthFailure::Developer`], since they
  /// almost always indicate a configuration problem rather than something the user can fix.
  pub fn from_status_code(code: i32) -> Self {
    match code {
      12501 => AuthFailure::Cancelled,
      7 => AuthFailure::Network,
      5 => AuthFailure::InvalidAccount,
      4 => AuthFailure::SignInRequired,
      _ => AuthFailure::Developer,
    }
  }
}

/// The identity of the current user as far as the backends are concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
  /// Stable user identifier, used as the key for preferences and bookmarks
  pub user_id:    String,
  /// Name shown next to the user's comments
  pub name:       Option<String>,
  /// Avatar shown next to the user's comments
  pub avatar_url: Option<String>,
  /// Bearer token for the comments backend
  pub token:      Option<String>,
}

impl Credentials {
  /// Returns the bearer token, or [`AuthFailure::SignInRequired`] if there is none.
  pub fn bearer(&self) -> Result<&str, AuthFailure> {
    self.token.as_deref().filter(|t| !t.trim().is_empty()).ok_or(AuthFailure::SignInRequired)
  }
}
