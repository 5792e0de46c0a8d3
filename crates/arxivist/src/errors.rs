//! Error types for the arxivist library.
//!
//! Every fallible operation in the library returns [`ArxivistError`]. The variants follow the
//! failure taxonomy of a client that mostly talks to remote services:
//! - Transport failures and non-success HTTP statuses
//! - Response bodies that cannot be understood
//! - Authentication problems (see [`AuthFailure`])
//! - Local storage and configuration problems
//!
//! "No data yet" is deliberately not represented here. A user without preferences, an empty
//! search or an empty bookmark list are all successful outcomes.
//!
//! # Examples
//!
//! ```no_run
//! use arxivist::{clients::ArxivClient, errors::ArxivistError};
//!
//! # async fn example() -> Result<(), ArxivistError> {
//! match ArxivClient::new().fetch_paper("2301.07041").await {
//!   Err(ArxivistError::NotFound) => println!("No such paper"),
//!   Err(ArxivistError::Network(e)) => println!("Network error: {}", e),
//!   Err(e) => println!("Other error: {}", e),
//!   Ok(paper) => println!("Found {}", paper.title),
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::AuthFailure;

/// Errors that can occur when working with the arxivist library.
#[derive(Error, Debug)]
pub enum ArxivistError {
  /// The provided paper identifier doesn't look like an arXiv identifier.
  #[error("Invalid identifier format")]
  InvalidIdentifier,

  /// A network request failed before a response was received.
  ///
  /// This covers unreachable hosts, TLS failures and client-side timeouts.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A remote service answered with a non-success status code.
  #[error("{url} responded with {status}")]
  Status {
    /// The status code returned by the service
    status: StatusCode,
    /// The URL that was requested
    url:    String,
  },

  /// A response body could not be parsed into the expected shape.
  #[error("Malformed response: {0}")]
  MalformedResponse(String),

  /// A remote service reported an error inside an otherwise successful response.
  ///
  /// arXiv, for example, reports invalid queries as a feed with a single error entry.
  #[error("API error: {0}")]
  ApiError(String),

  /// An authenticated endpoint was called without valid credentials.
  #[error(transparent)]
  Auth(#[from] AuthFailure),

  /// The requested paper couldn't be found.
  #[error("Paper not found")]
  NotFound,

  /// Failed to parse a URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// JSON (de)serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// The configuration file could not be read or is invalid.
  #[error("Configuration error: {0}")]
  Config(String),
}

impl ArxivistError {
  /// Whether this error was caused by missing or rejected credentials.
  ///
  /// Callers use this to send the user back through sign-in instead of showing a retry button.
  pub fn is_auth_error(&self) -> bool { matches!(self, ArxivistError::Auth(_)) }

  /// Builds the error for a non-success response.
  pub(crate) fn from_status(status: StatusCode, url: impl Into<String>) -> Self {
    ArxivistError::Status { status, url: url.into() }
  }

  /// Like [`from_status`](Self::from_status), but for services that authenticate the caller:
  /// 401 and 403 mean the token was rejected.
  pub(crate) fn from_auth_status(status: StatusCode, url: impl Into<String>) -> Self {
    match status {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN =>
        ArxivistError::Auth(AuthFailure::InvalidAccount),
      status => Self::from_status(status, url),
    }
  }
}
