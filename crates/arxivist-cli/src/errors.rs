//! Error types for the arxivist CLI application.
//!
//! Most failures come from the library or from user interaction and are wrapped transparently so
//! their original message reaches the user.

use thiserror::Error;

/// Errors that can occur during CLI operations.
#[derive(Error, Debug)]
pub enum ArxivistCliError {
  /// Errors from user interaction dialogs
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Errors from the underlying arxivist library
  #[error(transparent)]
  Arxivist(#[from] arxivist::errors::ArxivistError),

  /// File system and IO operation errors
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// Glob pattern matching errors
  #[error(transparent)]
  Glob(#[from] glob::PatternError),

  /// A view could not be loaded; the message has already been shown
  #[error("{0}")]
  Failed(String),

  /// The command line was understood but cannot be carried out
  #[error("{0}")]
  Usage(String),
}
