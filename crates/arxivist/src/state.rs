//! What a screen showing remote data is currently displaying.

use super::*;

/// The four states of a view backed by a remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState<T> {
  /// The request is in flight
  #[default]
  Loading,
  /// The request succeeded with nothing to show
  Empty,
  /// The request succeeded with data
  Ready(T),
  /// The request failed; holds the message to show next to a retry action
  Failed(String),
}

/// Collections that can be empty.
pub trait Emptiness {
  /// Whether there is nothing to show.
  fn is_empty_view(&self) -> bool;
}

impl<T> Emptiness for Vec<T> {
  fn is_empty_view(&self) -> bool { self.is_empty() }
}

impl<T> Emptiness for [T] {
  fn is_empty_view(&self) -> bool { self.is_empty() }
}

impl<K, V> Emptiness for HashMap<K, V> {
  fn is_empty_view(&self) -> bool { self.is_empty() }
}

impl Emptiness for String {
  fn is_empty_view(&self) -> bool { self.trim().is_empty() }
}

impl<T: Emptiness> ViewState<T> {
  /// Settles a finished request.
  pub fn from_result(result: Result<T, ArxivistError>) -> Self {
    match result {
      Ok(value) if value.is_empty_view() => ViewState::Empty,
      Ok(value) => ViewState::Ready(value),
      Err(e) => {
        warn!("Request failed: {e}");
        ViewState::Failed(e.to_string())
      },
    }
  }
}

impl<T> ViewState<T> {
  /// The data, if the view has any.
  pub fn ready(&self) -> Option<&T> {
    match self {
      ViewState::Ready(value) => Some(value),
      _ => None,
    }
  }

  /// Whether the view should offer a retry.
  pub fn is_failed(&self) -> bool { matches!(self, ViewState::Failed(_)) }
}
