//! Clients for the remote services the library talks to.
//!
//! Each submodule wraps one service:
//! - [`arxiv`] - the arXiv Atom query API
//! - [`comments`] - the comments and votes backend
//! - [`assistant`] - the AI backend that reads a PDF and answers a prompt
//! - [`citation`] - Crossref, for citation metadata of published versions
//!
//! All clients are cheap to clone and share a single [`reqwest::Client`] when built through
//! [`Clients::new`], which is what [`Config::clients`](crate::config::Config::clients) does.

pub mod arxiv;
pub mod assistant;
pub mod citation;
pub mod comments;

pub use arxiv::ArxivClient;
pub use assistant::AssistantClient;
pub use citation::CitationClient;
pub use comments::CommentsClient;

use super::*;
use crate::{aggregator::PreferenceAggregator, auth::Credentials};

/// Anything that can answer an arXiv search.
///
/// [`ArxivClient`] is the real implementation; the aggregator is generic over this trait so it
/// can be driven by canned results.
#[async_trait]
pub trait PaperSource: Send + Sync {
  /// Runs `query` and returns the matching papers.
  async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Paper>, ArxivistError>;
}

/// Base URLs for every remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
  /// arXiv query endpoint
  pub arxiv:     String,
  /// Comments backend root
  pub comments:  String,
  /// AI backend endpoint
  pub assistant: String,
  /// Crossref API root
  pub crossref:  String,
}

/// The full set of service clients, built once at start-up and passed to whoever needs them.
#[derive(Debug, Clone)]
pub struct Clients {
  /// arXiv client
  pub arxiv:     ArxivClient,
  /// Comments backend client
  pub comments:  CommentsClient,
  /// AI backend client
  pub assistant: AssistantClient,
  /// Crossref client
  pub citation:  CitationClient,
}

impl Clients {
  /// Builds every client on top of one shared HTTP client.
  pub fn new(http: reqwest::Client, endpoints: &Endpoints, credentials: Credentials) -> Self {
    Self {
      arxiv:     ArxivClient::with_client(http.clone(), &endpoints.arxiv),
      comments:  CommentsClient::with_client(http.clone(), &endpoints.comments, credentials),
      assistant: AssistantClient::with_client(http.clone(), &endpoints.assistant),
      citation:  CitationClient::with_client(http, &endpoints.crossref),
    }
  }

  /// A preference aggregator reading topics from `store` and papers from arXiv.
  pub fn aggregator<'a, S: PreferenceStore>(
    &'a self,
    store: &'a S,
    per_category: usize,
  ) -> PreferenceAggregator<'a, S, ArxivClient> {
    PreferenceAggregator::new(store, &self.arxiv).per_category(per_category)
  }
}

/// Turns a non-success response into an error, passing successful ones through.
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ArxivistError> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    Err(ArxivistError::from_status(status, response.url().as_str()))
  }
}

/// [`check_status`] for authenticated requests, where 401 and 403 are auth failures.
pub(crate) fn check_auth_status(
  response: reqwest::Response,
) -> Result<reqwest::Response, ArxivistError> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    Err(ArxivistError::from_auth_status(status, response.url().as_str()))
  }
}
