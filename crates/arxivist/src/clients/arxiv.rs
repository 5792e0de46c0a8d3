//! Client implementation for querying arXiv.org.
//!
//! This module talks to arXiv's Atom API (`http://export.arxiv.org/api/query`). Two kinds of
//! request are supported: a search described by a [`SearchQuery`], and a direct lookup through
//! `id_list`. Responses are parsed by [`feed::parse_feed`](crate::feed::parse_feed).
//!
//! The client never retries. A failed request surfaces as a single [`ArxivistError`] and it is up
//! to the caller to offer a retry.
//!
//! # Examples
//!
//! ```no_run
//! use arxivist::clients::arxiv::{ArxivClient, SearchQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArxivClient::new();
//!
//! let latest = client.search(&SearchQuery::category("cs.AI").max_results(5)).await?;
//! for paper in latest {
//!   println!("{} {}", paper.id, paper.title);
//! }
//!
//! let paper = client.fetch_paper("2301.07041").await?;
//! println!("Title: {}", paper.title);
//! # Ok(())
//! # }
//! ```

use std::{fmt, str::FromStr};

use url::Url;

use super::*;
use crate::feed;

/// Default query endpoint.
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Field arXiv sorts results by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
  /// Best match first
  #[default]
  Relevance,
  /// Most recently revised
  LastUpdatedDate,
  /// Most recently submitted
  SubmittedDate,
}

/// Direction of the sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
  /// Smallest first
  Ascending,
  /// Largest first
  #[default]
  Descending,
}

impl fmt::Display for SortBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortBy::Relevance => write!(f, "relevance"),
      SortBy::LastUpdatedDate => write!(f, "lastUpdatedDate"),
      SortBy::SubmittedDate => write!(f, "submittedDate"),
    }
  }
}

impl FromStr for SortBy {
  type Err = ArxivistError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match &s.to_lowercase() as &str {
      "relevance" => Ok(SortBy::Relevance),
      "updated" | "lastupdateddate" => Ok(SortBy::LastUpdatedDate),
      "submitted" | "submitteddate" => Ok(SortBy::SubmittedDate),
      s => Err(ArxivistError::Config(format!("unknown sort field {s:?}"))),
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortOrder::Ascending => write!(f, "ascending"),
      SortOrder::Descending => write!(f, "descending"),
    }
  }
}

impl FromStr for SortOrder {
  type Err = ArxivistError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match &s.to_lowercase() as &str {
      "asc" | "ascending" => Ok(SortOrder::Ascending),
      "desc" | "descending" => Ok(SortOrder::Descending),
      s => Err(ArxivistError::Config(format!("unknown sort order {s:?}"))),
    }
  }
}

/// A search against the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  /// Raw `search_query` value, e.g. `cat:cs.AI` or `all:transformers`
  pub search:      String,
  /// Offset of the first result
  pub start:       usize,
  /// Page size
  pub max_results: usize,
  /// Sort field
  pub sort_by:     SortBy,
  /// Sort direction
  pub sort_order:  SortOrder,
}

impl SearchQuery {
  /// The newest papers in a category.
  pub fn category(code: &str) -> Self {
    Self {
      search:      format!("cat:{code}"),
      start:       0,
      max_results: 10,
      sort_by:     SortBy::SubmittedDate,
      sort_order:  SortOrder::Descending,
    }
  }

  /// Papers matching every word of `terms` in any field, best match first.
  pub fn text(terms: &str) -> Self {
    Self {
      search:      terms
        .split_whitespace()
        .map(|word| format!("all:{word}"))
        .collect::<Vec<_>>()
        .join(" AND "),
      start:       0,
      max_results: 10,
      sort_by:     SortBy::Relevance,
      sort_order:  SortOrder::Descending,
    }
  }

  /// Sets the offset of the first result.
  pub fn start(mut self, start: usize) -> Self {
    self.start = start;
    self
  }

  /// Sets the page size.
  pub fn max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results;
    self
  }

  /// Sets the sort field and direction.
  pub fn sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
    self.sort_by = sort_by;
    self.sort_order = sort_order;
    self
  }
}

/// Client for interacting with the arXiv API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// Query endpoint, overridable for tests and mirrors.
  base_url: String,
}

impl ArxivClient {
  /// Creates a client for the public arXiv endpoint.
  pub fn new() -> Self { Self::with_client(reqwest::Client::new(), ARXIV_API_URL) }

  /// Creates a client that shares `client` and sends queries to `base_url`.
  pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
    Self { client, base_url: base_url.into() }
  }

  /// Runs a search and returns the papers in arXiv's order.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - The network request fails
  /// - arXiv answers with a non-success status
  /// - The response is not a parsable Atom feed
  ///
  /// An empty result is `Ok(vec![])`.
  pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, ArxivistError> {
    let url = Url::parse_with_params(&self.base_url, &[
      ("search_query", query.search.clone()),
      ("start", query.start.to_string()),
      ("max_results", query.max_results.to_string()),
      ("sortBy", query.sort_by.to_string()),
      ("sortOrder", query.sort_order.to_string()),
    ])?;
    self.get_feed(url).await
  }

  /// Looks up papers by identifier. Unknown identifiers are simply absent from the result.
  pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Paper>, ArxivistError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let url = Url::parse_with_params(&self.base_url, &[
      ("id_list", ids.join(",")),
      ("max_results", ids.len().to_string()),
    ])?;
    self.get_feed(url).await
  }

  /// Fetches a single paper by identifier, abstract URL or PDF URL.
  ///
  /// # Errors
  ///
  /// Returns [`ArxivistError::InvalidIdentifier`] for input that isn't an arXiv identifier and
  /// [`ArxivistError::NotFound`] when arXiv has no such paper.
  pub async fn fetch_paper(&self, identifier: &str) -> Result<Paper, ArxivistError> {
    let id = paper::parse_identifier(identifier)?;
    self.fetch_by_ids(&[id]).await?.into_iter().next().ok_or(ArxivistError::NotFound)
  }

  /// Performs the request and parses the response body.
  async fn get_feed(&self, url: Url) -> Result<Vec<Paper>, ArxivistError> {
    debug!("Fetching from arXiv via: {url}");

    let response = check_status(self.client.get(url).send().await?)?;
    let body = response.text().await?;
    trace!("arXiv response: {body}");

    feed::parse_feed(&body)
  }
}

impl Default for ArxivClient {
  fn default() -> Self { Self::new() }
}

#[async_trait]
impl PaperSource for ArxivClient {
  async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Paper>, ArxivistError> {
    self.search(query).await
  }
}

#[cfg(test)]
mod tests {
  use mockito::{Matcher, Server};

  use super::*;
  use crate::tests::{atom_entry, atom_feed};

  #[test]
  fn test_query_builders() {
    let query = SearchQuery::category("cs.AI").start(20).max_results(5);
    assert_eq!(query.search, "cat:cs.AI");
    assert_eq!(query.start, 20);
    assert_eq!(query.max_results, 5);
    assert_eq!(query.sort_by, SortBy::SubmittedDate);

    let query = SearchQuery::text("  graph   neural networks ");
    assert_eq!(query.search, "all:graph AND all:neural AND all:networks");
    assert_eq!(query.sort_by, SortBy::Relevance);

    assert_eq!("updated".parse::<SortBy>().unwrap(), SortBy::LastUpdatedDate);
    assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
    assert!("sideways".parse::<SortOrder>().is_err());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_sends_all_parameters() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("GET", "/api/query")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("search_query".into(), "cat:cs.LG".into()),
        Matcher::UrlEncoded("start".into(), "10".into()),
        Matcher::UrlEncoded("max_results".into(), "2".into()),
        Matcher::UrlEncoded("sortBy".into(), "submittedDate".into()),
        Matcher::UrlEncoded("sortOrder".into(), "descending".into()),
      ]))
      .with_status(200)
      .with_header("content-type", "application/atom+xml")
      .with_body(atom_feed(&[
        atom_entry("2401.00002v1", "2024-01-02T00:00:00Z", &["cs.LG"]),
        atom_entry("2401.00001v1", "2024-01-01T00:00:00Z", &["cs.LG", "stat.ML"]),
      ]))
      .create_async()
      .await;

    let client = ArxivClient::with_client(reqwest::Client::new(), format!("{}/api/query", server.url()));
    let papers = client.search(&SearchQuery::category("cs.LG").start(10).max_results(2)).await?;

    mock.assert_async().await;
    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].id, "2401.00002v1");
    assert_eq!(papers[1].categories, vec!["cs.LG", "stat.ML"]);
    Ok(())
  }

  #[tokio::test]
  async fn test_non_success_status_is_an_error() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/api/query").match_query(Matcher::Any).with_status(503).create_async().await;

    let client = ArxivClient::with_client(reqwest::Client::new(), format!("{}/api/query", server.url()));
    let err = client.search(&SearchQuery::category("cs.AI")).await.unwrap_err();
    assert!(matches!(err, ArxivistError::Status { status, .. } if status.as_u16() == 503));
  }

  #[tokio::test]
  async fn test_forbidden_is_a_status_error_not_an_auth_failure() {
    let mut server = Server::new_async().await;
    server.mock("GET", "/api/query").match_query(Matcher::Any).with_status(403).create_async().await;

    let client = ArxivClient::with_client(reqwest::Client::new(), format!("{}/api/query", server.url()));
    let err = client.search(&SearchQuery::category("cs.AI")).await.unwrap_err();
    assert!(!err.is_auth_error());
    assert!(matches!(err, ArxivistError::Status { status, .. } if status.as_u16() == 403));
  }

  #[tokio::test]
  async fn test_fetch_paper_by_id() -> anyhow::Result<()> {
    let mut server = Server::new_async().await;
    server
      .mock("GET", "/api/query")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("id_list".into(), "2401.00001".into()),
        Matcher::UrlEncoded("max_results".into(), "1".into()),
      ]))
      .with_status(200)
      .with_body(atom_feed(&[atom_entry("2401.00001v3", "2024-01-01T00:00:00Z", &["cs.AI"])]))
      .create_async()
      .await;
    server
      .mock("GET", "/api/query")
      .match_query(Matcher::UrlEncoded("id_list".into(), "2401.99999".into()))
      .with_status(200)
      .with_body(atom_feed(&[]))
      .create_async()
      .await;

    let client = ArxivClient::with_client(reqwest::Client::new(), format!("{}/api/query", server.url()));
    let paper = client.fetch_paper("https://arxiv.org/abs/2401.00001").await?;
    assert_eq!(paper.id, "2401.00001v3");
    assert_eq!(paper.base_id(), "2401.00001");

    assert!(matches!(client.fetch_paper("2401.99999").await, Err(ArxivistError::NotFound)));
    assert!(matches!(client.fetch_paper("nonsense").await, Err(ArxivistError::InvalidIdentifier)));
    Ok(())
  }

  #[tokio::test]
  async fn test_fetch_by_no_ids_skips_the_network() -> anyhow::Result<()> {
    let client = ArxivClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9/api/query");
    assert!(client.fetch_by_ids(&[]).await?.is_empty());
    Ok(())
  }

  #[ignore = "hits the live arXiv API"]
  #[tokio::test]
  async fn test_arxiv_entry_fetch() {
    let client = ArxivClient::new();
    let paper = client.fetch_paper("2301.07041").await.unwrap();

    assert!(!paper.title.is_empty());
    assert!(!paper.authors.is_empty());
    assert_eq!(paper.base_id(), "2301.07041");
  }
}
