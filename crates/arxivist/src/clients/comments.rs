//! Client for the comments backend.
//!
//! The backend is a small REST service:
//!
//! | operation | request                                  | auth   |
//! |-----------|------------------------------------------|--------|
//! | list      | `GET {base}/comments/{paper_id}`         | bearer |
//! | create    | `POST {base}/comments`                   | bearer |
//! | vote      | `POST {base}/comments/{comment_id}/vote` | bearer |
//! | delete    | `DELETE {base}/comments/{comment_id}`    | bearer |
//! | counts    | `POST {base}/comments/counts`            | none   |
//!
//! Calls that need a token fail with [`AuthFailure::SignInRequired`] before touching the network
//! when no token is configured.

use url::Url;

use super::*;
use crate::comments::{Comment, Vote};

/// Body of a create request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
  /// Paper being commented on
  paper_id:       &'a str,
  /// Comment body
  content:        &'a str,
  /// Parent comment for replies
  parent_id:      Option<&'a str>,
  /// Display name of the author
  user_name:      Option<&'a str>,
  /// Avatar of the author
  user_photo_url: Option<&'a str>,
}

/// Body of a vote request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
  /// `upvote`, `downvote` or `remove`
  vote_type: &'static str,
}

/// Body of a counts request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountsRequest<'a> {
  /// Papers to count comments for
  paper_ids: &'a [String],
}

/// Response of a counts request.
#[derive(Debug, Deserialize)]
struct CountsResponse {
  /// Count per paper id
  counts: HashMap<String, u64>,
}

/// Client for the comments backend.
#[derive(Debug, Clone)]
pub struct CommentsClient {
  /// Internal web client used to connect to the API.
  client:      reqwest::Client,
  /// Backend root, e.g. `https://comments.example.com/api`
  base_url:    String,
  /// Identity and token of the current user
  credentials: Credentials,
}

impl CommentsClient {
  /// Creates a client that shares `client` and talks to the backend at `base_url`.
  pub fn with_client(
    client: reqwest::Client,
    base_url: impl Into<String>,
    credentials: Credentials,
  ) -> Self {
    Self { client, base_url: base_url.into(), credentials }
  }

  /// The user this client acts for.
  pub fn credentials(&self) -> &Credentials { &self.credentials }

  /// All comments on `paper_id`, flat, in the backend's order.
  pub async fn list(&self, paper_id: &str) -> Result<Vec<Comment>, ArxivistError> {
    let token = self.credentials.bearer()?;
    let url = self.endpoint(&["comments", paper_id])?;
    debug!("Listing comments via: {url}");

    let response = check_auth_status(self.client.get(url).bearer_auth(token).send().await?)?;
    let comments: Vec<Comment> = response.json().await?;
    trace!("Received {} comments for {paper_id}", comments.len());
    Ok(comments)
  }

  /// Posts a comment, or a reply to `parent_id`.
  pub async fn create(
    &self,
    paper_id: &str,
    content: &str,
    parent_id: Option<&str>,
  ) -> Result<Comment, ArxivistError> {
    let token = self.credentials.bearer()?;
    let url = self.endpoint(&["comments"])?;
    let body = NewComment {
      paper_id,
      content,
      parent_id,
      user_name: self.credentials.name.as_deref(),
      user_photo_url: self.credentials.avatar_url.as_deref(),
    };
    debug!("Posting comment on {paper_id} via: {url}");

    let response =
      check_auth_status(self.client.post(url).bearer_auth(token).json(&body).send().await?)?;
    Ok(response.json().await?)
  }

  /// Sets the current user's vote on a comment. [`Vote::None`] removes it.
  pub async fn vote(&self, comment_id: &str, vote: Vote) -> Result<(), ArxivistError> {
    let token = self.credentials.bearer()?;
    let url = self.endpoint(&["comments", comment_id, "vote"])?;
    debug!("Voting {} on {comment_id}", vote.as_wire());

    check_auth_status(
      self
        .client
        .post(url)
        .bearer_auth(token)
        .json(&VoteRequest { vote_type: vote.as_wire() })
        .send()
        .await?,
    )?;
    Ok(())
  }

  /// Deletes a comment.
  pub async fn delete(&self, comment_id: &str) -> Result<(), ArxivistError> {
    let token = self.credentials.bearer()?;
    let url = self.endpoint(&["comments", comment_id])?;
    debug!("Deleting comment via: {url}");

    check_auth_status(self.client.delete(url).bearer_auth(token).send().await?)?;
    Ok(())
  }

  /// Comment counts for a batch of papers. Needs no credentials.
  pub async fn counts(&self, paper_ids: &[String]) -> Result<HashMap<String, u64>, ArxivistError> {
    if paper_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let url = self.endpoint(&["comments", "counts"])?;
    let response =
      check_status(self.client.post(url).json(&CountsRequest { paper_ids }).send().await?)?;
    let CountsResponse { counts } = response.json().await?;
    Ok(counts)
  }

  /// Appends percent-encoded path segments to the base URL.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, ArxivistError> {
    let mut url = Url::parse(&self.base_url)?;
    url
      .path_segments_mut()
      .map_err(|_| ArxivistError::Config(format!("{} cannot be a base URL", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }
}
