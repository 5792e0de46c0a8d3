//! Comments on papers: the wire model, tree assembly and vote state.
//!
//! The backend returns a paper's comments as a flat list where replies point at their parent.
//! [`to_tree`] turns that into root comments with their direct replies attached. Only one level
//! of nesting is shown; the wire format allows deeper chains but those comments are not
//! displayed.
//!
//! Mutations never patch the local tree. [`CommentSession`] re-fetches the whole list after every
//! post, vote or delete so what is shown is always what the backend holds.
//!
//! # Examples
//!
//! ```
//! use arxivist::comments::{to_tree, Comment, Vote};
//!
//! let flat: Vec<Comment> = serde_json::from_str(
//!   r#"[
//!     {"id": "c1", "paperId": "2301.07041", "userId": "u1", "userName": "Ada",
//!      "content": "Nice result", "upvotes": ["u2"], "downvotes": [],
//!      "createdAt": "2024-01-01T00:00:00Z"},
//!     {"id": "c2", "paperId": "2301.07041", "userId": "u2", "userName": "Bob",
//!      "content": "Agreed", "parentId": "c1", "upvotes": [], "downvotes": [],
//!      "createdAt": "2024-01-01T01:00:00Z"}
//!   ]"#,
//! )
//! .unwrap();
//!
//! let tree = to_tree(flat);
//! assert_eq!(tree.len(), 1);
//! assert_eq!(tree[0].replies[0].id, "c2");
//! assert_eq!(tree[0].vote_of("u2"), Vote::Up);
//! ```

use super::*;
use crate::clients::CommentsClient;

/// A comment as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  /// Backend-assigned identifier
  pub id:             String,
  /// Paper the comment belongs to
  pub paper_id:       String,
  /// Author's user id
  pub user_id:        String,
  /// Author's display name
  pub user_name:      String,
  /// Author's avatar
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_photo_url: Option<String>,
  /// Comment body
  pub content:        String,
  /// Parent comment, `None` for a root comment
  #[serde(default)]
  pub parent_id:      Option<String>,
  /// Users who upvoted, in the order they voted
  #[serde(default, rename = "upvotes")]
  pub upvoters:       Vec<String>,
  /// Users who downvoted, in the order they voted
  #[serde(default, rename = "downvotes")]
  pub downvoters:     Vec<String>,
  /// When the comment was posted
  pub created_at:     DateTime<Utc>,
  /// Direct replies, filled in by [`to_tree`]
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub replies:        Vec<Comment>,
}

/// A user's vote on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
  /// Upvoted
  Up,
  /// Downvoted
  Down,
  /// No vote
  #[default]
  None,
}

impl Vote {
  /// The vote that results from pressing `pressed` while `self` is the current vote.
  ///
  /// Pressing the active vote again clears it; pressing the other one switches.
  pub fn toggled(self, pressed: Vote) -> Vote { if self == pressed { Vote::None } else { pressed } }

  /// The value the backend expects for this vote.
  pub fn as_wire(self) -> &'static str {
    match self {
      Vote::Up => "upvote",
      Vote::Down => "downvote",
      Vote::None => "remove",
    }
  }
}

impl Comment {
  /// Whether this is a root comment.
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  /// How `user_id` voted on this comment.
  pub fn vote_of(&self, user_id: &str) -> Vote {
    if self.upvoters.iter().any(|u| u == user_id) {
      Vote::Up
    } else if self.downvoters.iter().any(|u| u == user_id) {
      Vote::Down
    } else {
      Vote::None
    }
  }

  /// Upvotes minus downvotes.
  pub fn score(&self) -> i64 { self.upvoters.len() as i64 - self.downvoters.len() as i64 }
}

/// Assembles a flat comment list into root comments carrying their direct replies.
///
/// Roots and replies keep the order the backend returned them in. Comments whose parent is not a
/// root in `flat` are dropped.
pub fn to_tree(flat: Vec<Comment>) -> Vec<Comment> {
  let (mut roots, replies): (Vec<_>, Vec<_>) =
    flat.into_iter().partition(|comment| comment.parent_id.is_none());

  for root in &mut roots {
    root.replies.clear();
  }
  let index: HashMap<String, usize> =
    roots.iter().enumerate().map(|(i, root)| (root.id.clone(), i)).collect();

  for mut reply in replies {
    let slot = reply.parent_id.as_deref().and_then(|parent| index.get(parent)).copied();
    match slot {
      Some(i) => {
        reply.replies.clear();
        roots[i].replies.push(reply);
      },
      None => debug!("Not displaying comment {} nested under {:?}", reply.id, reply.parent_id),
    }
  }

  roots
}

/// The comment thread of one paper, always as last fetched from the backend.
pub struct CommentSession<'a> {
  /// Backend client, which also knows who the current user is
  client:   &'a CommentsClient,
  /// Paper being discussed
  paper_id: String,
  /// Assembled tree from the last fetch
  tree:     Vec<Comment>,
}

impl<'a> CommentSession<'a> {
  /// Fetches the comments of `paper_id`.
  pub async fn load(
    client: &'a CommentsClient,
    paper_id: impl Into<String>,
  ) -> Result<CommentSession<'a>, ArxivistError> {
    let mut session = Self { client, paper_id: paper_id.into(), tree: Vec::new() };
    session.refresh().await?;
    Ok(session)
  }

  /// Re-fetches the full list and rebuilds the tree.
  pub async fn refresh(&mut self) -> Result<(), ArxivistError> {
    self.tree = to_tree(self.client.list(&self.paper_id).await?);
    Ok(())
  }

  /// Root comments with their replies.
  pub fn roots(&self) -> &[Comment] { &self.tree }

  /// Number of displayed comments, replies included.
  pub fn len(&self) -> usize { self.tree.iter().map(|root| 1 + root.replies.len()).sum() }

  /// Whether there are no displayed comments.
  pub fn is_empty(&self) -> bool { self.tree.is_empty() }

  /// Finds a displayed comment by id.
  pub fn find(&self, comment_id: &str) -> Option<&Comment> {
    self
      .tree
      .iter()
      .flat_map(|root| std::iter::once(root).chain(root.replies.iter()))
      .find(|comment| comment.id == comment_id)
  }

  /// Posts a comment, or a reply when `parent_id` is given, then reloads.
  pub async fn post(&mut self, content: &str, parent_id: Option<&str>) -> Result<(), ArxivistError> {
    self.client.create(&self.paper_id, content, parent_id).await?;
    self.refresh().await
  }

  /// Applies a button press on a comment's vote control, then reloads.
  ///
  /// Returns the vote that was sent.
  pub async fn vote(&mut self, comment_id: &str, pressed: Vote) -> Result<Vote, ArxivistError> {
    let current = self
      .find(comment_id)
      .map(|comment| comment.vote_of(&self.client.credentials().user_id))
      .unwrap_or_default();
    let next = current.toggled(pressed);
    self.client.vote(comment_id, next).await?;
    self.refresh().await?;
    Ok(next)
  }

  /// Deletes a comment, then reloads.
  pub async fn delete(&mut self, comment_id: &str) -> Result<(), ArxivistError> {
    self.client.delete(comment_id).await?;
    self.refresh().await
  }
}

/// Last-known comment counts for a set of papers.
#[derive(Debug, Clone, Default)]
pub struct CommentCounts {
  /// Count per paper id
  counts: HashMap<String, u64>,
}

impl CommentCounts {
  /// Fetches counts for `paper_ids`, replacing the snapshot.
  pub async fn refresh(
    &mut self,
    client: &CommentsClient,
    paper_ids: &[String],
  ) -> Result<(), ArxivistError> {
    self.counts = client.counts(paper_ids).await?;
    Ok(())
  }

  /// Count for `paper_id`; papers the backend didn't mention have none.
  pub fn get(&self, paper_id: &str) -> u64 { self.counts.get(paper_id).copied().unwrap_or(0) }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn comment(id: &str, parent: Option<&str>) -> Comment {
    Comment {
      id:             id.into(),
      paper_id:       "2301.07041".into(),
      user_id:        format!("author-of-{id}"),
      user_name:      "Someone".into(),
      user_photo_url: None,
      content:        format!("comment {id}"),
      parent_id:      parent.map(Into::into),
      upvoters:       Vec::new(),
      downvoters:     Vec::new(),
      created_at:     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      replies:        Vec::new(),
    }
  }

  #[test]
  fn test_all_roots() {
    let tree = to_tree(vec![comment("a", None), comment("b", None), comment("c", None)]);
    assert_eq!(tree.len(), 3);
    assert!(tree.iter().all(|root| root.replies.is_empty()));
    assert_eq!(tree.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["a", "b", "c"]);
  }

  #[test]
  fn test_one_root_many_replies_keep_order() {
    let flat = vec![
      comment("r3", Some("root")),
      comment("root", None),
      comment("r1", Some("root")),
      comment("r2", Some("root")),
    ];
    let tree = to_tree(flat);
    assert_eq!(tree.len(), 1);
    let replies: Vec<_> = tree[0].replies.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(replies, ["r3", "r1", "r2"]);
  }

  #[test]
  fn test_orphans_and_deep_replies_are_not_displayed() {
    let flat = vec![
      comment("root", None),
      comment("reply", Some("root")),
      comment("reply-to-reply", Some("reply")),
      comment("orphan", Some("deleted")),
    ];
    let tree = to_tree(flat);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].replies.len(), 1);
    assert_eq!(tree[0].replies[0].id, "reply");
  }

  #[test]
  fn test_vote_state() {
    let mut c = comment("a", None);
    c.upvoters = vec!["u1".into(), "u2".into()];
    c.downvoters = vec!["u3".into()];
    assert_eq!(c.vote_of("u1"), Vote::Up);
    assert_eq!(c.vote_of("u3"), Vote::Down);
    assert_eq!(c.vote_of("u4"), Vote::None);
    assert_eq!(c.score(), 1);
  }

  #[test]
  fn test_vote_toggling() {
    assert_eq!(Vote::None.toggled(Vote::Up), Vote::Up);
    assert_eq!(Vote::Up.toggled(Vote::Up), Vote::None);
    assert_eq!(Vote::Down.toggled(Vote::Up), Vote::Up);
    assert_eq!(Vote::Up.toggled(Vote::Down), Vote::Down);
    assert_eq!(Vote::None.as_wire(), "remove");
  }

  #[test]
  fn test_wire_format() -> anyhow::Result<()> {
    let json = r#"{"id":"c1","paperId":"p","userId":"u","userName":"U","content":"hi",
                   "parentId":null,"upvotes":["x"],"downvotes":[],"createdAt":"2024-01-01T00:00:00Z"}"#;
    let c: Comment = serde_json::from_str(json)?;
    assert!(c.is_root());
    assert_eq!(c.upvoters, vec!["x"]);

    let value = serde_json::to_value(&c)?;
    assert_eq!(value["paperId"], "p");
    assert_eq!(value["upvotes"][0], "x");
    assert!(value.get("replies").is_none());
    Ok(())
  }
}
