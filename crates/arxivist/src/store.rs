//! Storage seams for per-user state.
//!
//! Preferences and bookmarks live in a document store keyed by user id. The library only depends
//! on the two traits here; [`Database`](crate::database::Database) is the SQLite implementation
//! used by the command line front end.

use super::*;

/// A user's chosen topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
  /// Human-readable topic names, as picked during onboarding
  pub topics:     Vec<String>,
  /// When the topics were last saved
  pub updated_at: DateTime<Utc>,
}

/// A saved paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
  /// Owner of the bookmark
  pub user_id:    String,
  /// arXiv identifier of the saved paper
  pub paper_id:   String,
  /// When the bookmark was created
  pub created_at: DateTime<Utc>,
}

/// Read and write a user's topic preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
  /// The stored preferences, or `None` if the user never saved any.
  async fn preferences(&self, user_id: &str) -> Result<Option<Preferences>, ArxivistError>;

  /// Replaces the user's topics. Duplicates and blank entries are dropped.
  async fn save_preferences(&self, user_id: &str, topics: &[String]) -> Result<(), ArxivistError>;
}

/// Read and write a user's bookmarks.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
  /// All bookmarks of the user, newest first.
  async fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, ArxivistError>;

  /// Saves a bookmark. Saving an existing bookmark again is a no-op.
  async fn add_bookmark(&self, user_id: &str, paper_id: &str) -> Result<(), ArxivistError>;

  /// Removes a bookmark. Removing a missing bookmark is a no-op.
  async fn remove_bookmark(&self, user_id: &str, paper_id: &str) -> Result<(), ArxivistError>;
}

/// Trims topics, drops blanks and duplicates, keeps the first occurrence's position.
pub(crate) fn normalize_topics(topics: &[String]) -> Vec<String> {
  let mut seen = HashSet::new();
  topics
    .iter()
    .map(|t| t.trim())
    .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
    .map(str::to_string)
    .collect()
}
