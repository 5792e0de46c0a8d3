//! SQLite-backed document store for preferences and bookmarks.
//!
//! The schema lives in `migrations/init.sql` and is applied every time the database is opened;
//! every statement in it is idempotent.

use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use super::*;

/// Database handle for arxivist
pub struct Database {
  conn: Connection,
}

impl Database {
  /// Open or create a database at the specified path
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, ArxivistError> {
    let conn = Connection::open(path.as_ref()).await?;

    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;

    Ok(Self { conn })
  }

  /// Get default database path in user's data directory
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("arxivist").join("arxivist.db")
  }
}

#[async_trait]
impl PreferenceStore for Database {
  async fn preferences(&self, user_id: &str) -> Result<Option<Preferences>, ArxivistError> {
    let user_id = user_id.to_string();
    let row = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare_cached("SELECT topics, updated_at FROM preferences WHERE user_id = ?1")?;
        let row = stmt
          .query_row(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?))
          })
          .optional()?;
        Ok(row)
      })
      .await?;

    match row {
      Some((topics, updated_at)) =>
        Ok(Some(Preferences { topics: serde_json::from_str(&topics)?, updated_at })),
      None => Ok(None),
    }
  }

  async fn save_preferences(&self, user_id: &str, topics: &[String]) -> Result<(), ArxivistError> {
    let user_id = user_id.to_string();
    let topics = serde_json::to_string(&store::normalize_topics(topics))?;
    let now = Utc::now();
    debug!("Saving preferences for {user_id}: {topics}");

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO preferences (user_id, topics, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(user_id) DO UPDATE SET topics = excluded.topics,
                                              updated_at = excluded.updated_at",
          params![user_id, topics, now],
        )?;
        Ok(())
      })
      .await
      .map_err(ArxivistError::from)
  }
}

#[async_trait]
impl BookmarkStore for Database {
  async fn bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, ArxivistError> {
    let user_id = user_id.to_string();
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT user_id, paper_id, created_at
             FROM bookmarks
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC",
        )?;
        let bookmarks = stmt
          .query_map(params![user_id], |row| {
            Ok(Bookmark { user_id: row.get(0)?, paper_id: row.get(1)?, created_at: row.get(2)? })
          })?
          .collect::<Result<Vec<_>, _>>()?;
        Ok(bookmarks)
      })
      .await
      .map_err(ArxivistError::from)
  }

  async fn add_bookmark(&self, user_id: &str, paper_id: &str) -> Result<(), ArxivistError> {
    let user_id = user_id.to_string();
    let paper_id = paper_id.to_string();
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO bookmarks (user_id, paper_id, created_at) VALUES (?1, ?2, ?3)",
          params![user_id, paper_id, now],
        )?;
        Ok(())
      })
      .await
      .map_err(ArxivistError::from)
  }

  async fn remove_bookmark(&self, user_id: &str, paper_id: &str) -> Result<(), ArxivistError> {
    let user_id = user_id.to_string();
    let paper_id = paper_id.to_string();
    self
      .conn
      .call(move |conn| {
        let removed = conn.execute(
          "DELETE FROM bookmarks WHERE user_id = ?1 AND paper_id = ?2",
          params![user_id, paper_id],
        )?;
        trace!("Removed {removed} bookmark rows");
        Ok(())
      })
      .await
      .map_err(ArxivistError::from)
  }
}
