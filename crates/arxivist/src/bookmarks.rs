//! The current user's bookmarks as an in-process snapshot.
//!
//! [`BookmarkCache`] keeps the set of bookmarked paper ids so lists of papers can show a
//! bookmark marker without a store round trip per paper. Writes go to the store first and then
//! update the snapshot. Changes made elsewhere only show up after [`BookmarkCache::refresh`].

use super::*;
use crate::clients::ArxivClient;

/// Bookmarked paper ids for one user, backed by a [`BookmarkStore`].
pub struct BookmarkCache<'a, S> {
  /// Source of truth
  store:   &'a S,
  /// Owner of the bookmarks
  user_id: String,
  /// Ids in the store's order (newest first) as of the last refresh or write
  ids:     Vec<String>,
}

impl<'a, S: BookmarkStore> BookmarkCache<'a, S> {
  /// Loads the user's bookmarks from `store`.
  pub async fn load(store: &'a S, user_id: impl Into<String>) -> Result<Self, ArxivistError> {
    let mut cache = Self { store, user_id: user_id.into(), ids: Vec::new() };
    cache.refresh().await?;
    Ok(cache)
  }

  /// Replaces the snapshot with the store's current contents.
  pub async fn refresh(&mut self) -> Result<(), ArxivistError> {
    self.ids = self.store.bookmarks(&self.user_id).await?.into_iter().map(|b| b.paper_id).collect();
    debug!("Loaded {} bookmarks for {}", self.ids.len(), self.user_id);
    Ok(())
  }

  /// Whether `paper_id` is bookmarked, as of the last refresh or write.
  pub fn contains(&self, paper_id: &str) -> bool { self.ids.iter().any(|id| id == paper_id) }

  /// Bookmarked ids, newest first.
  pub fn ids(&self) -> &[String] { &self.ids }

  /// Number of bookmarks.
  pub fn len(&self) -> usize { self.ids.len() }

  /// Whether there are no bookmarks.
  pub fn is_empty(&self) -> bool { self.ids.is_empty() }

  /// Bookmarks `paper_id`.
  pub async fn add(&mut self, paper_id: &str) -> Result<(), ArxivistError> {
    self.store.add_bookmark(&self.user_id, paper_id).await?;
    if !self.contains(paper_id) {
      self.ids.insert(0, paper_id.to_string());
    }
    Ok(())
  }

  /// Removes the bookmark for `paper_id`.
  pub async fn remove(&mut self, paper_id: &str) -> Result<(), ArxivistError> {
    self.store.remove_bookmark(&self.user_id, paper_id).await?;
    self.ids.retain(|id| id != paper_id);
    Ok(())
  }

  /// Adds the bookmark if absent, removes it if present. Returns whether it is now bookmarked.
  pub async fn toggle(&mut self, paper_id: &str) -> Result<bool, ArxivistError> {
    if self.contains(paper_id) {
      self.remove(paper_id).await?;
      Ok(false)
    } else {
      self.add(paper_id).await?;
      Ok(true)
    }
  }

  /// Fetches metadata for every bookmarked paper, in bookmark order.
  ///
  /// Papers arXiv no longer knows about are left out.
  pub async fn papers(&self, arxiv: &ArxivClient) -> Result<Vec<Paper>, ArxivistError> {
    let mut papers = arxiv.fetch_by_ids(&self.ids).await?;
    let position = |paper: &Paper| {
      self
        .ids
        .iter()
        .position(|id| id == &paper.id || id == paper.base_id())
        .unwrap_or(usize::MAX)
    };
    papers.sort_by_key(position);
    Ok(papers)
  }
}
