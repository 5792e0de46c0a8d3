//! The personalised feed: the newest papers across every topic a user follows.
//!
//! [`PreferenceAggregator::fetch_for_preferences`] reads the user's topics, maps them to arXiv
//! category codes, queries every category concurrently and merges the answers into one list
//! holding each paper once, newest first.
//!
//! A category whose query fails contributes nothing; the rest of the feed is still returned.
//! There is no timeout of its own, so the slowest category decides how long the feed takes.
//!
//! # Examples
//!
//! ```no_run
//! use arxivist::{
//!   aggregator::{Feed, PreferenceAggregator},
//!   clients::ArxivClient,
//!   database::Database,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Database::default_path()).await?;
//! let arxiv = ArxivClient::new();
//! let aggregator = PreferenceAggregator::new(&db, &arxiv).per_category(3);
//!
//! if let Feed::Papers(papers) = aggregator.fetch_for_preferences("user-1").await? {
//!   println!("{} papers", papers.len());
//! }
//! # Ok(())
//! # }
//! ```

use futures::future::join_all;

use super::*;
use crate::{category, clients::PaperSource};

/// How many papers each category contributes unless configured otherwise.
pub const DEFAULT_PER_CATEGORY: usize = 5;

/// Outcome of building a user's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
  /// The user hasn't picked any topics yet.
  NeedsOnboarding,
  /// The merged papers, newest first. May be empty.
  Papers(Vec<Paper>),
}

/// Builds feeds from a preference store and a paper source.
pub struct PreferenceAggregator<'a, S, F> {
  /// Where topics are read from
  store:        &'a S,
  /// Where papers are fetched from
  source:       &'a F,
  /// Result cap for each category query
  per_category: usize,
}

impl<'a, S: PreferenceStore, F: PaperSource> PreferenceAggregator<'a, S, F> {
  /// Creates an aggregator with the default per-category cap.
  pub fn new(store: &'a S, source: &'a F) -> Self {
    Self { store, source, per_category: DEFAULT_PER_CATEGORY }
  }

  /// Sets how many papers each category contributes at most.
  pub fn per_category(mut self, per_category: usize) -> Self {
    self.per_category = per_category;
    self
  }

  /// Builds the feed for `user_id`.
  ///
  /// # Errors
  ///
  /// Only a failure to read the preference store is an error. Failed category queries are
  /// logged and left out.
  pub async fn fetch_for_preferences(&self, user_id: &str) -> Result<Feed, ArxivistError> {
    let Some(preferences) = self.store.preferences(user_id).await? else {
      debug!("No preferences stored for {user_id}");
      return Ok(Feed::NeedsOnboarding);
    };
    if preferences.topics.is_empty() {
      debug!("Preferences for {user_id} are empty");
      return Ok(Feed::NeedsOnboarding);
    }

    let codes = category_codes(&preferences.topics);
    debug!("Fetching feed for {user_id} across {codes:?}");

    let fetches = codes.iter().map(|code| async move {
      let query = SearchQuery::category(code).max_results(self.per_category);
      match self.source.fetch(&query).await {
        Ok(papers) => papers,
        Err(e) => {
          warn!("Fetching category {code} failed, leaving it out of the feed: {e}");
          Vec::new()
        },
      }
    });
    let batches = join_all(fetches).await;

    Ok(Feed::Papers(merge(batches)))
  }
}

/// Maps topics to distinct, queryable category codes, keeping the topics' order.
fn category_codes(topics: &[String]) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut codes = Vec::new();
  for topic in topics {
    let code = category::map_to_code(topic);
    if !category::is_usable_code(&code) {
      warn!("Dropping topic {topic:?}: no arXiv category for it");
      continue;
    }
    if seen.insert(code.to_string()) {
      codes.push(code.into_owned());
    }
  }
  codes
}

/// Flattens per-category results, keeps the first copy of each paper and sorts newest first.
///
/// Papers are matched on their versionless identifier. Batches are visited in category order, so
/// which copy of a duplicated paper survives does not depend on which request finished first.
pub fn merge(batches: Vec<Vec<Paper>>) -> Vec<Paper> {
  let mut seen = HashSet::new();
  let mut papers: Vec<Paper> = batches
    .into_iter()
    .flatten()
    .filter(|paper| seen.insert(paper.base_id().to_string()))
    .collect();
  papers.sort_by(|a, b| b.published.cmp(&a.published));
  papers
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::tests::{paper_with, MemoryStore};

  /// A preference store whose reads always fail.
  struct FailingStore;

  #[async_trait]
  impl PreferenceStore for FailingStore {
    async fn preferences(&self, _user_id: &str) -> Result<Option<Preferences>, ArxivistError> {
      Err(ArxivistError::Config("store unavailable".into()))
    }

    async fn save_preferences(&self, _user_id: &str, _topics: &[String]) -> Result<(), ArxivistError> {
      Err(ArxivistError::Config("store unavailable".into()))
    }
  }

  /// Serves canned results per `search_query` and records what was asked.
  #[derive(Default)]
  struct CannedSource {
    results: HashMap<String, Result<Vec<Paper>, u16>>,
    queries: Mutex<Vec<SearchQuery>>,
  }

  impl CannedSource {
    fn with(mut self, code: &str, result: Result<Vec<Paper>, u16>) -> Self {
      self.results.insert(format!("cat:{code}"), result);
      self
    }
  }

  #[async_trait]
  impl PaperSource for CannedSource {
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Paper>, ArxivistError> {
      self.queries.lock().unwrap().push(query.clone());
      match self.results.get(&query.search) {
        Some(Ok(papers)) => Ok(papers.iter().take(query.max_results).cloned().collect()),
        Some(Err(status)) => Err(ArxivistError::Status {
          status: reqwest::StatusCode::from_u16(*status).unwrap(),
          url:    query.search.clone(),
        }),
        None => Ok(Vec::new()),
      }
    }
  }

  fn batch(prefix: &str, count: usize, category: &str) -> Vec<Paper> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    (0..count)
      .map(|i| {
        paper_with(&format!("{prefix}.{i:05}v1"), base - Duration::hours(i as i64 * 7), category)
      })
      .collect()
  }

  fn assert_sorted_and_unique(papers: &[Paper]) {
    let ids: HashSet<_> = papers.iter().map(|p| &p.id).collect();
    assert_eq!(ids.len(), papers.len(), "duplicate ids in feed");
    assert!(papers.windows(2).all(|w| w[0].published >= w[1].published), "feed not sorted");
  }

  #[tokio::test]
  async fn test_missing_preferences_need_onboarding() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    let source = CannedSource::default();
    let feed = PreferenceAggregator::new(&store, &source).fetch_for_preferences("nobody").await?;
    assert_eq!(feed, Feed::NeedsOnboarding);
    assert!(source.queries.lock().unwrap().is_empty());
    Ok(())
  }

  #[tokio::test]
  async fn test_store_failure_is_an_error() {
    let source = CannedSource::default();
    let result = PreferenceAggregator::new(&FailingStore, &source).fetch_for_preferences("u1").await;
    assert!(matches!(result, Err(ArxivistError::Config(_))));
    assert!(source.queries.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_empty_topic_set_needs_onboarding() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    store.save_preferences("u1", &[]).await?;
    let source = CannedSource::default();
    let feed = PreferenceAggregator::new(&store, &source).fetch_for_preferences("u1").await?;
    assert_eq!(feed, Feed::NeedsOnboarding);
    Ok(())
  }

  #[tokio::test]
  async fn test_overlapping_categories_merge_to_nine() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    store
      .save_preferences("u1", &["Artificial Intelligence".into(), "Machine Learning".into()])
      .await?;

    let ai = batch("2403", 5, "cs.AI");
    let mut lg = batch("2402", 4, "cs.LG");
    lg.push(ai[2].clone());
    let source = CannedSource::default().with("cs.AI", Ok(ai)).with("cs.LG", Ok(lg));

    let Feed::Papers(papers) =
      PreferenceAggregator::new(&store, &source).fetch_for_preferences("u1").await?
    else {
      panic!("expected papers");
    };

    assert_eq!(papers.len(), 9);
    assert_sorted_and_unique(&papers);

    let queries = source.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.max_results == DEFAULT_PER_CATEGORY));
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_failed_category_is_tolerated() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    store.save_preferences("u1", &["cs.AI".into(), "cs.CV".into(), "cs.RO".into()]).await?;

    let source = CannedSource::default()
      .with("cs.AI", Ok(batch("2403", 3, "cs.AI")))
      .with("cs.CV", Err(503))
      .with("cs.RO", Ok(batch("2402", 2, "cs.RO")));

    let feed = PreferenceAggregator::new(&store, &source).fetch_for_preferences("u1").await?;
    let Feed::Papers(papers) = feed else { panic!("expected papers") };
    assert_eq!(papers.len(), 5);
    assert_sorted_and_unique(&papers);
    assert!(logs_contain("Fetching category cs.CV failed"));
    Ok(())
  }

  #[tokio::test]
  async fn test_all_categories_empty_is_success() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    store.save_preferences("u1", &["Robotics".into()]).await?;
    let source = CannedSource::default();
    let feed = PreferenceAggregator::new(&store, &source).fetch_for_preferences("u1").await?;
    assert_eq!(feed, Feed::Papers(Vec::new()));
    Ok(())
  }

  #[traced_test]
  #[tokio::test]
  async fn test_unusable_and_duplicate_topics() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    store
      .save_preferences("u1", &[
        "Machine Learning".into(),
        "cs.LG".into(),
        "Underwater Basket Weaving".into(),
        "  ".into(),
      ])
      .await?;
    let source = CannedSource::default().with("cs.LG", Ok(batch("2401", 2, "cs.LG")));

    let aggregator = PreferenceAggregator::new(&store, &source).per_category(1);
    let Feed::Papers(papers) = aggregator.fetch_for_preferences("u1").await? else {
      panic!("expected papers");
    };
    assert_eq!(papers.len(), 1);

    let queries = source.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].search, "cat:cs.LG");
    assert_eq!(queries[0].max_results, 1);
    assert!(logs_contain("Dropping topic"));
    Ok(())
  }

  #[test]
  fn test_merge_keeps_first_copy() {
    let newer = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let older = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
    let mut first = paper_with("2404.00001v1", older, "cs.AI");
    first.title = "first".into();
    let mut second = first.clone();
    second.title = "second".into();

    let merged = merge(vec![vec![first], vec![paper_with("2405.00001v1", newer, "cs.LG"), second]]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].id, "2405.00001v1");
    assert_eq!(merged[1].title, "first");
  }

  #[test]
  fn test_merge_treats_versions_as_one_paper() {
    let published = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let merged = merge(vec![vec![paper_with("2403.00001v1", published, "cs.AI")], vec![
      paper_with("2403.00001v2", published, "cs.LG"),
    ]]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].id, "2403.00001v1");
  }
}
