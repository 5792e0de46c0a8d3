//! A client library for browsing arXiv papers, keeping bookmarks, discussing papers through a
//! comments backend and asking an AI backend about a paper's content.
//!
//! The library is a thin orchestration layer over several remote services. Everything that talks
//! to the network is constructed explicitly from a [`Config`](config::Config) and handed to the
//! code that needs it; there is no global client registry.
//!
//! # Example
//! ```rust,no_run
//! use arxivist::{aggregator::Feed, config::Config, database::Database};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let config = Config::load()?;
//!   let clients = config.clients()?;
//!   let db = Database::open(config.database_path()).await?;
//!
//!   let aggregator = clients.aggregator(&db, config.feed.per_category);
//!   match aggregator.fetch_for_preferences("some-user").await? {
//!     Feed::NeedsOnboarding => println!("Pick some topics first"),
//!     Feed::Papers(papers) =>
//!       for paper in papers {
//!         println!("{} {}", paper.id, paper.title);
//!       },
//!   }
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{
  collections::{HashMap, HashSet},
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod aggregator;
pub mod auth;
pub mod bookmarks;
pub mod category;
pub mod clients;
pub mod comments;
pub mod config;
pub mod database;
pub mod errors;
pub mod feed;
pub mod paper;
pub mod pdf;
pub mod state;
pub mod store;

use auth::AuthFailure;
use clients::arxiv::{SearchQuery, SortBy, SortOrder};
use errors::ArxivistError;
use paper::Paper;
use store::{Bookmark, BookmarkStore, PreferenceStore, Preferences};
