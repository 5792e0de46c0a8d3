//! Configuration, read from `config.toml` in the user's config directory.
//!
//! Every key is optional. A missing file, or a file that only sets a few keys, is filled in with
//! the defaults below:
//!
//! ```toml
//! [arxiv]
//! base_url = "http://export.arxiv.org/api/query"
//!
//! [comments]
//! base_url = "http://localhost:8080/api"
//!
//! [assistant]
//! base_url = "http://localhost:8000/ask"
//!
//! [crossref]
//! base_url = "https://api.crossref.org"
//!
//! [http]
//! timeout_secs = 30
//!
//! [feed]
//! per_category = 5
//!
//! [database]
//! # path = "/somewhere/arxivist.db"
//!
//! [user]
//! id = "local"
//! # name = "Ada Lovelace"
//! # avatar_url = "https://..."
//! # token = "..."
//! ```
//!
//! `ARXIVIST_USER` and `ARXIVIST_TOKEN` override `user.id` and `user.token`.

use std::time::Duration;

use super::*;
use crate::{
  aggregator::DEFAULT_PER_CATEGORY,
  auth::Credentials,
  clients::{arxiv::ARXIV_API_URL, citation::CROSSREF_API_URL, Clients, Endpoints},
  database::Database,
};

/// Environment variable overriding `user.id`.
pub const USER_ENV: &str = "ARXIVIST_USER";
/// Environment variable overriding `user.token`.
pub const TOKEN_ENV: &str = "ARXIVIST_TOKEN";

/// A section that only holds a service location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
  /// Root URL of the service
  pub base_url: String,
}

impl Service {
  /// A section pointing at `base_url`.
  fn at(base_url: &str) -> Self { Self { base_url: base_url.to_string() } }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
  /// Per-request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for Http {
  fn default() -> Self { Self { timeout_secs: 30 } }
}

/// Feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
  /// How many papers each followed category contributes
  pub per_category: usize,
}

impl Default for FeedSettings {
  fn default() -> Self { Self { per_category: DEFAULT_PER_CATEGORY } }
}

/// Local storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
  /// Database file; the platform data directory when unset
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
  /// Stable user id; bookmarks and preferences are keyed by it
  pub id:         String,
  /// Display name attached to comments
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:       Option<String>,
  /// Avatar attached to comments
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
  /// Bearer token for the comments backend
  #[serde(skip_serializing_if = "Option::is_none")]
  pub token:      Option<String>,
}

impl Default for User {
  fn default() -> Self { Self { id: "local".into(), name: None, avatar_url: None, token: None } }
}

/// Full configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// arXiv query endpoint
  pub arxiv:     Service,
  /// Comments backend
  pub comments:  Service,
  /// AI backend
  pub assistant: Service,
  /// Crossref API
  pub crossref:  Service,
  /// HTTP client settings
  pub http:      Http,
  /// Feed settings
  pub feed:      FeedSettings,
  /// Local storage
  pub database:  DatabaseSettings,
  /// Current user
  pub user:      User,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      arxiv:     Service::at(ARXIV_API_URL),
      comments:  Service::at("http://localhost:8080/api"),
      assistant: Service::at("http://localhost:8000/ask"),
      crossref:  Service::at(CROSSREF_API_URL),
      http:      Http::default(),
      feed:      FeedSettings::default(),
      database:  DatabaseSettings::default(),
      user:      User::default(),
    }
  }
}

impl Config {
  /// Default location of the config file.
  pub fn path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("arxivist").join("config.toml")
  }

  /// Loads the config file from [`Config::path`] and applies environment overrides.
  pub fn load() -> Result<Self, ArxivistError> {
    let mut config = Self::load_from(Self::path())?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
  }

  /// Loads a config file without looking at the environment. A missing file gives defaults.
  pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ArxivistError> {
    let path = path.as_ref();
    if !path.exists() {
      debug!("No config at {}, using defaults", path.display());
      return Ok(Self::default());
    }
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
      .map_err(|e| ArxivistError::Config(format!("{}: {}", path.display(), e.message())))
  }

  /// Writes the config as TOML, creating parent directories.
  pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ArxivistError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(self).map_err(|e| ArxivistError::Config(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
  }

  /// Applies `ARXIVIST_USER` and `ARXIVIST_TOKEN` as read through `lookup`. Blank values are
  /// ignored.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(user) = get(USER_ENV) {
      trace!("User id overridden by {USER_ENV}");
      self.user.id = user;
    }
    if let Some(token) = get(TOKEN_ENV) {
      trace!("Token overridden by {TOKEN_ENV}");
      self.user.token = Some(token);
    }
  }

  /// The database file to open.
  pub fn database_path(&self) -> PathBuf {
    self.database.path.clone().unwrap_or_else(Database::default_path)
  }

  /// Identity used for the comments backend.
  pub fn credentials(&self) -> Credentials {
    Credentials {
      user_id:    self.user.id.clone(),
      name:       self.user.name.clone(),
      avatar_url: self.user.avatar_url.clone(),
      token:      self.user.token.clone(),
    }
  }

  /// Base URLs of every service.
  pub fn endpoints(&self) -> Endpoints {
    Endpoints {
      arxiv:     self.arxiv.base_url.clone(),
      comments:  self.comments.base_url.clone(),
      assistant: self.assistant.base_url.clone(),
      crossref:  self.crossref.base_url.clone(),
    }
  }

  /// The HTTP client every service client shares.
  pub fn http_client(&self) -> Result<reqwest::Client, ArxivistError> {
    Ok(
      reqwest::Client::builder()
        .user_agent(concat!("arxivist/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(self.http.timeout_secs))
        .build()?,
    )
  }

  /// Builds every service client.
  pub fn clients(&self) -> Result<Clients, ArxivistError> {
    Ok(Clients::new(self.http_client()?, &self.endpoints(), self.credentials()))
  }
}
