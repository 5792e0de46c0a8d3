//! Local cache of downloaded PDFs.
//!
//! Files are named `{id}_{slug}.pdf` where `/` in old-style identifiers becomes `_` and the slug
//! is a shortened, lowercase version of the title:
//!
//! ```
//! use arxivist::pdf;
//!
//! assert_eq!(pdf::slug("Attention Is All You Need", 20), "attention_is_all_you");
//! assert_eq!(pdf::slug("  No    Extra: Spaces!  ", 50), "no_extra_spaces");
//! ```
//!
//! A PDF is downloaded the first time it is asked for; later calls return the file on disk.

use tokio::io::AsyncWriteExt;

use super::*;
use crate::clients::check_status;

/// Longest title slug used in a file name.
pub const MAX_SLUG_LEN: usize = 50;

/// Turns a title into a filesystem-friendly slug of at most `max_length` bytes.
///
/// The result is lowercase ASCII alphanumerics joined by single underscores. It is truncated at
/// a word boundary; a single word longer than `max_length` yields an empty slug.
pub fn slug(title: &str, max_length: usize) -> String {
  let words = title
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(str::to_ascii_lowercase);

  let mut result = String::new();
  for word in words {
    let extra = if result.is_empty() { word.len() } else { word.len() + 1 };
    if result.len() + extra > max_length {
      break;
    }
    if !result.is_empty() {
      result.push('_');
    }
    result.push_str(&word);
  }
  result
}

/// File name used for `paper` in the cache.
pub fn file_name(paper: &Paper) -> String {
  let id = paper.id.replace('/', "_");
  match slug(&paper.title, MAX_SLUG_LEN) {
    s if s.is_empty() => format!("{id}.pdf"),
    s => format!("{id}_{s}.pdf"),
  }
}

/// A directory of downloaded PDFs.
#[derive(Debug, Clone)]
pub struct PdfCache {
  /// Where files are stored
  dir:    PathBuf,
  /// Client used for downloads
  client: reqwest::Client,
}

impl PdfCache {
  /// A cache in `dir`, which is created on first download.
  pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into(), client }
  }

  /// The directory used when none is configured.
  pub fn default_dir() -> PathBuf { std::env::temp_dir().join("arxivist") }

  /// The cache directory.
  pub fn dir(&self) -> &Path { &self.dir }

  /// Where `paper` is, or would be, stored.
  pub fn path_for(&self, paper: &Paper) -> PathBuf { self.dir.join(file_name(paper)) }

  /// Returns the local path of `paper`'s PDF, downloading it if it isn't cached yet.
  ///
  /// The body is written to a temporary file first and renamed into place, so an interrupted
  /// download never leaves a truncated PDF behind.
  pub async fn fetch(&self, paper: &Paper) -> Result<PathBuf, ArxivistError> {
    let path = self.path_for(paper);
    if tokio::fs::try_exists(&path).await? {
      debug!("PDF for {} already cached at {}", paper.id, path.display());
      return Ok(path);
    }

    tokio::fs::create_dir_all(&self.dir).await?;
    debug!("Downloading PDF via: {}", paper.pdf_url);
    let response = check_status(self.client.get(&paper.pdf_url).send().await?)?;
    let bytes = response.bytes().await?;
    trace!("Downloaded {} bytes for {}", bytes.len(), paper.id);

    let partial = path.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);
    tokio::fs::rename(&partial, &path).await?;

    Ok(path)
  }
}
