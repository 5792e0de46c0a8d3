//! The paper record and helpers for arXiv identifiers.
//!
//! A [`Paper`] is built once from an arXiv Atom entry (see [`feed`](crate::feed)) and is never
//! mutated afterwards. Only its identifier outlives a session, as a bookmark.
//!
//! # Examples
//!
//! ```
//! use arxivist::paper;
//!
//! assert_eq!(paper::parse_identifier("https://arxiv.org/abs/2301.07041v2").unwrap(), "2301.07041v2");
//! assert_eq!(paper::parse_identifier("arXiv:math.AG/0601001").unwrap(), "math.AG/0601001");
//! assert!(paper::parse_identifier("not an id").is_err());
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::*;

lazy_static! {
  /// New-style identifiers, e.g. `2301.07041` or `2301.07041v3`
  static ref ARXIV_NEW: Regex = Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").unwrap();
  /// Old-style identifiers, e.g. `math.AG/0601001`
  static ref ARXIV_OLD: Regex = Regex::new(r"^[a-zA-Z-]+(\.[A-Z]{2})?/\d{7}(v\d+)?$").unwrap();
  /// Trailing version suffix
  static ref VERSION: Regex = Regex::new(r"v\d+$").unwrap();
}

/// A paper as returned by the arXiv API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
  /// arXiv identifier taken from the entry's `/abs/` URL, e.g. `2301.07041v1`
  pub id:          String,
  /// Title with whitespace collapsed
  pub title:       String,
  /// Author names in the order arXiv lists them
  pub authors:     Vec<String>,
  /// The abstract
  pub summary:     String,
  /// When the first version was submitted
  pub published:   DateTime<Utc>,
  /// When the latest version was submitted
  pub updated:     DateTime<Utc>,
  /// Direct link to the PDF
  pub pdf_url:     String,
  /// Category codes, never empty; the first one is the primary category
  pub categories:  Vec<String>,
  /// DOI of the published version, if the authors supplied one
  pub doi:         Option<String>,
  /// Free-form author comment, e.g. "12 pages, 3 figures"
  pub comment:     Option<String>,
  /// Journal reference of the published version
  pub journal_ref: Option<String>,
}

impl Paper {
  /// The primary category.
  pub fn primary_category(&self) -> &str {
    self.categories.first().map(String::as_str).unwrap_or_default()
  }

  /// The abstract; arXiv calls it the summary.
  pub fn abstract_text(&self) -> &str { &self.summary }

  /// The identifier without its version suffix.
  pub fn base_id(&self) -> &str { strip_version(&self.id) }

  /// Link to the paper's abstract page.
  pub fn abs_url(&self) -> String { format!("https://arxiv.org/abs/{}", self.id) }

  /// A BibTeX `@misc` entry built from arXiv metadata only.
  pub fn to_bibtex(&self) -> String {
    let key = format!(
      "{}{}{}",
      self
        .authors
        .first()
        .and_then(|a| a.split_whitespace().last())
        .unwrap_or("anon")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>(),
      self.published.format("%Y"),
      self.title.split_whitespace().next().unwrap_or_default().to_lowercase()
    )
    .chars()
    .filter(|c| c.is_ascii_alphanumeric())
    .collect::<String>();

    let mut entry = format!(
      "@misc{{{key},\n  title         = {{{}}},\n  author        = {{{}}},\n  year          = \
       {{{}}},\n  eprint        = {{{}}},\n  archivePrefix = {{arXiv}},\n  primaryClass  = {{{}}}",
      self.title,
      self.authors.join(" and "),
      self.published.format("%Y"),
      self.base_id(),
      self.primary_category(),
    );
    if let Some(doi) = &self.doi {
      entry.push_str(&format!(",\n  doi           = {{{doi}}}"));
    }
    entry.push_str("\n}");
    entry
  }
}

/// Normalizes user input into an arXiv identifier.
///
/// Accepts bare identifiers, `arXiv:`-prefixed identifiers and `arxiv.org` abstract or PDF URLs.
pub fn parse_identifier(input: &str) -> Result<String, ArxivistError> {
  let input = input.trim();

  if let Ok(url) = Url::parse(input) {
    if !url.scheme().starts_with("http") {
      return parse_identifier(input.split_once(':').map(|(_, rest)| rest).unwrap_or(input));
    }
    return match url.host_str() {
      Some("arxiv.org" | "www.arxiv.org" | "export.arxiv.org") =>
        id_from_url(input).ok_or(ArxivistError::InvalidIdentifier),
      _ => Err(ArxivistError::InvalidIdentifier),
    };
  }

  if ARXIV_NEW.is_match(input) || ARXIV_OLD.is_match(input) {
    Ok(input.to_string())
  } else {
    Err(ArxivistError::InvalidIdentifier)
  }
}

/// Extracts the identifier from an arXiv `/abs/` or `/pdf/` URL.
pub(crate) fn id_from_url(url: &str) -> Option<String> {
  let (_, tail) = url.split_once("/abs/").or_else(|| url.split_once("/pdf/"))?;
  let id = tail.trim_end_matches('/').trim_end_matches(".pdf");
  (!id.is_empty()).then(|| id.to_string())
}

/// Removes a trailing `vN` from an identifier.
pub fn strip_version(id: &str) -> &str {
  match VERSION.find(id) {
    Some(m) => &id[..m.start()],
    None => id,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::sample_paper;

  #[test]
  fn test_parse_identifier() {
    assert_eq!(parse_identifier("2301.07041").unwrap(), "2301.07041");
    assert_eq!(parse_identifier(" 2301.07041v3 ").unwrap(), "2301.07041v3");
    assert_eq!(parse_identifier("math.AG/0601001").unwrap(), "math.AG/0601001");
    assert_eq!(parse_identifier("arXiv:2301.07041").unwrap(), "2301.07041");
    assert_eq!(parse_identifier("https://arxiv.org/abs/2301.07041").unwrap(), "2301.07041");
    assert_eq!(parse_identifier("https://arxiv.org/pdf/2301.07041v1.pdf").unwrap(), "2301.07041v1");
    assert!(parse_identifier("https://eprint.iacr.org/2016/260").is_err());
    assert!(parse_identifier("10.1145/1327452.1327492").is_err());
  }

  #[test]
  fn test_strip_version() {
    assert_eq!(strip_version("2301.07041v12"), "2301.07041");
    assert_eq!(strip_version("2301.07041"), "2301.07041");
    assert_eq!(strip_version("math.AG/0601001v1"), "math.AG/0601001");
  }

  #[test]
  fn test_derived_accessors() {
    let paper = sample_paper();
    assert_eq!(paper.primary_category(), "cs.CR");
    assert_eq!(paper.abstract_text(), paper.summary);
    assert_eq!(paper.base_id(), "2301.07041");
    assert_eq!(paper.abs_url(), "https://arxiv.org/abs/2301.07041v2");
  }

  #[test]
  fn test_bibtex() {
    let mut paper = sample_paper();
    paper.doi = Some("10.1000/xyz".into());
    let bib = paper.to_bibtex();
    assert!(bib.starts_with("@misc{viand2023verifiable,"));
    assert!(bib.contains("author        = {Alexander Viand and Christian Knabenhans}"));
    assert!(bib.contains("eprint        = {2301.07041}"));
    assert!(bib.contains("primaryClass  = {cs.CR}"));
    assert!(bib.contains("doi           = {10.1000/xyz}"));
    assert!(bib.ends_with("\n}"));
  }
}
