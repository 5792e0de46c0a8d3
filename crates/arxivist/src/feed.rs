//! Streaming parser for arXiv's Atom responses.
//!
//! The parser walks the document with a `quick-xml` event reader and builds one [`Paper`] per
//! `<entry>`. Entries that are missing required data are skipped with a warning rather than
//! failing the whole document; a document that isn't well-formed XML or has no `<feed>` root
//! fails as a whole.
//!
//! Required per entry: `id`, `title`, `summary`, `published`, `updated` and at least one
//! `category`. Optional: `arxiv:doi`, `arxiv:comment` and `arxiv:journal_ref`. An optional
//! element that is present but blank is treated the same as an absent one, and so is a blank
//! `title` or `summary`. A missing PDF link is derived from the abstract URL.
//!
//! # Examples
//!
//! ```
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
//! assert!(arxivist::feed::parse_feed(xml).unwrap().is_empty());
//! ```

use quick_xml::{
  events::{BytesStart, Event},
  Reader,
};

use super::*;

/// Elements inside an entry whose text content we keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Id,
  Title,
  Summary,
  Published,
  Updated,
  AuthorName,
  Doi,
  Comment,
  JournalRef,
}

/// Raw values collected while inside an `<entry>`.
#[derive(Debug, Default)]
struct EntryFields {
  /// Canonical abstract URL
  id:               Option<String>,
  /// Raw title text
  title:            Option<String>,
  /// Raw summary text
  summary:          Option<String>,
  /// RFC 3339 timestamp of the first version
  published:        Option<String>,
  /// RFC 3339 timestamp of the latest version
  updated:          Option<String>,
  /// Author names in document order
  authors:          Vec<String>,
  /// `href` of the link titled `pdf`
  pdf_url:          Option<String>,
  /// `term`s of the `category` elements in document order
  categories:       Vec<String>,
  /// `term` of `arxiv:primary_category`
  primary_category: Option<String>,
  /// `arxiv:doi`
  doi:              Option<String>,
  /// `arxiv:comment`
  comment:          Option<String>,
  /// `arxiv:journal_ref`
  journal_ref:      Option<String>,
}

impl EntryFields {
  /// Stores the text of a finished element.
  fn set(&mut self, field: Field, text: String) {
    match field {
      Field::Id => self.id = Some(text),
      Field::Title => self.title = Some(text),
      Field::Summary => self.summary = Some(text),
      Field::Published => self.published = Some(text),
      Field::Updated => self.updated = Some(text),
      Field::AuthorName => self.authors.push(collapse_whitespace(&text)),
      Field::Doi => self.doi = optional(text, "arxiv:doi"),
      Field::Comment => self.comment = optional(text, "arxiv:comment"),
      Field::JournalRef => self.journal_ref = optional(text, "arxiv:journal_ref"),
    }
  }

  /// Picks up data carried in attributes (`link`, `category`, `arxiv:primary_category`).
  fn absorb_attributes(&mut self, e: &BytesStart<'_>) {
    match e.name().as_ref() {
      b"link" => {
        let is_pdf = attribute(e, b"title").as_deref() == Some("pdf")
          || attribute(e, b"type").as_deref() == Some("application/pdf");
        if is_pdf {
          self.pdf_url = attribute(e, b"href");
        }
      },
      b"category" =>
        if let Some(term) = attribute(e, b"term").filter(|t| !t.trim().is_empty()) {
          self.categories.push(term.trim().to_string());
        },
      b"arxiv:primary_category" => self.primary_category = attribute(e, b"term"),
      _ => {},
    }
  }

  /// Converts the collected values into a [`Paper`], or explains why the entry is unusable.
  fn into_paper(self) -> Result<Paper, String> {
    let url = self.id.ok_or("missing <id>")?;
    let id = paper::id_from_url(url.trim()).ok_or_else(|| format!("unrecognised id {url:?}"))?;
    let title = self.title.filter(|t| !t.trim().is_empty()).ok_or("missing <title>")?;
    let summary = self.summary.filter(|s| !s.trim().is_empty()).ok_or("missing <summary>")?;
    let published = timestamp(self.published.as_deref(), "published")?;
    let updated = timestamp(self.updated.as_deref(), "updated")?;

    let mut categories = self.categories;
    if categories.is_empty() {
      return Err("no <category> elements".into());
    }
    if let Some(primary) = self.primary_category {
      if let Some(pos) = categories.iter().position(|c| *c == primary) {
        let primary = categories.remove(pos);
        categories.insert(0, primary);
      }
    }

    let pdf_url = self
      .pdf_url
      .filter(|href| !href.trim().is_empty())
      .unwrap_or_else(|| url.trim().replace("/abs/", "/pdf/"));

    Ok(Paper {
      id,
      title: collapse_whitespace(&title),
      authors: self.authors,
      summary: collapse_whitespace(&summary),
      published,
      updated,
      pdf_url,
      categories,
      doi: self.doi,
      comment: self.comment,
      journal_ref: self.journal_ref,
    })
  }
}

/// Parses an arXiv Atom document into papers, skipping malformed entries.
///
/// # Errors
///
/// - [`ArxivistError::MalformedResponse`] if the document isn't well-formed or has no `<feed>`
/// - [`ArxivistError::ApiError`] if arXiv answered with its error entry
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>, ArxivistError> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut papers = Vec::new();
  let mut saw_feed = false;
  let mut entry: Option<EntryFields> = None;
  let mut in_author = false;
  let mut current: Option<Field> = None;
  let mut text = String::new();

  loop {
    let event = reader.read_event().map_err(|e| {
      ArxivistError::MalformedResponse(format!(
        "invalid XML at byte {}: {e}",
        reader.buffer_position()
      ))
    })?;

    match event {
      Event::Start(e) => match e.name().as_ref() {
        b"feed" => saw_feed = true,
        b"entry" => entry = Some(EntryFields::default()),
        b"author" if entry.is_some() => in_author = true,
        tag =>
          if let Some(fields) = entry.as_mut() {
            fields.absorb_attributes(&e);
            current = field_for(tag, in_author);
            text.clear();
          },
      },
      Event::Empty(e) =>
        if let Some(fields) = entry.as_mut() {
          fields.absorb_attributes(&e);
        },
      Event::Text(t) if current.is_some() => {
        let unescaped = t
          .unescape()
          .map_err(|e| ArxivistError::MalformedResponse(format!("bad text content: {e}")))?;
        text.push_str(&unescaped);
      },
      Event::CData(c) if current.is_some() => text.push_str(&String::from_utf8_lossy(&c)),
      Event::End(e) => match e.name().as_ref() {
        b"entry" =>
          if let Some(fields) = entry.take() {
            if fields.id.as_deref().is_some_and(|id| id.contains("/api/errors")) {
              let message = fields.summary.unwrap_or_else(|| "unknown arXiv error".into());
              return Err(ArxivistError::ApiError(collapse_whitespace(&message)));
            }
            match fields.into_paper() {
              Ok(paper) => papers.push(paper),
              Err(reason) => warn!("Skipping malformed arXiv entry: {reason}"),
            }
          },
        b"author" => in_author = false,
        _ =>
          if let (Some(field), Some(fields)) = (current.take(), entry.as_mut()) {
            fields.set(field, std::mem::take(&mut text));
          },
      },
      Event::Eof => break,
      _ => {},
    }
  }

  if !saw_feed {
    return Err(ArxivistError::MalformedResponse("document has no <feed> element".into()));
  }

  debug!("Parsed {} papers from arXiv feed", papers.len());
  Ok(papers)
}

/// Which field, if any, an element inside an entry maps to.
fn field_for(tag: &[u8], in_author: bool) -> Option<Field> {
  match tag {
    b"name" if in_author => Some(Field::AuthorName),
    _ if in_author => None,
    b"id" => Some(Field::Id),
    b"title" => Some(Field::Title),
    b"summary" => Some(Field::Summary),
    b"published" => Some(Field::Published),
    b"updated" => Some(Field::Updated),
    b"arxiv:doi" => Some(Field::Doi),
    b"arxiv:comment" => Some(Field::Comment),
    b"arxiv:journal_ref" => Some(Field::JournalRef),
    _ => None,
  }
}

/// Reads an attribute value by its qualified name.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
  e.attributes()
    .flatten()
    .find(|attr| attr.key.as_ref() == key)
    .and_then(|attr| attr.unescape_value().ok())
    .map(|value| value.into_owned())
}

/// Optional elements that are present but blank count as absent.
fn optional(text: String, element: &str) -> Option<String> {
  let trimmed = collapse_whitespace(&text);
  if trimmed.is_empty() {
    trace!("Ignoring empty <{element}>");
    None
  } else {
    Some(trimmed)
  }
}

/// Parses a required RFC 3339 timestamp.
fn timestamp(value: Option<&str>, element: &str) -> Result<DateTime<Utc>, String> {
  let value = value.ok_or_else(|| format!("missing <{element}>"))?;
  DateTime::parse_from_rfc3339(value.trim())
    .map(|t| t.with_timezone(&Utc))
    .map_err(|e| format!("bad <{element}> {value:?}: {e}"))
}

/// Collapses runs of whitespace (arXiv hard-wraps titles and abstracts) into single spaces.
fn collapse_whitespace(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }
