//! Terminal rendering of papers, comment threads and view states.

use arxivist::{
  category,
  clients::citation::Citation,
  comments::{Comment, Vote},
  paper::Paper,
  state::ViewState,
};
use console::{style, Emoji};

use crate::errors::ArxivistCliError;

pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
pub static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
pub static PAPER: Emoji<'_, '_> = Emoji("📄 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");
pub static SPEECH: Emoji<'_, '_> = Emoji("💬 ", "");
pub static STAR: Emoji<'_, '_> = Emoji("★ ", "* ");

/// Abstract previews are cut after this many characters.
const PREVIEW_LEN: usize = 160;

/// Prints a list of papers, or the message for an empty or failed load.
///
/// `is_bookmarked` decides which entries get a bookmark marker.
pub fn papers(
  state: &ViewState<Vec<Paper>>,
  empty_message: &str,
  is_bookmarked: impl Fn(&Paper) -> bool,
) -> Result<(), ArxivistCliError> {
  match state {
    ViewState::Loading => println!("{} Loading...", style(LOOKING_GLASS).cyan()),
    ViewState::Empty => println!("{} {}", style(WARNING).yellow(), empty_message),
    ViewState::Failed(message) => {
      println!("{} {}", style(WARNING).red(), style(message).red());
      println!("   Run the command again to retry.");
      return Err(ArxivistCliError::Failed(message.clone()));
    },
    ViewState::Ready(papers) => {
      println!("\n{} {} papers:", style(SUCCESS).green(), style(papers.len()).yellow());
      for (i, paper) in papers.iter().enumerate() {
        let marker = if is_bookmarked(paper) { style(STAR).yellow().to_string() } else { String::new() };
        println!("\n{}. {}{}", style(i + 1).yellow(), marker, style(&paper.title).white().bold());
        println!("   {} {}", style("Authors:").green(), authors(paper));
        println!(
          "   {} {} {} {}",
          style("arXiv:").green(),
          style(&paper.id).yellow(),
          style(paper.primary_category()).cyan(),
          style(paper.published.format("%Y-%m-%d")).dim()
        );
        println!("   {} {}", style("Abstract:").green(), style(preview(paper.abstract_text())).italic());
      }
    },
  }
  Ok(())
}

/// Prints everything known about one paper.
pub fn paper_details(paper: &Paper, bookmarked: bool, comment_count: Option<u64>) {
  println!("\n{} {}", style(PAPER).green(), style(&paper.title).white().bold());
  println!("   {} {}", style("Authors:").green().bold(), authors(paper));
  println!("   {} {}", style("arXiv:").green().bold(), style(&paper.id).yellow());
  println!(
    "   {} {}",
    style("Categories:").green().bold(),
    paper
      .categories
      .iter()
      .map(|code| match category::topic_for_code(code) {
        Some(topic) => format!("{code} ({topic})"),
        None => code.clone(),
      })
      .collect::<Vec<_>>()
      .join(", ")
  );
  println!("   {} {}", style("Published:").green().bold(), paper.published.format("%Y-%m-%d %H:%M UTC"));
  if paper.updated != paper.published {
    println!("   {} {}", style("Updated:").green().bold(), paper.updated.format("%Y-%m-%d %H:%M UTC"));
  }
  if let Some(doi) = &paper.doi {
    println!("   {} {}", style("DOI:").green().bold(), style(doi).blue().underlined());
  }
  if let Some(journal_ref) = &paper.journal_ref {
    println!("   {} {}", style("Journal:").green().bold(), journal_ref);
  }
  if let Some(comment) = &paper.comment {
    println!("   {} {}", style("Comment:").green().bold(), style(comment).italic());
  }
  println!("   {} {}", style("PDF URL:").green().bold(), style(&paper.pdf_url).blue().underlined());
  println!("   {} {}", style("Bookmarked:").green().bold(), if bookmarked { "yes" } else { "no" });
  if let Some(count) = comment_count {
    println!("   {} {}", style("Comments:").green().bold(), count);
  }
  println!("\n{}", paper.abstract_text());
}

/// Prints a comment thread with one level of replies.
pub fn comment_thread(roots: &[Comment], user_id: &str) {
  if roots.is_empty() {
    println!("{} No comments yet", style(SPEECH).cyan());
    return;
  }
  for root in roots {
    comment(root, user_id, 0);
    for reply in &root.replies {
      comment(reply, user_id, 1);
    }
  }
}

/// Prints one comment, indented by `depth`.
fn comment(comment: &Comment, user_id: &str, depth: usize) {
  let indent = "    ".repeat(depth);
  let vote = match comment.vote_of(user_id) {
    Vote::Up => style("▲").green().to_string(),
    Vote::Down => style("▼").red().to_string(),
    Vote::None => " ".to_string(),
  };
  println!(
    "\n{indent}{} {} {} {}",
    style(&comment.user_name).cyan().bold(),
    style(comment.created_at.format("%Y-%m-%d %H:%M")).dim(),
    style(format!("[{:+}]", comment.score())).yellow(),
    vote
  );
  for line in comment.content.lines() {
    println!("{indent}  {line}");
  }
  println!("{indent}  {}", style(format!("id: {}", comment.id)).dim());
}

/// Prints a Crossref citation.
pub fn citation(citation: &Citation) {
  println!("\n{} {}", style(BOOKS).cyan(), citation.format());
  println!("   {} {}", style("Cited by:").green().bold(), citation.citation_count);
}

/// Author names joined for display.
fn authors(paper: &Paper) -> String {
  if paper.authors.is_empty() {
    style("No authors listed").red().italic().to_string()
  } else {
    style(paper.authors.join(", ")).white().to_string()
  }
}

/// First few words of an abstract.
fn preview(text: &str) -> String {
  if text.chars().count() > PREVIEW_LEN {
    format!("{}...", text.chars().take(PREVIEW_LEN).collect::<String>().trim_end())
  } else {
    text.to_string()
  }
}
