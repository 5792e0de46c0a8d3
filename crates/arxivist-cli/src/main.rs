use std::path::{Path, PathBuf};

use arxivist::{
  aggregator::Feed,
  bookmarks::BookmarkCache,
  category,
  clients::{
    arxiv::{SearchQuery, SortBy, SortOrder},
    assistant::ChatSession,
    Clients,
  },
  comments::{CommentCounts, CommentSession, Vote},
  config::Config,
  database::Database,
  paper::{self, Paper},
  pdf::PdfCache,
  state::ViewState,
  store::PreferenceStore,
};
use clap::{builder::ArgAction, Parser, Subcommand, ValueEnum};
use console::style;
use errors::ArxivistCliError;
use render::{BOOKS, LOOKING_GLASS, ROCKET, SAVE, SPEECH, SUCCESS, WARNING};
use tracing::{debug, trace, warn};
use tracing_subscriber::EnvFilter;

pub mod errors;
mod render;

#[derive(Parser)]
#[command(author, version, about = "Browse, bookmark and discuss arXiv papers from the terminal")]
struct Cli {
  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the database file
  #[arg(long, short, global = true)]
  path: Option<PathBuf>,

  /// Act as this user instead of the configured one
  #[arg(long, global = true)]
  user: Option<String>,

  /// Skip every confirmation prompt and accept the default answer
  #[arg(long, global = true)]
  accept_defaults: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Initialize a new arxivist database
  Init,
  /// Removes the entire database
  Clean,
  /// List the topics that can be followed
  Topics,
  /// Choose the topics your feed is built from
  Onboard {
    /// Topics to follow; prompts with a checklist when omitted
    topics: Vec<String>,
  },
  /// Show the newest papers across your topics
  Feed {
    /// Papers per topic
    #[arg(long, short = 'n')]
    per_category: Option<usize>,
  },
  /// Search arXiv
  Search {
    /// Search terms, or a raw arXiv query with --raw
    #[arg(required = true)]
    query:       Vec<String>,
    /// Pass the query to arXiv unchanged, e.g. `au:viand AND cat:cs.CR`
    #[arg(long)]
    raw:         bool,
    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = 10)]
    max_results: usize,
    /// Sort by relevance, updated or submitted
    #[arg(long, default_value = "relevance")]
    sort:        String,
  },
  /// Show a paper's details
  Show {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Manage bookmarks
  #[command(subcommand)]
  Bookmark(BookmarkCommand),
  /// Read and write comments on a paper
  #[command(subcommand)]
  Comments(CommentsCommand),
  /// Show comment counts for papers
  Counts {
    /// arXiv identifiers
    #[arg(required = true)]
    identifiers: Vec<String>,
  },
  /// Ask the assistant for a summary of a paper
  Summarize {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Chat with the assistant about a paper
  Chat {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Download a paper's PDF
  Pdf {
    /// arXiv identifier or URL
    identifier: String,
    /// Directory to store the PDF in
    #[arg(long)]
    dir:        Option<PathBuf>,
  },
  /// Print citation information for a paper
  Cite {
    /// arXiv identifier or URL
    identifier: String,
  },
}

#[derive(Subcommand)]
enum BookmarkCommand {
  /// Bookmark a paper
  Add {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Remove a bookmark
  Remove {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Show bookmarked papers
  List,
  /// Print bookmarked identifiers, newest first, without contacting arXiv
  Ids,
}

#[derive(Subcommand)]
enum CommentsCommand {
  /// Show the comment thread of a paper
  List {
    /// arXiv identifier or URL
    identifier: String,
  },
  /// Post a comment, or a reply with --reply-to
  Add {
    /// arXiv identifier or URL
    identifier: String,
    /// Comment text
    content:    String,
    /// Comment to reply to
    #[arg(long)]
    reply_to:   Option<String>,
  },
  /// Press the up or down vote button on a comment
  Vote {
    /// arXiv identifier or URL
    identifier: String,
    /// Comment id
    comment:    String,
    /// Which button
    #[arg(value_enum)]
    direction:  Direction,
  },
  /// Delete a comment
  Delete {
    /// arXiv identifier or URL
    identifier: String,
    /// Comment id
    comment:    String,
  },
}

/// Vote buttons.
#[derive(Clone, Copy, ValueEnum)]
enum Direction {
  Up,
  Down,
}

impl From<Direction> for Vote {
  fn from(direction: Direction) -> Self {
    match direction {
      Direction::Up => Vote::Up,
      Direction::Down => Vote::Down,
    }
  }
}

/// Setup logging with the specified verbosity level
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .with_writer(std::io::stderr)
    .init();
}

/// Everything a command needs, resolved from the config file and global flags.
struct Context {
  config:          Config,
  accept_defaults: bool,
}

impl Context {
  fn new(cli: &Cli) -> Result<Self, ArxivistCliError> {
    let mut config = Config::load()?;
    if let Some(path) = &cli.path {
      config.database.path = Some(path.clone());
    }
    if let Some(user) = &cli.user {
      config.user.id = user.clone();
    }
    debug!("Acting as user {}", config.user.id);
    Ok(Self { config, accept_defaults: cli.accept_defaults })
  }

  fn user_id(&self) -> &str { &self.config.user.id }

  async fn database(&self) -> Result<Database, ArxivistCliError> {
    let path = self.config.database_path();
    trace!("Using database at: {}", path.display());
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&path).await?)
  }

  fn clients(&self) -> Result<Clients, ArxivistCliError> { Ok(self.config.clients()?) }

  /// Asks a yes/no question, answering `default` without prompting under --accept-defaults.
  fn confirm(&self, prompt: &str, default: bool) -> Result<bool, ArxivistCliError> {
    if self.accept_defaults {
      return Ok(default);
    }
    Ok(dialoguer::Confirm::new().with_prompt(prompt).default(default).interact()?)
  }

  /// Asks the user to type `word`; always passes under --accept-defaults.
  fn type_to_confirm(&self, word: &str, action: &str) -> Result<bool, ArxivistCliError> {
    if self.accept_defaults {
      return Ok(true);
    }
    let input = dialoguer::Input::<String>::new()
      .with_prompt(format!(
        "{} Type {} to confirm {action}",
        style("⚠️").red(),
        style(word).red().bold()
      ))
      .interact_text()?;
    Ok(input == word)
  }
}

#[tokio::main]
async fn main() -> Result<(), ArxivistCliError> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let ctx = Context::new(&cli)?;
  let result = run(cli.command, &ctx).await;

  if let Err(ArxivistCliError::Arxivist(e)) = &result {
    if e.is_auth_error() {
      println!("{} {}", style(WARNING).red(), e);
      println!(
        "   Set {} or {} in {} to sign in.",
        style(arxivist::config::TOKEN_ENV).yellow(),
        style("user.token").yellow(),
        style(Config::path().display()).yellow()
      );
    }
  }
  result
}

async fn run(command: Commands, ctx: &Context) -> Result<(), ArxivistCliError> {
  match command {
    Commands::Init => init(ctx).await,
    Commands::Clean => clean(ctx),
    Commands::Topics => {
      println!("{} Topics you can follow:\n", style(BOOKS).cyan());
      for topic in category::topics() {
        let code = category::map_to_code(topic);
        println!("   {:<32} {}", style(topic).white(), style(code).cyan());
      }
      Ok(())
    },
    Commands::Onboard { topics } => onboard(ctx, topics).await,
    Commands::Feed { per_category } => feed(ctx, per_category).await,
    Commands::Search { query, raw, max_results, sort } => {
      let terms = query.join(" ");
      let sort_by: SortBy = sort.parse()?;
      let mut query =
        SearchQuery::text(&terms).max_results(max_results).sort(sort_by, SortOrder::Descending);
      if raw {
        query.search = terms.clone();
      }
      debug!("Search query: {query:?}");

      println!("{} Searching arXiv for: {}", style(LOOKING_GLASS).cyan(), style(&terms).yellow());
      let db = ctx.database().await?;
      let bookmarks = BookmarkCache::load(&db, ctx.user_id()).await?;
      let clients = ctx.clients()?;
      let state = ViewState::from_result(clients.arxiv.search(&query).await);
      render::papers(&state, &format!("No papers found matching: {terms}"), |p| {
        bookmarks.contains(p.base_id()) || bookmarks.contains(&p.id)
      })
    },
    Commands::Show { identifier } => {
      let clients = ctx.clients()?;
      let paper = fetch(&clients, &identifier).await?;
      let db = ctx.database().await?;
      let bookmarks = BookmarkCache::load(&db, ctx.user_id()).await?;

      let mut counts = CommentCounts::default();
      let ids = vec![paper.base_id().to_string()];
      let comment_count = match counts.refresh(&clients.comments, &ids).await {
        Ok(()) => Some(counts.get(paper.base_id())),
        Err(e) => {
          warn!("Could not load comment count: {e}");
          None
        },
      };
      render::paper_details(&paper, bookmarks.contains(paper.base_id()), comment_count);
      Ok(())
    },
    Commands::Bookmark(command) => bookmark(ctx, command).await,
    Commands::Comments(command) => comments(ctx, command).await,
    Commands::Counts { identifiers } => {
      let ids = identifiers
        .iter()
        .map(|id| paper::parse_identifier(id).map(|id| paper::strip_version(&id).to_string()))
        .collect::<Result<Vec<_>, _>>()?;
      let clients = ctx.clients()?;
      let mut counts = CommentCounts::default();
      counts.refresh(&clients.comments, &ids).await?;
      for id in &ids {
        println!("   {:<20} {} {}", style(id).yellow(), style(SPEECH).cyan(), counts.get(id));
      }
      Ok(())
    },
    Commands::Summarize { identifier } => {
      let clients = ctx.clients()?;
      let paper = fetch(&clients, &identifier).await?;
      println!("{} Summarizing: {}", style(ROCKET).cyan(), style(&paper.title).white().bold());
      let summary = clients.assistant.summarize(&paper).await?;
      println!("\n{summary}");
      Ok(())
    },
    Commands::Chat { identifier } => chat(ctx, &identifier).await,
    Commands::Pdf { identifier, dir } => {
      let clients = ctx.clients()?;
      let paper = fetch(&clients, &identifier).await?;
      let cache =
        PdfCache::new(ctx.config.http_client()?, dir.unwrap_or_else(PdfCache::default_dir));
      let path = cache.fetch(&paper).await?;
      println!("{} PDF saved to: {}", style(SAVE).green(), style(path.display()).yellow());
      Ok(())
    },
    Commands::Cite { identifier } => {
      let clients = ctx.clients()?;
      let paper = fetch(&clients, &identifier).await?;
      println!("{}", paper.to_bibtex());
      match &paper.doi {
        Some(doi) => match clients.citation.lookup(doi).await {
          Ok(citation) => render::citation(&citation),
          Err(e) => warn!("Crossref lookup for {doi} failed: {e}"),
        },
        None => debug!("{} has no DOI, skipping Crossref", paper.id),
      }
      Ok(())
    },
  }
}

/// Fetches a paper, telling the user what is being looked up.
async fn fetch(clients: &Clients, identifier: &str) -> Result<Paper, ArxivistCliError> {
  println!("{} Fetching paper: {}", style(LOOKING_GLASS).cyan(), style(identifier).yellow());
  let paper = clients.arxiv.fetch_paper(identifier).await?;
  debug!("Paper details: {:?}", paper);
  Ok(paper)
}

/// Deletes the database file and its SQLite side files.
fn remove_database_files(path: &Path) -> Result<(), ArxivistCliError> {
  std::fs::remove_file(path)?;
  let pattern = format!("{}-*", glob::Pattern::escape(&path.display().to_string()));
  for file in glob::glob(&pattern)?.flatten() {
    trace!("Removing {}", file.display());
    std::fs::remove_file(file)?;
  }
  Ok(())
}

async fn init(ctx: &Context) -> Result<(), ArxivistCliError> {
  let path = ctx.config.database_path();
  if ctx.config.database.path.is_none() {
    println!(
      "{} Using default database path: {}",
      style(BOOKS).cyan(),
      style(path.display()).yellow()
    );
  }

  if path.exists() {
    println!(
      "{} Database already exists at: {}",
      style(WARNING).yellow(),
      style(path.display()).yellow()
    );

    if !ctx.confirm(
      "Do you want to reinitialize this database? This will erase all bookmarks and preferences",
      ctx.accept_defaults,
    )? {
      println!("{} Keeping existing database", style("ℹ").blue());
      return Ok(());
    }
    if !ctx.type_to_confirm("INIT", "reinitialization")? {
      println!("{} Operation cancelled, keeping existing database", style("ℹ").blue());
      return Ok(());
    }

    println!("{} Removing existing database", style(WARNING).yellow());
    remove_database_files(&path)?;
  }

  println!("{} Initializing database at: {}", style(ROCKET).cyan(), style(path.display()).yellow());
  ctx.database().await?;

  let config_path = Config::path();
  if !config_path.exists() && ctx.confirm("Write a default config file?", false)? {
    ctx.config.save_to(&config_path)?;
    println!("{} Wrote config to: {}", style(SAVE).green(), style(config_path.display()).yellow());
  }

  println!("{} Database initialized successfully!", style(SUCCESS).green());
  Ok(())
}

fn clean(ctx: &Context) -> Result<(), ArxivistCliError> {
  let path = ctx.config.database_path();
  if !path.exists() {
    println!("{} No database found at: {}", style(WARNING).yellow(), style(path.display()).yellow());
    return Ok(());
  }

  println!("{} Database found at: {}", style(WARNING).yellow(), style(path.display()).yellow());
  if !ctx.confirm("Are you sure you want to delete this database?", ctx.accept_defaults)?
    || !ctx.type_to_confirm("DELETE", "deletion")?
  {
    println!("{} Operation cancelled", style("✖").red());
    return Ok(());
  }

  println!("{} Removing database: {}", style(WARNING).yellow(), style(path.display()).yellow());
  remove_database_files(&path)?;
  println!("{} Database files cleaned", style(SUCCESS).green());
  Ok(())
}

async fn onboard(ctx: &Context, topics: Vec<String>) -> Result<(), ArxivistCliError> {
  let db = ctx.database().await?;
  let current = db.preferences(ctx.user_id()).await?.map(|p| p.topics).unwrap_or_default();

  let chosen = if !topics.is_empty() {
    for topic in &topics {
      if category::lookup(topic).is_none() {
        println!(
          "{} {} is not a known topic; it will be used as a category code",
          style(WARNING).yellow(),
          style(topic).yellow()
        );
      }
    }
    topics
  } else if ctx.accept_defaults {
    return Err(ArxivistCliError::Usage("pass the topics to follow as arguments".into()));
  } else {
    let all: Vec<&str> = category::topics().collect();
    let defaults: Vec<bool> =
      all.iter().map(|t| current.iter().any(|c| c.eq_ignore_ascii_case(t))).collect();
    let picked = dialoguer::MultiSelect::new()
      .with_prompt("Pick the topics to follow (space to select, enter to confirm)")
      .items(&all)
      .defaults(&defaults)
      .interact()?;
    picked.into_iter().map(|i| all[i].to_string()).collect()
  };

  db.save_preferences(ctx.user_id(), &chosen).await?;
  let saved = db.preferences(ctx.user_id()).await?.map(|p| p.topics).unwrap_or_default();
  if saved.is_empty() {
    println!("{} No topics selected; your feed will stay empty", style(WARNING).yellow());
  } else {
    println!("{} Following: {}", style(SUCCESS).green(), style(saved.join(", ")).white());
  }
  Ok(())
}

async fn feed(ctx: &Context, per_category: Option<usize>) -> Result<(), ArxivistCliError> {
  let db = ctx.database().await?;
  let clients = ctx.clients()?;
  let aggregator =
    clients.aggregator(&db, per_category.unwrap_or(ctx.config.feed.per_category));

  let state = match aggregator.fetch_for_preferences(ctx.user_id()).await {
    Ok(Feed::NeedsOnboarding) => {
      println!(
        "{} You are not following any topics yet. Run {} to pick some.",
        style(WARNING).yellow(),
        style("arxivist onboard").cyan()
      );
      return Ok(());
    },
    Ok(Feed::Papers(papers)) => ViewState::from_result(Ok(papers)),
    Err(e) => ViewState::from_result(Err(e)),
  };

  let bookmarks = BookmarkCache::load(&db, ctx.user_id()).await?;
  render::papers(&state, "No new papers in your topics", |p| bookmarks.contains(p.base_id()))
}

async fn bookmark(ctx: &Context, command: BookmarkCommand) -> Result<(), ArxivistCliError> {
  let db = ctx.database().await?;
  let mut bookmarks = BookmarkCache::load(&db, ctx.user_id()).await?;

  match command {
    BookmarkCommand::Add { identifier } => {
      let id = paper::strip_version(&paper::parse_identifier(&identifier)?).to_string();
      if bookmarks.contains(&id) {
        println!("{} {} is already bookmarked", style("ℹ").blue(), style(&id).yellow());
      } else {
        bookmarks.add(&id).await?;
        println!("{} Bookmarked {}", style(SAVE).green(), style(&id).yellow());
      }
    },
    BookmarkCommand::Remove { identifier } => {
      let id = paper::strip_version(&paper::parse_identifier(&identifier)?).to_string();
      if bookmarks.contains(&id) {
        bookmarks.remove(&id).await?;
        println!("{} Removed bookmark {}", style(SUCCESS).green(), style(&id).yellow());
      } else {
        println!("{} {} is not bookmarked", style(WARNING).yellow(), style(&id).yellow());
      }
    },
    BookmarkCommand::List => {
      let clients = ctx.clients()?;
      let state = ViewState::from_result(bookmarks.papers(&clients.arxiv).await);
      render::papers(&state, "No bookmarks yet", |_| true)?;
    },
    BookmarkCommand::Ids =>
      for id in bookmarks.ids() {
        println!("{id}");
      },
  }
  Ok(())
}

async fn comments(ctx: &Context, command: CommentsCommand) -> Result<(), ArxivistCliError> {
  let clients = ctx.clients()?;
  let user_id = ctx.user_id().to_string();
  let thread_id = |identifier: &str| {
    paper::parse_identifier(identifier).map(|id| paper::strip_version(&id).to_string())
  };

  match command {
    CommentsCommand::List { identifier } => {
      let session = CommentSession::load(&clients.comments, thread_id(&identifier)?).await?;
      render::comment_thread(session.roots(), &user_id);
    },
    CommentsCommand::Add { identifier, content, reply_to } => {
      if content.trim().is_empty() {
        return Err(ArxivistCliError::Usage("a comment cannot be empty".into()));
      }
      let mut session = CommentSession::load(&clients.comments, thread_id(&identifier)?).await?;
      if let Some(parent) = reply_to.as_deref() {
        match session.find(parent) {
          Some(c) if c.is_root() => {},
          Some(_) =>
            return Err(ArxivistCliError::Usage("replies can only go to top-level comments".into())),
          None =>
            return Err(ArxivistCliError::Usage(format!("no comment {parent} on this paper"))),
        }
      }
      session.post(content.trim(), reply_to.as_deref()).await?;
      println!("{} Comment posted", style(SUCCESS).green());
      render::comment_thread(session.roots(), &user_id);
    },
    CommentsCommand::Vote { identifier, comment, direction } => {
      let mut session = CommentSession::load(&clients.comments, thread_id(&identifier)?).await?;
      let sent = session.vote(&comment, direction.into()).await?;
      let message = match sent {
        Vote::Up => "Upvoted",
        Vote::Down => "Downvoted",
        Vote::None => "Vote removed",
      };
      println!("{} {message}", style(SUCCESS).green());
      render::comment_thread(session.roots(), &user_id);
    },
    CommentsCommand::Delete { identifier, comment } => {
      let mut session = CommentSession::load(&clients.comments, thread_id(&identifier)?).await?;
      if !ctx.confirm("Delete this comment?", ctx.accept_defaults)? {
        println!("{} Operation cancelled", style("✖").red());
        return Ok(());
      }
      session.delete(&comment).await?;
      println!("{} Comment deleted", style(SUCCESS).green());
      render::comment_thread(session.roots(), &user_id);
    },
  }
  Ok(())
}

async fn chat(ctx: &Context, identifier: &str) -> Result<(), ArxivistCliError> {
  let clients = ctx.clients()?;
  let paper = fetch(&clients, identifier).await?;
  let mut session = ChatSession::new(&clients.assistant, &paper);

  println!(
    "{} Chatting about: {}\n   Empty line or {} to quit.",
    style(SPEECH).cyan(),
    style(&paper.title).white().bold(),
    style("exit").yellow()
  );
  loop {
    let question = dialoguer::Input::<String>::new()
      .with_prompt("You")
      .allow_empty(true)
      .interact_text()?;
    let question = question.trim();
    if question.is_empty() || question.eq_ignore_ascii_case("exit") {
      break;
    }
    match session.ask(question).await {
      Ok(answer) => println!("\n{} {}\n", style("Assistant:").cyan().bold(), answer),
      Err(e) if e.is_auth_error() => return Err(e.into()),
      Err(e) => println!("{} {} (ask again to retry)", style(WARNING).red(), e),
    }
  }
  Ok(())
}
