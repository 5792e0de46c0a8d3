//! Client for the AI backend that answers questions about a paper's PDF.
//!
//! The backend has one endpoint. It receives a PDF URL and a prompt and answers with text:
//!
//! ```text
//! POST {base}  {"pdfUrl": "...", "prompt": "..."}  ->  {"response": "..."}
//! ```
//!
//! Summaries and chat use the same endpoint; only the prompt differs. [`ChatSession`] keeps the
//! conversation for one paper and replays its most recent turns in every prompt, since the
//! backend itself is stateless.

use super::*;

/// How many earlier question/answer pairs are replayed in a chat prompt.
pub const CHAT_HISTORY_TURNS: usize = 4;

/// Request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssistantRequest<'a> {
  /// PDF the backend should read
  pdf_url: &'a str,
  /// Instruction or question
  prompt:  &'a str,
}

/// Response body.
#[derive(Debug, Deserialize)]
struct AssistantResponse {
  /// The model's answer
  response: String,
}

/// Client for the AI backend.
#[derive(Debug, Clone)]
pub struct AssistantClient {
  /// Internal web client used to connect to the API.
  client:   reqwest::Client,
  /// The single endpoint of the backend
  endpoint: String,
}

impl AssistantClient {
  /// Creates a client that shares `client` and posts to `endpoint`.
  pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
    Self { client, endpoint: endpoint.into() }
  }

  /// Sends `prompt` about the PDF of `paper` and returns the answer.
  pub async fn ask(&self, paper: &Paper, prompt: &str) -> Result<String, ArxivistError> {
    debug!("Asking assistant about {} via: {}", paper.id, self.endpoint);
    trace!("Assistant prompt: {prompt}");

    let response = check_status(
      self
        .client
        .post(&self.endpoint)
        .json(&AssistantRequest { pdf_url: &paper.pdf_url, prompt })
        .send()
        .await?,
    )?;
    let body = response.text().await?;
    let AssistantResponse { response } = serde_json::from_str(&body)
      .map_err(|e| ArxivistError::MalformedResponse(format!("assistant response: {e}")))?;
    Ok(response.trim().to_string())
  }

  /// Asks for a plain-language summary of `paper`.
  pub async fn summarize(&self, paper: &Paper) -> Result<String, ArxivistError> {
    self.ask(paper, &summary_prompt(paper)).await
  }
}

/// The prompt used for summaries.
pub fn summary_prompt(paper: &Paper) -> String {
  format!(
    "Summarize the research paper \"{}\" for a technically literate reader who is not a \
     specialist in {}. Cover the problem it addresses, the approach, the main results and any \
     limitations the authors mention. Keep it under 300 words.",
    paper.title,
    paper.primary_category()
  )
}

/// A conversation about one paper.
pub struct ChatSession<'a> {
  /// Backend client
  client: &'a AssistantClient,
  /// The paper being discussed
  paper:  &'a Paper,
  /// Question and answer pairs, oldest first
  turns:  Vec<(String, String)>,
}

impl<'a> ChatSession<'a> {
  /// Starts an empty conversation about `paper`.
  pub fn new(client: &'a AssistantClient, paper: &'a Paper) -> Self {
    Self { client, paper, turns: Vec::new() }
  }

  /// Every question and answer so far, oldest first.
  pub fn transcript(&self) -> &[(String, String)] { &self.turns }

  /// Asks `question` and records the answer.
  ///
  /// A failed request leaves the transcript untouched, so the same question can be asked again.
  pub async fn ask(&mut self, question: &str) -> Result<&str, ArxivistError> {
    let prompt = self.prompt_for(question);
    let answer = self.client.ask(self.paper, &prompt).await?;
    self.turns.push((question.to_string(), answer));
    Ok(self.turns.last().map(|(_, answer)| answer.as_str()).unwrap_or_default())
  }

  /// Builds the prompt for `question`, replaying the most recent turns.
  pub fn prompt_for(&self, question: &str) -> String {
    let mut prompt = format!(
      "You are helping a reader understand the research paper \"{}\". Answer using the paper's \
       content; say so when the paper does not cover the question.\n",
      self.paper.title
    );
    let skip = self.turns.len().saturating_sub(CHAT_HISTORY_TURNS);
    if self.turns.len() > skip {
      prompt.push_str("\nConversation so far:\n");
      for (q, a) in &self.turns[skip..] {
        prompt.push_str(&format!("Reader: {q}\nAssistant: {a}\n"));
      }
    }
    prompt.push_str(&format!("\nReader: {question}\nAssistant:"));
    prompt
  }
}
