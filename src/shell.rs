//! Line-oriented terminal front end.
//!
//! Plays the part of the rendering layer: reads questions from stdin, prints
//! streamed fragments as they arrive and lists citations once an answer is
//! complete.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use kb_chat::answer::ParsedAnswer;
use kb_chat::composer::{Composer, SUGGESTED_QUESTIONS, WELCOME_TEXT};
use kb_chat::config::AppConfig;
use kb_chat::conversation::{Conversation, ExchangeMode, ExchangeOutcome, run_exchange};
use kb_chat::transport::{KnowledgeBase, SemanticSearchResponse};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Number of search hits listed under a search answer.
const MAX_LISTED_HITS: usize = 3;

/// What a line of input asks the shell to do.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Suggest,
    Ask,
    Ignore,
}

pub struct Shell<K> {
    kb: K,
    config: Arc<AppConfig>,
    conversation: Conversation,
    composer: Composer,
}

impl<K: KnowledgeBase> Shell<K> {
    pub fn new(kb: K, config: Arc<AppConfig>) -> Self {
        Self {
            kb,
            config,
            conversation: Conversation::new(),
            composer: Composer::new(),
        }
    }

    /// Interactive loop until EOF, `/quit` or Ctrl-C at the prompt.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", welcome_screen());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            // Ctrl-C during an answer is handled in `send_draft`; here it quits.
            let line = tokio::select! {
                line = lines.next_line() => line.context("reading stdin")?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                println!();
                break;
            };

            match self.interpret(&line) {
                Command::Quit => break,
                Command::Ignore => {}
                Command::Suggest => {
                    println!("> {}", self.composer.draft());
                    self.send_draft().await?;
                }
                Command::Ask => self.send_draft().await?,
            }
        }
        Ok(())
    }

    /// Ask one question and print the answer.
    pub async fn ask(&mut self, question: &str) -> anyhow::Result<()> {
        self.composer.set_draft(question);
        self.send_draft().await
    }

    fn interpret(&mut self, line: &str) -> Command {
        let trimmed = line.trim();
        if matches!(trimmed, "/quit" | "/exit") {
            return Command::Quit;
        }
        if let Some(n) = trimmed.strip_prefix('/') {
            return match n.parse::<usize>() {
                Ok(n) if n >= 1 && self.composer.choose_suggestion(n - 1).is_some() => {
                    Command::Suggest
                }
                _ => {
                    println!("Pick a suggestion between /1 and /{}", SUGGESTED_QUESTIONS.len());
                    Command::Ignore
                }
            };
        }
        self.composer.set_draft(line);
        if self.composer.can_send() {
            Command::Ask
        } else {
            Command::Ignore
        }
    }

    async fn send_draft(&mut self) -> anyhow::Result<()> {
        let Some(question) = self.composer.take() else {
            return Ok(());
        };
        let mode = self.config.ask.mode;

        // Ctrl-C aborts the exchange in flight, not the shell.
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let mut print_fragment = |fragment: &str| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        };
        let outcome = run_exchange(
            &mut self.conversation,
            &self.kb,
            &question,
            mode,
            self.config.ask.params(),
            &cancel,
            &mut print_fragment,
        )
        .await;
        watcher.abort();

        match outcome? {
            ExchangeOutcome::Answered { turn } => {
                let Some(message) = self.conversation.message(turn) else {
                    return Ok(());
                };
                let Some(parsed) = self.conversation.parsed(turn) else {
                    return Ok(());
                };
                if mode == ExchangeMode::Stream {
                    // The prose is already on screen; add the structured citations.
                    println!();
                    if let Some(sources) = render_sources(&parsed) {
                        println!("{sources}");
                    }
                } else {
                    println!("{}", render_answer(&parsed, message.search_results.as_ref()));
                }
            }
            ExchangeOutcome::Cancelled { turn } => {
                debug!(name: "shell.cancelled", turn = %turn, "Answer interrupted");
                println!("\n[interrupted]");
            }
            ExchangeOutcome::Failed { turn, .. } => {
                if let Some(message) = self.conversation.message(turn) {
                    println!("\n{}", message.text);
                }
            }
        }
        Ok(())
    }
}

fn welcome_screen() -> String {
    let mut out = format!("{WELCOME_TEXT}\n\nTry asking me:\n");
    for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        let _ = writeln!(out, "  /{} {question}", i + 1);
    }
    out.push_str(
        "\nType a question, /<n> for a suggestion, /quit or Ctrl-C to leave.\nCtrl-C while an answer is arriving interrupts it.",
    );
    out
}

/// The `Sources:` block of a parsed answer, `None` when it cites nothing.
fn render_sources(parsed: &ParsedAnswer) -> Option<String> {
    if !parsed.has_sources() {
        return None;
    }
    let mut out = String::from("Sources:");
    for source in &parsed.sources {
        let _ = write!(out, "\n  [p. {}] \"{}\"", source.page, source.quote);
    }
    Some(out)
}

/// Format a finished answer with its citations and, for searches, top hits.
fn render_answer(parsed: &ParsedAnswer, search: Option<&SemanticSearchResponse>) -> String {
    let mut out = parsed.answer.clone();

    if let Some(sources) = render_sources(parsed) {
        out.push_str("\n\n");
        out.push_str(&sources);
    }

    if let Some(search) = search.filter(|s| !s.results.is_empty()) {
        let _ = write!(out, "\n\nTop matches ({} total):", search.total_results);
        for hit in search.results.iter().take(MAX_LISTED_HITS) {
            let pages = match hit.metadata.pages.as_slice() {
                [] => String::new(),
                [page] => format!(", p. {page}"),
                [first, .., last] => format!(", pp. {first}-{last}"),
            };
            let _ = write!(
                out,
                "\n  {:.2}  chunk {}{pages}",
                hit.similarity, hit.chunk_id
            );
        }
    }

    out
}
