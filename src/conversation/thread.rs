//! Conversation log and the per-exchange state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::answer::{self, ParsedAnswer};
use crate::error::{Error, Result};
use crate::transport::SemanticSearchResponse;

/// Text of the assistant turn appended when an exchange fails.
pub const APOLOGY_TEXT: &str = "Sorry, I couldn't reach the knowledge base. Please try again.";

/// Stable handle to one message in the log.
///
/// Handles are assigned in append order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: TurnId,
    /// Grows while the owning exchange streams; frozen afterwards.
    pub text: String,
    /// `true` when authored by the user.
    pub is_sent: bool,
    /// Attached to completed assistant turns answered through search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<SemanticSearchResponse>,
    pub created_at: DateTime<Utc>,
}

/// Handles created by one [`Conversation::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// The user's message.
    pub user: TurnId,
    /// The assistant placeholder that receives the answer.
    pub assistant: TurnId,
}

/// Reducer state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse(Exchange),
}

/// Append-only conversation log owned by the reducer.
///
/// At most one exchange is in flight at a time; a submit during
/// [`Phase::AwaitingResponse`] is rejected with [`Error::Busy`].
#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
    next_turn: u64,
    phase: Phase,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            messages: Vec::new(),
            next_turn: 0,
            phase: Phase::Idle,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `true` exactly while an exchange awaits its response.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::AwaitingResponse(_))
    }

    /// The exchange currently in flight, if any.
    #[must_use]
    pub fn in_progress(&self) -> Option<Exchange> {
        match self.phase {
            Phase::AwaitingResponse(exchange) => Some(exchange),
            Phase::Idle => None,
        }
    }

    /// All messages in exchange order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages a renderer should show: empty assistant placeholders are skipped.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.is_sent || !m.text.is_empty())
    }

    /// Look up a message by handle.
    #[must_use]
    pub fn message(&self, id: TurnId) -> Option<&Message> {
        self.index_of(id).map(|i| &self.messages[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Parsed answer of a finished assistant turn.
    ///
    /// `None` for user turns, unknown handles and the in-progress placeholder.
    #[must_use]
    pub fn parsed(&self, id: TurnId) -> Option<ParsedAnswer> {
        if self.in_progress().is_some_and(|ex| ex.assistant == id) {
            return None;
        }
        let message = self.message(id).filter(|m| !m.is_sent)?;
        Some(answer::parse(message.text.as_str()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Start an exchange: append the user's message and an empty placeholder.
    pub fn submit(&mut self, text: &str) -> Result<Exchange> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        if let Some(current) = self.in_progress() {
            debug!(
                name: "conversation.submit.rejected",
                pending = %current.assistant,
                "Exchange already in progress"
            );
            return Err(Error::Busy);
        }

        let user = self.push(text.to_string(), true);
        let assistant = self.push(String::new(), false);
        let exchange = Exchange { user, assistant };
        self.phase = Phase::AwaitingResponse(exchange);

        debug!(
            name: "conversation.submit",
            conversation = %self.id,
            user = %user,
            assistant = %assistant,
            "Exchange started"
        );
        Ok(exchange)
    }

    /// Append a streamed fragment to the placeholder addressed by `turn`.
    ///
    /// Appends to the stored text, so fragments are neither dropped nor
    /// duplicated however quickly they arrive.
    pub fn apply_chunk(&mut self, turn: TurnId, fragment: &str) -> Result<()> {
        let index = self.placeholder_index(turn)?;
        self.messages[index].text.push_str(fragment);
        Ok(())
    }

    /// Finish the exchange. A complete non-streamed answer replaces the text.
    pub fn complete(&mut self, turn: TurnId, final_text: Option<String>) -> Result<()> {
        let index = self.placeholder_index(turn)?;
        if let Some(text) = final_text {
            self.messages[index].text = text;
        }
        self.phase = Phase::Idle;

        debug!(
            name: "conversation.turn.completed",
            turn = %turn,
            chars = self.messages[index].text.len(),
            "Exchange completed"
        );
        Ok(())
    }

    /// Finish a search exchange: the generated answer becomes the text and the
    /// hits are attached for display.
    pub fn complete_with_search(
        &mut self,
        turn: TurnId,
        response: SemanticSearchResponse,
    ) -> Result<()> {
        let index = self.placeholder_index(turn)?;
        let message = &mut self.messages[index];
        message.text = response.answer().to_string();
        message.search_results = Some(response);
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Abort the exchange with the fixed apology turn.
    ///
    /// The placeholder stays in the log as is. Returns the apology's handle.
    pub fn fail(&mut self, turn: TurnId, err: &Error) -> Result<TurnId> {
        self.placeholder_index(turn)?;
        error!(
            name: "conversation.turn.failed",
            turn = %turn,
            error = %err,
            "Exchange failed"
        );
        let apology = self.push(APOLOGY_TEXT.to_string(), false);
        self.phase = Phase::Idle;
        Ok(apology)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn push(&mut self, text: String, is_sent: bool) -> TurnId {
        let id = TurnId(self.next_turn);
        self.next_turn += 1;
        self.messages.push(Message {
            id,
            text,
            is_sent,
            search_results: None,
            created_at: Utc::now(),
        });
        id
    }

    fn index_of(&self, id: TurnId) -> Option<usize> {
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }

    fn placeholder_index(&self, turn: TurnId) -> Result<usize> {
        match self.phase {
            Phase::AwaitingResponse(exchange) if exchange.assistant == turn => {
                self.index_of(turn).ok_or(Error::StaleTurn(turn))
            }
            _ => Err(Error::StaleTurn(turn)),
        }
    }
}
