//! Async driver for one question/answer exchange.
//!
//! Wires [`Conversation`] transitions to a single [`KnowledgeBase`] call:
//! submit, then either stream fragments into the placeholder, replace it with
//! a complete answer, or attach search results. Transport-side failures end
//! the exchange with the apology turn.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::transport::{AskParams, KnowledgeBase};

use super::thread::{Conversation, Exchange, TurnId};

/// How the answer is requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeMode {
    /// `/api/ask`, body consumed fragment by fragment.
    #[default]
    Stream,
    /// `/api/ask`, body awaited as a whole.
    Once,
    /// `/api/search`, generated answer plus the matching chunks.
    Search,
}

/// How an exchange ended.
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// The placeholder holds the final answer.
    Answered { turn: TurnId },
    /// The apology turn was appended after the placeholder.
    Failed { turn: TurnId, error: Error },
    /// Aborted by the caller; the placeholder keeps what had arrived.
    Cancelled { turn: TurnId },
}

impl ExchangeOutcome {
    /// The assistant turn a renderer should show for this exchange.
    #[must_use]
    pub fn turn(&self) -> TurnId {
        match self {
            Self::Answered { turn } | Self::Failed { turn, .. } | Self::Cancelled { turn } => *turn,
        }
    }
}

/// Run one exchange to completion.
///
/// `on_chunk` sees every streamed fragment right after it is applied to the
/// log. Only [`Error::EmptyInput`] and [`Error::Busy`] are returned as errors;
/// everything after a successful submit is reported through the outcome.
pub async fn run_exchange<K>(
    conversation: &mut Conversation,
    kb: &K,
    text: &str,
    mode: ExchangeMode,
    params: AskParams,
    cancel: &CancellationToken,
    on_chunk: &mut (dyn for<'s> FnMut(&'s str) + Send),
) -> Result<ExchangeOutcome>
where
    K: KnowledgeBase + ?Sized,
{
    let exchange = conversation.submit(text)?;
    let query = text.trim();

    let result = match mode {
        ExchangeMode::Stream => {
            stream_into(conversation, kb, exchange, query, params, cancel, on_chunk).await
        }
        ExchangeMode::Once => {
            let answer = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(Error::Cancelled),
                answer = kb.ask_once(query, params) => answer,
            };
            answer.and_then(|text| conversation.complete(exchange.assistant, Some(text)))
        }
        ExchangeMode::Search => {
            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(Error::Cancelled),
                response = kb.search(query) => response,
            };
            response.and_then(|r| conversation.complete_with_search(exchange.assistant, r))
        }
    };

    let turn = exchange.assistant;
    match result {
        Ok(()) => {
            info!(name: "exchange.answered", turn = %turn, mode = ?mode, "Exchange answered");
            Ok(ExchangeOutcome::Answered { turn })
        }
        Err(Error::Cancelled) => {
            warn!(name: "exchange.cancelled", turn = %turn, "Exchange cancelled");
            conversation.complete(turn, None)?;
            Ok(ExchangeOutcome::Cancelled { turn })
        }
        Err(error) => {
            let apology = conversation.fail(turn, &error)?;
            Ok(ExchangeOutcome::Failed {
                turn: apology,
                error,
            })
        }
    }
}

async fn stream_into<K>(
    conversation: &mut Conversation,
    kb: &K,
    exchange: Exchange,
    query: &str,
    params: AskParams,
    cancel: &CancellationToken,
    on_chunk: &mut (dyn for<'s> FnMut(&'s str) + Send),
) -> Result<()>
where
    K: KnowledgeBase + ?Sized,
{
    let mut stream = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        stream = kb.stream_ask(query, params) => stream?,
    };

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            next = stream.next() => next,
        };
        match next {
            Some(fragment) => {
                let fragment = fragment?;
                conversation.apply_chunk(exchange.assistant, &fragment)?;
                on_chunk(&fragment);
            }
            None => break,
        }
    }

    conversation.complete(exchange.assistant, None)
}
