//! Client side of the knowledge-base service.
//!
//! The [`KnowledgeBase`] trait is the seam between the conversation reducer
//! and the network. [`HttpKnowledgeBase`] is the production implementation;
//! tests substitute their own.
//!
//! Three request shapes are supported:
//!
//! - [`KnowledgeBase::search`]: one JSON round trip to `/api/search`
//! - [`KnowledgeBase::ask_once`]: one round trip to `/api/ask`, whole body as text
//! - [`KnowledgeBase::stream_ask`]: `/api/ask` consumed fragment by fragment

pub mod client;
pub mod decode;
pub mod types;

pub use client::HttpKnowledgeBase;
pub use decode::Utf8ChunkDecoder;
pub use types::{
    AnswerLength, AskParams, AskRequest, ChunkMetadata, Language, PageRange, SearchAnalysis,
    SearchParams, SearchRequest, SearchResult, SemanticSearchResponse,
};

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::Result;

/// Decoded text fragments in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Operations offered by the knowledge-base service.
///
/// Implementations hold no per-call state; every call is independent.
#[async_trait::async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Semantic search over the indexed documents.
    async fn search(&self, query: &str) -> Result<SemanticSearchResponse>;

    /// Ask a question and wait for the complete answer text.
    async fn ask_once(&self, query: &str, params: AskParams) -> Result<String>;

    /// Ask a question and receive the answer as a stream of text fragments.
    async fn stream_ask(&self, query: &str, params: AskParams) -> Result<ChunkStream>;

    /// Callback form of [`stream_ask`](Self::stream_ask).
    ///
    /// Invokes `on_chunk` once per fragment, in arrival order, and returns
    /// when the stream is exhausted.
    async fn stream_ask_with(
        &self,
        query: &str,
        params: AskParams,
        on_chunk: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<()> {
        let mut stream = self.stream_ask(query, params).await?;
        while let Some(fragment) = stream.next().await {
            on_chunk(&fragment?);
        }
        Ok(())
    }
}
