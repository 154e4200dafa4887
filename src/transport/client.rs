//! HTTP implementation of [`KnowledgeBase`] on top of `reqwest`.

use futures::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::{Error, Result};

use super::decode::Utf8ChunkDecoder;
use super::types::{AskParams, AskRequest, SearchParams, SearchRequest, SemanticSearchResponse};
use super::{ChunkStream, KnowledgeBase};

const SEARCH_PATH: &str = "/api/search";
const ASK_PATH: &str = "/api/ask";

/// HTTP client for the knowledge-base service.
///
/// # Example
///
/// ```rust,no_run
/// use kb_chat::transport::{AskParams, HttpKnowledgeBase, KnowledgeBase};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let kb = HttpKnowledgeBase::new("http://localhost:8000")?;
/// let answer = kb.ask_once("Is datalink a requirement for flying the NAT?", AskParams::default()).await?;
/// println!("{answer}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpKnowledgeBase {
    base_url: Url,
    http: reqwest::Client,
    search: SearchParams,
}

impl HttpKnowledgeBase {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http,
            search: SearchParams::default(),
        })
    }

    /// Build a client from the loaded application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(&config.api.base_url)?.with_search_params(config.search))
    }

    /// Override the similarity threshold and result cap sent with searches.
    #[must_use]
    pub fn with_search_params(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").into());
        warn!(
            name: "kb.response.rejected",
            status = status.as_u16(),
            message = %message,
            "Knowledge base returned an error status"
        );
        Err(Error::Transport {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait::async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn search(&self, query: &str) -> Result<SemanticSearchResponse> {
        debug!(name: "kb.search.sent", query = %query, "Sending semantic search");

        let response = self
            .post_json(SEARCH_PATH, &SearchRequest::new(query, self.search))
            .await?;
        let body = response.bytes().await?;
        let parsed: SemanticSearchResponse = serde_json::from_slice(&body)?;

        debug!(
            name: "kb.search.received",
            total_results = parsed.total_results,
            "Semantic search answered"
        );
        Ok(parsed)
    }

    async fn ask_once(&self, query: &str, params: AskParams) -> Result<String> {
        debug!(name: "kb.ask.sent", query = %query, streaming = false, "Asking knowledge base");

        let response = self
            .post_json(ASK_PATH, &AskRequest::new(query, params))
            .await?;
        let body = response.bytes().await?;
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::Decode(format!("answer is not valid UTF-8: {e}")))
    }

    async fn stream_ask(&self, query: &str, params: AskParams) -> Result<ChunkStream> {
        debug!(name: "kb.ask.sent", query = %query, streaming = true, "Asking knowledge base");

        let response = self
            .post_json(ASK_PATH, &AskRequest::new(query, params))
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(Error::Transport {
                status: Some(StatusCode::NO_CONTENT.as_u16()),
                message: "response has no readable body".into(),
            });
        }

        let byte_stream = response.bytes_stream();

        let out = async_stream::try_stream! {
            let mut decoder = Utf8ChunkDecoder::new();

            futures::pin_mut!(byte_stream);
            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.map_err(|e| Error::StreamRead(e.to_string()))?;
                if let Some(fragment) = decoder.push(&chunk)? {
                    trace!(name: "kb.ask.chunk", bytes = fragment.len(), "Received answer fragment");
                    yield fragment;
                }
            }
            decoder.finish()?;
        };

        Ok(Box::pin(out))
    }
}
