//! Wire types for the knowledge-base service.
//!
//! Response shapes are consumed, not owned: the core only reads `analysis`
//! and passes everything else through for display.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Generation parameters
// =============================================================================

/// Answer language requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Language {
    #[default]
    English,
    French,
    Spanish,
    German,
    Portuguese,
    Italian,
}

impl Language {
    /// Wire name, e.g. `ENGLISH`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "ENGLISH",
            Self::French => "FRENCH",
            Self::Spanish => "SPANISH",
            Self::German => "GERMAN",
            Self::Portuguese => "PORTUGUESE",
            Self::Italian => "ITALIAN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested answer length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl AnswerLength {
    /// Wire name, e.g. `SHORT`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "SHORT",
            Self::Medium => "MEDIUM",
            Self::Long => "LONG",
        }
    }
}

impl fmt::Display for AnswerLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation parameters sent with every ask request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AskParams {
    pub temperature: f32,
    pub language: Language,
    pub length: AnswerLength,
}

impl Default for AskParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            language: Language::default(),
            length: AnswerLength::default(),
        }
    }
}

/// Search tuning sent with every search request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub similarity_threshold: f32,
    pub max_results: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            max_results: 5,
        }
    }
}

// =============================================================================
// Request bodies
// =============================================================================

/// Body of `POST /api/ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
    pub temperature: f32,
    pub language: Language,
    pub length: AnswerLength,
}

impl<'a> AskRequest<'a> {
    #[must_use]
    pub fn new(query: &'a str, params: AskParams) -> Self {
        Self {
            query,
            temperature: params.temperature,
            language: params.language,
            length: params.length,
        }
    }
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub similarity_threshold: f32,
    pub max_results: usize,
}

impl<'a> SearchRequest<'a> {
    #[must_use]
    pub fn new(query: &'a str, params: SearchParams) -> Self {
        Self {
            query,
            similarity_threshold: params.similarity_threshold,
            max_results: params.max_results,
        }
    }
}

// =============================================================================
// Search response
// =============================================================================

/// Location of a chunk inside one page of the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRange {
    pub page_number: u32,
    pub start_in_page: usize,
    pub end_in_page: usize,
    pub page_text_length: usize,
}

/// Page-span bookkeeping attached to every search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    pub pages: Vec<u32>,
    pub start_char: usize,
    pub end_char: usize,
    pub num_words: usize,
    pub num_sentences: usize,
    pub chunk_size: usize,
    pub chunk_index: usize,
    pub page_ranges: Vec<PageRange>,
    pub is_first_chunk: bool,
    pub is_last_chunk: bool,
    pub spans_multiple_pages: bool,
}

/// A single semantic search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: i64,
    pub chunk_text: String,
    /// Cosine similarity in `0..=1`.
    pub similarity: f64,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// Generated answer over the search hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAnalysis {
    pub answer: String,
}

/// Response of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSearchResponse {
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub query: String,
    /// Absent when the service only ran retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<SearchAnalysis>,
}

impl SemanticSearchResponse {
    /// The generated answer, or an empty string when none was produced.
    #[must_use]
    pub fn answer(&self) -> &str {
        self.analysis.as_ref().map_or("", |a| a.answer.as_str())
    }
}
