//! Splitting a raw answer into prose and cited sources.
//!
//! The service appends citations after a literal `SOURCES` marker:
//!
//! ```text
//! Datalink is mandatory between FL290 and FL410.
//! SOURCES:
//! - Page 3: "Data link mandate airspace"
//! - Page 12: "FANS 1/A equipage"
//! ```
//!
//! [`parse`] never fails. Anything it cannot interpret falls back to the
//! safe default: no sources, or the whole text treated as the answer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal token separating the answer from its citation block.
pub const SOURCES_MARKER: &str = "SOURCES";

/// A `{page, quote}` reference extracted from a bullet after the marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub page: u32,
    pub quote: String,
}

/// An answer split into human-readable prose and its citations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnswer {
    pub answer: String,
    pub sources: Vec<Citation>,
}

impl ParsedAnswer {
    #[must_use]
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Renders back into the marker format accepted by [`parse`].
impl fmt::Display for ParsedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.answer)?;
        if self.sources.is_empty() {
            return Ok(());
        }
        write!(f, "\n\n{SOURCES_MARKER}:")?;
        for source in &self.sources {
            write!(f, "\n- Page {}: \"{}\"", source.page, source.quote)?;
        }
        Ok(())
    }
}

/// Parse raw answer text. Accepts `&str` or `Option<&str>`.
///
/// Only the first marker is a split point; later occurrences belong to the
/// source block.
pub fn parse<'a>(raw: impl Into<Option<&'a str>>) -> ParsedAnswer {
    let Some(raw) = raw.into().filter(|s| !s.is_empty()) else {
        return ParsedAnswer::default();
    };

    let Some((head, tail)) = raw.split_once(SOURCES_MARKER) else {
        return ParsedAnswer {
            answer: raw.trim().to_string(),
            sources: Vec::new(),
        };
    };

    let tail = tail.strip_prefix(':').unwrap_or(tail);
    let sources = tail
        .lines()
        .filter_map(|line| line.trim().strip_prefix('-'))
        .filter_map(parse_citation)
        .collect();

    ParsedAnswer {
        answer: head.trim().to_string(),
        sources,
    }
}

/// Match `Page <digits>: "<quote>"` on the remainder of a bullet line.
/// The quote ends at the first closing `"`; trailing text is ignored.
fn parse_citation(bullet: &str) -> Option<Citation> {
    let rest = bullet.trim().strip_prefix("Page")?;
    let rest = rest.strip_prefix(char::is_whitespace)?.trim_start();

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, rest) = rest.split_at(digits_end);
    let page = digits.parse::<u32>().ok()?;

    let quoted = rest.strip_prefix(':')?.trim_start();
    let body = quoted.strip_prefix('"')?;
    let quote = &body[..body.find('"')?];
    if quote.is_empty() {
        return None;
    }

    Some(Citation {
        page,
        quote: quote.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cite(page: u32, quote: &str) -> Citation {
        Citation {
            page,
            quote: quote.to_string(),
        }
    }

    #[test]
    fn empty_and_absent_input() {
        assert_eq!(parse(""), ParsedAnswer::default());
        assert_eq!(parse(None::<&str>), ParsedAnswer::default());
    }

    #[test]
    fn no_marker_means_whole_text_is_answer() {
        let parsed = parse("  Some answer text \n");
        assert_eq!(parsed.answer, "Some answer text");
        assert!(parsed.sources.is_empty());
    }

    #[test]
    fn drops_non_matching_bullets() {
        let parsed = parse(
            "Answer.\nSOURCES:\n- Page 3: \"quoted text\"\n- not a match line\n- Page 12: \"another quote\"",
        );
        assert_eq!(parsed.answer, "Answer.");
        assert_eq!(
            parsed.sources,
            vec![cite(3, "quoted text"), cite(12, "another quote")]
        );
    }

    #[test]
    fn marker_without_colon() {
        let parsed = parse("Gander covers the transition.\nSOURCES\n- Page 7: \"GOTA\"");
        assert_eq!(parsed.answer, "Gander covers the transition.");
        assert_eq!(parsed.sources, vec![cite(7, "GOTA")]);
    }

    #[test]
    fn only_first_marker_splits() {
        let parsed = parse(
            "Send it early.\nSOURCES:\n- Page 1: \"see SOURCES below\"\nSOURCES:\n- Page 2: \"second\"",
        );
        assert_eq!(parsed.answer, "Send it early.");
        assert_eq!(
            parsed.sources,
            vec![cite(1, "see SOURCES below"), cite(2, "second")]
        );
    }

    #[test]
    fn marker_is_case_sensitive() {
        let parsed = parse("Check the sources:\n- Page 1: \"x\"");
        assert_eq!(parsed.answer, "Check the sources:\n- Page 1: \"x\"");
        assert!(parsed.sources.is_empty());
    }

    #[test]
    fn malformed_pages_are_dropped() {
        let parsed = parse(
            "A.\nSOURCES:\n- Page x: \"bad\"\n- Page : \"missing\"\n- Page 4 \"no colon\"\n- Page 5: unquoted\n- Page 6: \"\"\n  -   Page 9:   \"spaced\"  ",
        );
        assert_eq!(parsed.sources, vec![cite(9, "spaced")]);
    }

    #[test]
    fn trailing_text_after_quote_is_ignored() {
        let parsed = parse("A.\nSOURCES:\n- Page 3: \"quoted text\".\n- Page 4: \"x\" (section 2)");
        assert_eq!(parsed.sources, vec![cite(3, "quoted text"), cite(4, "x")]);
    }

    #[test]
    fn lines_without_dash_are_ignored() {
        let parsed = parse("A.\nSOURCES:\nPage 3: \"no bullet\"\n- Page 4: \"bullet\"");
        assert_eq!(parsed.sources, vec![cite(4, "bullet")]);
    }

    #[test]
    fn marker_with_empty_answer() {
        let parsed = parse("SOURCES:\n- Page 1: \"only a source\"");
        assert_eq!(parsed.answer, "");
        assert_eq!(parsed.sources, vec![cite(1, "only a source")]);
    }

    #[test]
    fn rendering_reparses_to_same_sources() {
        let original = ParsedAnswer {
            answer: "The RCL goes out 30 to 90 minutes before entry.".into(),
            sources: vec![cite(21, "RCL timing"), cite(3, "Oceanic clearance")],
        };
        let reparsed = parse(original.to_string().as_str());
        assert_eq!(reparsed, original);
    }

    #[test]
    fn rendering_without_sources_is_just_the_answer() {
        let parsed = parse("Plain.");
        assert_eq!(parsed.to_string(), "Plain.");
        assert!(!parsed.has_sources());
    }
}
