//! Input draft and the welcome screen's suggested questions.
//!
//! Typing and picking a suggestion go through the same state update; there is
//! no second path that pokes the input from outside.

/// Greeting shown while the conversation is empty.
pub const WELCOME_TEXT: &str = "Welcome to your flight guide. Feel free to ask me anything.";

/// Sample questions offered on the welcome screen.
pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What are the hours for the westbound tracks?",
    "What are the navigation performance requirements for the NAT?",
    "Is datalink a requirement for flying the NAT?",
    "What is the Gander transition area?",
    "When should I send the RCL message?",
];

/// The text currently in the input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    draft: String,
}

impl Composer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the draft (typing, pasting, picking a suggestion).
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Fill the draft with suggestion `index` from [`SUGGESTED_QUESTIONS`].
    ///
    /// Returns the chosen question, or `None` for an out-of-range index.
    pub fn choose_suggestion(&mut self, index: usize) -> Option<&'static str> {
        let question = SUGGESTED_QUESTIONS.get(index).copied()?;
        self.set_draft(question);
        Some(question)
    }

    /// Whether the send action is enabled.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Take the draft for submission, clearing the input.
    ///
    /// A blank draft is left untouched and `None` is returned.
    pub fn take(&mut self) -> Option<String> {
        self.can_send().then(|| std::mem::take(&mut self.draft))
    }
}
