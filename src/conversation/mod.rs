//! Conversation state and exchange driving.
//!
//! # Architecture
//!
//! - [`Conversation`]: append-only log plus the `Idle`/`AwaitingResponse`
//!   state machine
//! - [`run_exchange`]: drives one submit through a [`KnowledgeBase`] call
//!
//! # Example
//!
//! ```rust
//! use kb_chat::conversation::Conversation;
//!
//! let mut conversation = Conversation::new();
//! let exchange = conversation.submit("Is datalink a requirement for flying the NAT?").unwrap();
//! conversation.apply_chunk(exchange.assistant, "Yes, ").unwrap();
//! conversation.apply_chunk(exchange.assistant, "in most of the NAT HLA.").unwrap();
//! conversation.complete(exchange.assistant, None).unwrap();
//!
//! assert_eq!(conversation.len(), 2);
//! assert!(!conversation.is_loading());
//! ```
//!
//! [`KnowledgeBase`]: crate::transport::KnowledgeBase

mod exchange;
mod thread;

pub use exchange::{ExchangeMode, ExchangeOutcome, run_exchange};
pub use thread::{APOLOGY_TEXT, Conversation, Exchange, Message, Phase, TurnId};
