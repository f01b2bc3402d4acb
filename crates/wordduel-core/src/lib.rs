//! # wordduel-core
//!
//! Shared library for WordDuel containing the wire protocol codec and the
//! pure game rules.
//!
//! This crate is used by both the server and the terminal client.
//! It has zero dependencies on sockets, timers, or OS APIs.
//!
//! # Architecture overview
//!
//! WordDuel is a two-player word-guessing duel played over a persistent TCP
//! connection.  One player (the "initiator") picks a secret word and a target
//! opponent; both sides then exchange guesses and hints until the word is
//! found or the attempt budget runs out.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the network.  Every message is a
//!   one-byte type tag followed by a type-specific payload, with 4-byte
//!   big-endian length prefixes on the variable-length fields.
//!
//! - **`domain`** – Pure business logic: the [`Match`] entity, guess
//!   evaluation (trimmed, case-sensitive), and the shared attempt budget.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `wordduel_core::Message` instead of `wordduel_core::protocol::messages::Message`.
pub use domain::game::{GuessOutcome, Match, PlayerId, DEFAULT_MAX_ATTEMPTS};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Message, MessageType};
