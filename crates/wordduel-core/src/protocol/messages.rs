//! All WordDuel protocol message types.
//!
//! Every message on the wire starts with a one-byte type tag.  Multi-byte
//! integers are big-endian unsigned throughout.

use crate::domain::game::PlayerId;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type tags defined by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Client opens the conversation; server acknowledges with a single
    /// `0x00` payload byte.
    Init = 0x01,
    /// The shared secret, sent once after the Init acknowledgement.
    PasswordResponse = 0x02,
    /// Server assigns the authenticated connection its identity.
    AssignId = 0x03,
    /// Ask the server for the identities of all other online players.
    RequestOpponents = 0x04,
    /// Identity count followed by that many identities.
    OpponentsResponse = 0x05,
    /// Challenge an opponent with a secret word.
    RequestMatch = 0x06,
    /// Sent to both participants when a match is established.
    MatchConfirm = 0x07,
    /// A guess at the secret word.
    GuessWord = 0x08,
    /// Free-form hint relayed to the opponent.
    Hint = 0x09,
    /// Outcome of a guess, sent to both participants.
    ProgressUpdate = 0x0A,
    /// Free-form text, used for server broadcasts.
    Text = 0x0B,
    /// Sent to both participants when a match ends for any reason.
    EndMatch = 0x0C,
    /// Protocol-level error report.
    Error = 0xFF,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::Init),
            0x02 => Ok(MessageType::PasswordResponse),
            0x03 => Ok(MessageType::AssignId),
            0x04 => Ok(MessageType::RequestOpponents),
            0x05 => Ok(MessageType::OpponentsResponse),
            0x06 => Ok(MessageType::RequestMatch),
            0x07 => Ok(MessageType::MatchConfirm),
            0x08 => Ok(MessageType::GuessWord),
            0x09 => Ok(MessageType::Hint),
            0x0A => Ok(MessageType::ProgressUpdate),
            0x0B => Ok(MessageType::Text),
            0x0C => Ok(MessageType::EndMatch),
            0xFF => Ok(MessageType::Error),
            _ => Err(()),
        }
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid WordDuel messages, discriminated by type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake opener / acknowledgement.
    Init,
    /// Shared secret submitted by the client.
    PasswordResponse(String),
    /// Identity assigned by the server after successful authentication.
    AssignId(PlayerId),
    /// Request for the list of other online identities.
    RequestOpponents,
    /// Identities of all other online players, in registration order.
    OpponentsResponse(Vec<PlayerId>),
    /// Challenge `opponent` to guess `word`.
    RequestMatch { opponent: PlayerId, word: String },
    /// Match established; both sides may now guess and hint.
    MatchConfirm,
    /// A guess at the secret word.
    GuessWord(String),
    /// Hint text relayed verbatim to the opponent.
    Hint(String),
    /// Outcome of a guess: `success` and the guess that was evaluated.
    ProgressUpdate { success: bool, guess: String },
    /// Free-form text broadcast.
    Text(String),
    /// The match is over; both sides return to the idle state.
    EndMatch,
    /// Error description for the offending connection.
    Error(String),
}

impl Message {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Init => MessageType::Init,
            Message::PasswordResponse(_) => MessageType::PasswordResponse,
            Message::AssignId(_) => MessageType::AssignId,
            Message::RequestOpponents => MessageType::RequestOpponents,
            Message::OpponentsResponse(_) => MessageType::OpponentsResponse,
            Message::RequestMatch { .. } => MessageType::RequestMatch,
            Message::MatchConfirm => MessageType::MatchConfirm,
            Message::GuessWord(_) => MessageType::GuessWord,
            Message::Hint(_) => MessageType::Hint,
            Message::ProgressUpdate { .. } => MessageType::ProgressUpdate,
            Message::Text(_) => MessageType::Text,
            Message::EndMatch => MessageType::EndMatch,
            Message::Error(_) => MessageType::Error,
        }
    }
}
