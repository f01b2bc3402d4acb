//! Binary codec for encoding and decoding WordDuel protocol messages.
//!
//! Wire format:
//! ```text
//! [tag:1][payload:N]
//! ```
//! The payload layout depends on the tag.  Variable-length string fields in
//! `RequestMatch`, `GuessWord`, `Hint`, and `Text` carry a 4-byte big-endian
//! length prefix; `PasswordResponse`, `ProgressUpdate`, and `Error` consume
//! the remainder of the message.  All multi-byte integers are big-endian.
//!
//! One inbound read chunk is one message; there is no stream cursor, so
//! [`decode_message`] consumes the whole slice or fails.

use crate::domain::game::PlayerId;
use crate::protocol::messages::{Message, MessageType};
use thiserror::Error;

/// Errors that can occur during message decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The leading tag byte is not a recognised message type.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// A declared length field does not match the bytes actually present.
    #[error("payload length mismatch: declared {declared}, available {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The payload could not be parsed (bad fixed field, invalid UTF-8, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] into its canonical wire form.
///
/// Deterministic and total: every valid message encodes without error, so
/// this returns the byte vector directly.
///
/// # Examples
///
/// ```rust
/// use wordduel_core::{decode_message, encode_message, Message};
///
/// let msg = Message::AssignId(7);
/// let bytes = encode_message(&msg);
/// assert_eq!(decode_message(&bytes).unwrap(), msg);
/// ```
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut buf = vec![msg.message_type() as u8];
    match msg {
        Message::Init => buf.push(0x00),
        Message::PasswordResponse(secret) => buf.extend_from_slice(secret.as_bytes()),
        Message::AssignId(id) => buf.extend_from_slice(&id.to_be_bytes()),
        Message::RequestOpponents => {}
        Message::OpponentsResponse(ids) => {
            buf.extend_from_slice(&(ids.len() as u32).to_be_bytes());
            for id in ids {
                buf.extend_from_slice(&id.to_be_bytes());
            }
        }
        Message::RequestMatch { opponent, word } => {
            buf.extend_from_slice(&opponent.to_be_bytes());
            write_length_prefixed(&mut buf, word);
        }
        Message::MatchConfirm => {}
        Message::GuessWord(guess) => write_length_prefixed(&mut buf, guess),
        Message::Hint(text) => write_length_prefixed(&mut buf, text),
        Message::ProgressUpdate { success, guess } => {
            buf.push(u8::from(*success));
            buf.extend_from_slice(guess.as_bytes());
        }
        Message::Text(text) => write_length_prefixed(&mut buf, text),
        Message::EndMatch => buf.push(0x00),
        Message::Error(text) => buf.extend_from_slice(text.as_bytes()),
    }
    buf
}

/// Decodes one [`Message`] from a complete inbound chunk.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the tag is unknown, a declared length field
/// exceeds the available bytes, or a payload field is malformed.
pub fn decode_message(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let (&tag, payload) = bytes
        .split_first()
        .ok_or(ProtocolError::InsufficientData {
            needed: 1,
            available: 0,
        })?;

    let msg_type =
        MessageType::try_from(tag).map_err(|_| ProtocolError::UnknownMessageType(tag))?;

    match msg_type {
        MessageType::Init => {
            expect_ack_byte(payload, "Init")?;
            Ok(Message::Init)
        }
        MessageType::PasswordResponse => Ok(Message::PasswordResponse(utf8(payload)?)),
        MessageType::AssignId => {
            if payload.len() != 4 {
                return Err(ProtocolError::MalformedPayload(format!(
                    "AssignId: expected 4 identity bytes, got {}",
                    payload.len()
                )));
            }
            Ok(Message::AssignId(read_u32(payload, 0)?))
        }
        MessageType::RequestOpponents => {
            expect_empty(payload, "RequestOpponents")?;
            Ok(Message::RequestOpponents)
        }
        MessageType::OpponentsResponse => decode_opponents_response(payload),
        MessageType::RequestMatch => decode_request_match(payload),
        MessageType::MatchConfirm => {
            expect_empty(payload, "MatchConfirm")?;
            Ok(Message::MatchConfirm)
        }
        MessageType::GuessWord => {
            let guess = read_exact_length_prefixed(payload, "GuessWord")?;
            Ok(Message::GuessWord(guess))
        }
        MessageType::Hint => decode_hint(payload),
        MessageType::ProgressUpdate => decode_progress_update(payload),
        MessageType::Text => {
            let text = read_exact_length_prefixed(payload, "Text")?;
            Ok(Message::Text(text))
        }
        MessageType::EndMatch => {
            expect_ack_byte(payload, "EndMatch")?;
            Ok(Message::EndMatch)
        }
        MessageType::Error => Ok(Message::Error(utf8(payload)?)),
    }
}

// ── Per-message decode helpers ────────────────────────────────────────────────

fn decode_opponents_response(p: &[u8]) -> Result<Message, ProtocolError> {
    let count = read_u32(p, 0)? as usize;
    let declared = count.saturating_mul(4);
    let available = p.len() - 4;
    if declared != available {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared,
            available,
        });
    }
    let mut ids: Vec<PlayerId> = Vec::with_capacity(count);
    for i in 0..count {
        ids.push(read_u32(p, 4 + i * 4)?);
    }
    Ok(Message::OpponentsResponse(ids))
}

fn decode_request_match(p: &[u8]) -> Result<Message, ProtocolError> {
    let opponent = read_u32(p, 0)?;
    let word = read_exact_length_prefixed(&p[4..], "RequestMatch")?;
    Ok(Message::RequestMatch { opponent, word })
}

/// Hints are length-prefixed in the canonical (server-encoded) form, but the
/// terminal client sends the bare form: raw UTF-8 as the whole payload.
/// Accept both; the prefix collides with real text only when the text begins
/// with a big-endian encoding of its own remaining length.
fn decode_hint(p: &[u8]) -> Result<Message, ProtocolError> {
    if p.len() >= 4 {
        let declared = read_u32(p, 0)? as usize;
        if declared == p.len() - 4 {
            return Ok(Message::Hint(utf8(&p[4..])?));
        }
    }
    Ok(Message::Hint(utf8(p)?))
}

fn decode_progress_update(p: &[u8]) -> Result<Message, ProtocolError> {
    let (&flag, rest) = p.split_first().ok_or(ProtocolError::InsufficientData {
        needed: 1,
        available: 0,
    })?;
    let success = match flag {
        0x00 => false,
        0x01 => true,
        other => {
            return Err(ProtocolError::MalformedPayload(format!(
                "ProgressUpdate: invalid success flag 0x{other:02X}"
            )));
        }
    };
    Ok(Message::ProgressUpdate {
        success,
        guess: utf8(rest)?,
    })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    if buf.len() < offset + 4 {
        return Err(ProtocolError::InsufficientData {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

/// Writes a 4-byte big-endian length prefix followed by the UTF-8 bytes.
fn write_length_prefixed(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Reads a 4-byte length prefix that must account for the entire remainder
/// of the payload, then that many UTF-8 bytes.
fn read_exact_length_prefixed(buf: &[u8], context: &str) -> Result<String, ProtocolError> {
    let declared = read_u32(buf, 0)? as usize;
    let available = buf.len() - 4;
    if declared != available {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared,
            available,
        });
    }
    utf8(&buf[4..]).map_err(|_| {
        ProtocolError::MalformedPayload(format!("{context}: string field is not valid UTF-8"))
    })
}

fn utf8(p: &[u8]) -> Result<String, ProtocolError> {
    String::from_utf8(p.to_vec())
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))
}

/// Fixed one-byte `0x00` payloads (`Init` ack, `EndMatch`).  The client form
/// of `Init` carries no payload at all, so empty is accepted too.
fn expect_ack_byte(p: &[u8], context: &str) -> Result<(), ProtocolError> {
    match p {
        [] | [0x00] => Ok(()),
        _ => Err(ProtocolError::MalformedPayload(format!(
            "{context}: expected empty payload or a single 0x00 byte, got {} bytes",
            p.len()
        ))),
    }
}

fn expect_empty(p: &[u8], context: &str) -> Result<(), ProtocolError> {
    if p.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: expected no payload, got {} bytes",
            p.len()
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
