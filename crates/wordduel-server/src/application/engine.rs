//! Protocol engine: the server-side state machine.
//!
//! The engine receives one decoded message at a time together with the key of
//! the connection it arrived on, consults the registry and match table, and
//! performs the appropriate transition.  It owns all shared mutable state, so
//! callers serialise access by holding a single lock around it; every inbound
//! chunk is handled to completion before the next one, and paired mutations
//! (match create / match end) happen inside one call.
//!
//! Per-connection lifecycle:
//!
//! ```text
//! AwaitingInit ──► AwaitingPassword ──► Idle ──► InMatch
//!                        │                ▲         │
//!                  (wrong secret:         └─────────┘
//!                   connection closed)    (match over)
//! ```
//!
//! Guesses and hints are gated by the match-table lookup rather than the
//! session state, so a `GuessWord` from an idle connection is answered with
//! the same "No ongoing match found" error a stale match would produce.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};
use wordduel_core::{decode_message, GuessOutcome, Match, Message, PlayerId};

use crate::application::matches::{MatchTable, MatchTableError};
use crate::application::registry::{ConnectionRegistry, OutboundHandle};

/// Process-unique key for a connection, assigned by the listener on accept.
///
/// Distinct from [`PlayerId`]: a key exists from the moment the socket is
/// accepted, while an identity exists only after the password is verified.
pub type ConnectionKey = u64;

/// What the listener should do with the connection after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepOpen,
    /// Terminate the connection (failed authentication).
    Close,
}

/// Where a connection is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected; nothing received yet.
    AwaitingInit,
    /// Init acknowledged; the next message should carry the secret.
    AwaitingPassword,
    /// Authenticated and free to browse opponents or start a match.
    Idle,
    /// Paired into a live match.
    InMatch,
}

/// Protocol-level failures reported to the offending connection.
///
/// The `Display` text is exactly what goes into the Error frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Wrong password; fatal to the connection.
    #[error("Invalid password")]
    AuthenticationFailed,
    /// The targeted identity is not online.
    #[error("Opponent not found")]
    UnknownOpponent,
    /// One of the would-be participants is already paired.
    #[error("Match already in progress")]
    MatchInProgress,
    /// Guess or hint without a live match entry.
    #[error("No ongoing match found")]
    NoActiveMatch,
    /// A message type the server never expects from a client.
    #[error("Unknown message type")]
    UnexpectedMessage,
}

/// Engine settings, derived from the server configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shared secret compared (after trimming) against `PasswordResponse`.
    pub password: String,
    /// Wrong guesses allowed per match before the server force-ends it.
    pub max_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            password: "secret".to_string(),
            max_attempts: wordduel_core::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

struct Session {
    state: SessionState,
    player: Option<PlayerId>,
    outbound: OutboundHandle,
}

/// The protocol engine and all state it governs.
pub struct Engine {
    config: EngineConfig,
    registry: ConnectionRegistry,
    matches: MatchTable,
    sessions: HashMap<ConnectionKey, Session>,
    by_player: HashMap<PlayerId, ConnectionKey>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            matches: MatchTable::new(),
            sessions: HashMap::new(),
            by_player: HashMap::new(),
        }
    }

    /// Tracks a freshly accepted connection.
    pub fn connect(&mut self, key: ConnectionKey, outbound: OutboundHandle) {
        debug!(key, "new connection");
        self.sessions.insert(
            key,
            Session {
                state: SessionState::AwaitingInit,
                player: None,
                outbound,
            },
        );
    }

    /// Decodes one inbound chunk and dispatches it.
    ///
    /// Malformed chunks are answered with an Error frame and leave all state
    /// unchanged.
    pub fn handle_chunk(&mut self, key: ConnectionKey, bytes: &[u8]) -> Disposition {
        match decode_message(bytes) {
            Ok(msg) => self.handle_message(key, msg),
            Err(e) => {
                warn!(key, error = %e, "failed to decode inbound chunk");
                self.reply(key, &Message::Error(e.to_string()));
                Disposition::KeepOpen
            }
        }
    }

    /// Dispatches one decoded message.
    pub fn handle_message(&mut self, key: ConnectionKey, msg: Message) -> Disposition {
        match msg {
            Message::Init => self.on_init(key),
            Message::PasswordResponse(secret) => return self.on_password(key, &secret),
            Message::RequestOpponents => self.on_request_opponents(key),
            Message::RequestMatch { opponent, word } => self.on_request_match(key, opponent, word),
            Message::GuessWord(guess) => self.on_guess(key, &guess),
            Message::Hint(text) => self.on_hint(key, &text),
            other => {
                // Server-to-client tags arriving from a client.
                debug!(key, msg_type = ?other.message_type(), "unexpected message from client");
                self.reply_error(key, &EngineError::UnexpectedMessage);
            }
        }
        Disposition::KeepOpen
    }

    /// Forgets the connection and tears down anything it was part of.
    ///
    /// A departed player's match is ended proactively: the opponent is
    /// notified and returned to idle rather than left pointing at a vanished
    /// identity.
    pub fn disconnect(&mut self, key: ConnectionKey) {
        let Some(session) = self.sessions.remove(&key) else {
            return;
        };
        let Some(player) = session.player else {
            debug!(key, "unauthenticated connection closed");
            return;
        };
        self.by_player.remove(&player);
        self.registry.remove(player);
        info!(player, "player disconnected");

        if let Some(m) = self.matches.end_for(player) {
            if let Some(partner) = m.partner_of(player) {
                self.send_to_player(
                    partner,
                    &Message::Text(format!("Player {player} left; the match is over.")),
                );
                self.send_to_player(partner, &Message::EndMatch);
                self.set_state_of_player(partner, SessionState::Idle);
                info!(initiator = m.initiator(), opponent = m.opponent(), "match ended");
            }
        }
    }

    /// Session state of a connection, if it is still tracked.
    pub fn state_of(&self, key: ConnectionKey) -> Option<SessionState> {
        self.sessions.get(&key).map(|s| s.state)
    }

    /// Identity of a connection, once assigned.
    pub fn player_of(&self, key: ConnectionKey) -> Option<PlayerId> {
        self.sessions.get(&key).and_then(|s| s.player)
    }

    /// Number of authenticated, online connections.
    pub fn online_count(&self) -> usize {
        self.registry.len()
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    fn on_init(&mut self, key: ConnectionKey) {
        let Some(session) = self.sessions.get_mut(&key) else {
            return;
        };
        if session.state == SessionState::AwaitingInit {
            session.state = SessionState::AwaitingPassword;
        }
        debug!(key, "handshake opened");
        session.outbound.send(&Message::Init);
    }

    fn on_password(&mut self, key: ConnectionKey, submitted: &str) -> Disposition {
        let Some(session) = self.sessions.get_mut(&key) else {
            return Disposition::Close;
        };
        if session.player.is_some() {
            debug!(key, "ignoring password from an authenticated connection");
            return Disposition::KeepOpen;
        }

        if submitted.trim() == self.config.password {
            let id = self.registry.register(session.outbound.clone());
            session.player = Some(id);
            session.state = SessionState::Idle;
            self.by_player.insert(id, key);
            info!(player = id, "connection authenticated");
            session.outbound.send(&Message::AssignId(id));
            Disposition::KeepOpen
        } else {
            // Single attempt: report the failure and drop the connection.
            warn!(key, "authentication failed; closing connection");
            session
                .outbound
                .send(&Message::Error(EngineError::AuthenticationFailed.to_string()));
            Disposition::Close
        }
    }

    fn on_request_opponents(&mut self, key: ConnectionKey) {
        let Some(me) = self.player_of(key) else {
            debug!(key, "opponents request from unauthenticated connection");
            return;
        };
        let opponents = self.registry.list_excluding(me);
        debug!(player = me, count = opponents.len(), "sending opponents list");
        self.reply(key, &Message::OpponentsResponse(opponents));
    }

    fn on_request_match(&mut self, key: ConnectionKey, opponent: PlayerId, word: String) {
        let Some(me) = self.player_of(key) else {
            debug!(key, "match request from unauthenticated connection");
            return;
        };
        if opponent == me || self.registry.lookup(opponent).is_none() {
            self.reply_error(key, &EngineError::UnknownOpponent);
            return;
        }

        let m = Match::new(me, opponent, word, self.config.max_attempts);
        match self.matches.create(m) {
            Ok(()) => {}
            Err(MatchTableError::AlreadyInMatch(player)) => {
                debug!(requester = me, blocked_on = player, "match request rejected");
                self.reply_error(key, &EngineError::MatchInProgress);
                return;
            }
        }

        self.set_state_of_player(me, SessionState::InMatch);
        self.set_state_of_player(opponent, SessionState::InMatch);
        info!(initiator = me, opponent, "match created");
        self.send_to_player(me, &Message::MatchConfirm);
        self.send_to_player(opponent, &Message::MatchConfirm);
    }

    fn on_guess(&mut self, key: ConnectionKey, guess: &str) {
        let Some(me) = self.player_of(key) else {
            debug!(key, "guess from unauthenticated connection");
            return;
        };
        let (outcome, partner) = match self.matches.get_mut(me) {
            Some(m) => (m.evaluate_guess(guess), m.partner_of(me)),
            None => {
                self.reply_error(key, &EngineError::NoActiveMatch);
                return;
            }
        };
        let Some(partner) = partner else {
            self.reply_error(key, &EngineError::NoActiveMatch);
            return;
        };

        match outcome {
            GuessOutcome::Correct => {
                info!(player = me, "word guessed correctly");
                self.broadcast(&Message::Text(format!(
                    "\n\n*** WORD GUESSED ***\nPlayer {me} guessed the word correctly!\n\n"
                )));
                self.end_match_for(me);
            }
            GuessOutcome::Incorrect {
                attempts_used,
                attempts_left,
            } => {
                debug!(player = me, attempts_used, attempts_left, "wrong guess");
                let update = Message::ProgressUpdate {
                    success: false,
                    guess: guess.to_string(),
                };
                self.send_to_player(me, &update);
                self.send_to_player(partner, &update);
            }
            GuessOutcome::BudgetExhausted { attempts_used } => {
                info!(player = me, attempts_used, "attempt budget exhausted");
                let update = Message::ProgressUpdate {
                    success: false,
                    guess: guess.to_string(),
                };
                self.send_to_player(me, &update);
                self.send_to_player(partner, &update);
                self.broadcast(&Message::Text(format!(
                    "Player {me} failed to guess the word."
                )));
                self.end_match_for(me);
            }
        }
    }

    fn on_hint(&mut self, key: ConnectionKey, text: &str) {
        let Some(me) = self.player_of(key) else {
            debug!(key, "hint from unauthenticated connection");
            return;
        };
        let partner = match self.matches.get(me).and_then(|m| m.partner_of(me)) {
            Some(p) => p,
            None => {
                self.reply_error(key, &EngineError::NoActiveMatch);
                return;
            }
        };
        if self.registry.lookup(partner).is_none() {
            self.reply_error(key, &EngineError::UnknownOpponent);
            return;
        }
        debug!(from = me, to = partner, "relaying hint");
        self.send_to_player(partner, &Message::Hint(text.to_string()));
    }

    /// Deletes the pairing and returns both participants to idle.
    fn end_match_for(&mut self, player: PlayerId) {
        if let Some(m) = self.matches.end_for(player) {
            for participant in [m.initiator(), m.opponent()] {
                self.send_to_player(participant, &Message::EndMatch);
                self.set_state_of_player(participant, SessionState::Idle);
            }
            info!(initiator = m.initiator(), opponent = m.opponent(), "match ended");
        }
    }

    // ── Outbound helpers ─────────────────────────────────────────────────────

    fn reply(&self, key: ConnectionKey, msg: &Message) {
        if let Some(session) = self.sessions.get(&key) {
            session.outbound.send(msg);
        }
    }

    fn reply_error(&self, key: ConnectionKey, err: &EngineError) {
        self.reply(key, &Message::Error(err.to_string()));
    }

    fn send_to_player(&self, player: PlayerId, msg: &Message) {
        match self.registry.lookup(player) {
            Some(handle) => handle.send(msg),
            None => debug!(player, "outbound message dropped: player not online"),
        }
    }

    fn broadcast(&self, msg: &Message) {
        for (_, handle) in self.registry.iter() {
            handle.send(msg);
        }
    }

    fn set_state_of_player(&mut self, player: PlayerId, state: SessionState) {
        if let Some(&key) = self.by_player.get(&player) {
            if let Some(session) = self.sessions.get_mut(&key) {
                session.state = state;
            }
        }
    }
}
