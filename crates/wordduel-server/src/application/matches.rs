//! Match table: which players are paired, and with what word.
//!
//! One [`Match`] is stored per live pairing, with a per-player index so both
//! participants resolve to the same entry.  Creation and teardown each touch
//! the state in a single call, so a half-created or half-deleted pairing is
//! never observable — the symmetry invariant holds by construction.

use std::collections::HashMap;

use thiserror::Error;
use wordduel_core::{Match, PlayerId};

/// Error type for match-table operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchTableError {
    /// One of the would-be participants is already paired.
    #[error("player {0} is already in a match")]
    AlreadyInMatch(PlayerId),
}

/// Table of live matches, indexed by participant.
///
/// The match itself is keyed by its initiator; the index maps *both*
/// participants to that key.
#[derive(Debug, Default)]
pub struct MatchTable {
    matches: HashMap<PlayerId, Match>,
    index: HashMap<PlayerId, PlayerId>,
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new pairing, making both participants resolve to it.
    ///
    /// # Errors
    ///
    /// Returns [`MatchTableError::AlreadyInMatch`] if either participant is
    /// part of a live match; the table is left unchanged.
    pub fn create(&mut self, m: Match) -> Result<(), MatchTableError> {
        for player in [m.initiator(), m.opponent()] {
            if self.index.contains_key(&player) {
                return Err(MatchTableError::AlreadyInMatch(player));
            }
        }
        let key = m.initiator();
        self.index.insert(m.initiator(), key);
        self.index.insert(m.opponent(), key);
        self.matches.insert(key, m);
        Ok(())
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.index.contains_key(&player)
    }

    pub fn get(&self, player: PlayerId) -> Option<&Match> {
        self.matches.get(self.index.get(&player)?)
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut Match> {
        self.matches.get_mut(self.index.get(&player)?)
    }

    /// Removes the pairing `player` is part of, returning it.
    ///
    /// Both index entries and the match itself go in one call.
    pub fn end_for(&mut self, player: PlayerId) -> Option<Match> {
        let key = self.index.get(&player).copied()?;
        let m = self.matches.remove(&key)?;
        self.index.remove(&m.initiator());
        self.index.remove(&m.opponent());
        Some(m)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
