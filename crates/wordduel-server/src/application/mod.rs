//! Application layer of the game server.
//!
//! This layer holds the protocol state machine and the shared mutable state
//! it governs.  It contains no socket I/O: outbound traffic goes through
//! [`registry::OutboundHandle`] channels owned by the network layer, so the
//! whole layer is testable without opening a single port.
//!
//! # Sub-modules
//!
//! - **`engine`** – The protocol engine: receives one decoded message at a
//!   time, consults the registry and match table, and performs the
//!   appropriate transition.  This is where every invariant of the game
//!   lives.
//!
//! - **`registry`** – The directory of online, authenticated connections
//!   keyed by assigned identity.
//!
//! - **`matches`** – The match table pairing two connections with the secret
//!   word and the shared attempt counter.

pub mod engine;
pub mod matches;
pub mod registry;
