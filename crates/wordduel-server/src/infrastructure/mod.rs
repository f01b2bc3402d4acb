//! Infrastructure layer for the game server.
//!
//! Contains the OS-facing adapters: the TCP listener and the configuration
//! file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `wordduel_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
