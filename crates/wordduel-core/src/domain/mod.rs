//! Domain entities for WordDuel.
//!
//! Pure business logic with no infrastructure dependencies: the [`game::Match`]
//! entity, guess evaluation, and the shared attempt budget.  Code here can be
//! compiled and tested on any platform without sockets or external setup.

pub mod game;
