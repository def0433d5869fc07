//! rugby-sim - rugby union match simulation
//!
//! A match is played by a [`game::GameEngine`] bound to a [`game::Match`] and
//! the two selected [`core::Team`]s. The engine walks the match second by
//! second through open play, set pieces and stoppages, reporting to an
//! injected presentation sink. Leagues of matches are driven by
//! [`season::League`], which plays the fixtures of a round in parallel.

pub mod core;
pub mod demo;
pub mod error;
pub mod game;
pub mod persist;
pub mod rng;
pub mod season;

pub use error::{Result, SimError};
