//! Ladder Types - Canonical data for a skill-bracketed challenge ladder
//!
//! This crate holds the plain records exchanged between the ladder engine
//! and its external stores, with zero dependencies on the engine itself:
//!
//! - Identity types (PlayerId, BracketId, ChallengeId, MatchId)
//! - Player profile fields the engine reads and updates
//! - Per-bracket rank order with its invariant checker
//! - Challenge and match records
//! - Brackets and grace periods
//! - Denial reasons and the ladder error taxonomy
//!
//! # Rank Invariant
//!
//! Within a bracket, ranks are always a contiguous permutation of `1..=N`:
//! no gaps, no duplicates, one rank per ranked player. [`LadderRoster`]
//! refuses to exist in any other shape.

pub mod identity;
pub mod player;
pub mod roster;
pub mod challenge;
pub mod bracket;
pub mod error;

pub use identity::*;
pub use player::*;
pub use roster::*;
pub use challenge::*;
pub use bracket::*;
pub use error::*;

/// Version of the ladder types schema
pub const TYPES_VERSION: &str = "0.1.0";
