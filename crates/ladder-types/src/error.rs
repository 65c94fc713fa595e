//! Error types for the ladder
//!
//! Two families live here. [`DenialReason`] is ordinary data: a refused
//! challenge is an expected outcome, not a failure. [`LadderError`] is the
//! error path for inputs the engine cannot safely continue with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BracketId, PlayerId};

/// Result type for roster and resolver operations
pub type LadderResult<T> = std::result::Result<T, LadderError>;

/// Why a proposed challenge was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    /// Rank distance or direction is outside what the challenge type allows
    OutOfRange,
    /// Challenger and defender are not on the same bracket
    DifferentBracket,
    /// Defender is inside the post-win immunity window
    ImmunityActive,
    /// A pending challenge already exists between the pair
    DuplicatePendingChallenge,
    /// Fast Track requested without a grant
    NoFastTrackGrant,
    /// Fast Track grant is used up or past its expiry
    GrantExpired,
    /// SmackBack requested by a player who did not just lose a SmackDown as defender
    NotEligibleForSmackBack,
    /// One of the players holds no rank in the bracket
    NotRanked,
    /// Challenger and defender are the same player
    SelfChallenge,
}

impl DenialReason {
    /// Short human readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::OutOfRange => "defender is outside the allowed rank range",
            Self::DifferentBracket => "players are on different brackets",
            Self::ImmunityActive => "defender is immune after a recent win",
            Self::DuplicatePendingChallenge => "a challenge between these players is already pending",
            Self::NoFastTrackGrant => "challenger holds no Fast Track grant",
            Self::GrantExpired => "Fast Track grant is used up or expired",
            Self::NotEligibleForSmackBack => "SmackBack is only open to the defender who just lost a SmackDown",
            Self::NotRanked => "player holds no rank on this bracket",
            Self::SelfChallenge => "a player cannot challenge themselves",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Ladder error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LadderError {
    /// Ranks of a bracket are not a contiguous permutation of 1..N.
    /// Callers must re-fetch a fresh roster snapshot and retry from scratch.
    #[error("Rank invariant violated on bracket {bracket}: {detail}")]
    RankInvariantViolation { bracket: BracketId, detail: String },

    /// Player has no rank on the bracket
    #[error("Player {player} is not ranked on bracket {bracket}")]
    PlayerNotRanked { player: PlayerId, bracket: BracketId },

    /// Player is already ranked on the bracket
    #[error("Player {player} is already ranked on bracket {bracket}")]
    AlreadyRanked { player: PlayerId, bracket: BracketId },

    /// Reported winner and loser are not the challenge's two players
    #[error("Match outcome does not name the challenge's players")]
    OutcomeMismatch,

    /// Record belongs to a different bracket than the roster
    #[error("Bracket mismatch: expected {expected}, got {actual}")]
    BracketMismatch { expected: BracketId, actual: BracketId },

    /// Bracket is missing from the bracket table
    #[error("Unknown bracket {0}")]
    UnknownBracket(BracketId),

    /// Bracket table bounds overlap or leave gaps
    #[error("Invalid bracket table: {0}")]
    InvalidBracketTable(String),
}
