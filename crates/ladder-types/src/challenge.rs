//! Challenge and match records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BracketId, ChallengeId, MatchId, PlayerId};

/// Kind of match request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeType {
    /// Standard challenge against a player ranked above
    Challenge,
    /// Challenge against a player ranked below
    SmackDown,
    /// Follow-up for rank 1 after losing a SmackDown as defender
    SmackBack,
    /// Wide-range challenge backed by a Fast Track grant
    FastTrack,
}

impl ChallengeType {
    pub fn all() -> [ChallengeType; 4] {
        [
            ChallengeType::Challenge,
            ChallengeType::SmackDown,
            ChallengeType::SmackBack,
            ChallengeType::FastTrack,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Challenge => "Challenge",
            Self::SmackDown => "SmackDown",
            Self::SmackBack => "SmackBack",
            Self::FastTrack => "Fast Track",
        }
    }

    /// Whether the defender stands above the challenger
    pub fn targets_higher_rank(&self) -> bool {
        !matches!(self, Self::SmackDown)
    }
}

impl std::fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Challenge lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeStatus {
    /// Waiting for the defender to respond
    Pending,
    /// Defender agreed to play
    Accepted,
    /// Defender declined
    Declined,
    /// No response before the deadline
    Expired,
    /// Match recorded
    Completed,
}

impl ChallengeStatus {
    /// Get valid transitions from this state
    pub fn valid_transitions(&self) -> &'static [ChallengeStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Declined, Self::Expired],
            Self::Accepted => &[Self::Completed],
            Self::Declined | Self::Expired | Self::Completed => &[],
        }
    }

    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ChallengeStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

/// A challenge between two players of one bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub challenge_type: ChallengeType,
    pub challenger_id: PlayerId,
    pub defender_id: PlayerId,
    pub bracket_id: BracketId,
    pub status: ChallengeStatus,
    pub created_at: DateTime<Utc>,
    /// When the defender accepted or declined
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
    /// When the challenge reached a terminal state
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Create a pending challenge
    pub fn new(
        challenge_type: ChallengeType,
        challenger_id: PlayerId,
        defender_id: PlayerId,
        bracket_id: BracketId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ChallengeId::new(),
            challenge_type,
            challenger_id,
            defender_id,
            bracket_id,
            status: ChallengeStatus::Pending,
            created_at,
            responded_at: None,
            resolved_at: None,
        }
    }

    /// Whether the challenge is pending between `a` and `b` in either direction
    pub fn is_pending_between(&self, a: &PlayerId, b: &PlayerId) -> bool {
        self.status == ChallengeStatus::Pending
            && ((self.challenger_id == *a && self.defender_id == *b)
                || (self.challenger_id == *b && self.defender_id == *a))
    }

    pub fn involves(&self, player: &PlayerId) -> bool {
        self.challenger_id == *player || self.defender_id == *player
    }
}

/// Winner and loser reported for a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
}

impl MatchOutcome {
    pub fn new(winner_id: PlayerId, loser_id: PlayerId) -> Self {
        Self { winner_id, loser_id }
    }

    /// Outcome in which the challenger won
    pub fn challenger_won(challenge: &Challenge) -> Self {
        Self::new(challenge.challenger_id.clone(), challenge.defender_id.clone())
    }

    /// Outcome in which the defender held
    pub fn defender_won(challenge: &Challenge) -> Self {
        Self::new(challenge.defender_id.clone(), challenge.challenger_id.clone())
    }
}

/// Append-only audit record of a played match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub challenge_id: ChallengeId,
    pub challenge_type: ChallengeType,
    pub challenger_id: PlayerId,
    pub defender_id: PlayerId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    /// Free-form score, e.g. "7-5"
    pub score: String,
    pub played_at: DateTime<Utc>,
}

impl Match {
    /// Record the result of a challenge
    pub fn record(
        challenge: &Challenge,
        outcome: &MatchOutcome,
        score: impl Into<String>,
        played_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MatchId::new(),
            challenge_id: challenge.id.clone(),
            challenge_type: challenge.challenge_type,
            challenger_id: challenge.challenger_id.clone(),
            defender_id: challenge.defender_id.clone(),
            winner_id: outcome.winner_id.clone(),
            loser_id: outcome.loser_id.clone(),
            score: score.into(),
            played_at,
        }
    }

    pub fn challenger_won(&self) -> bool {
        self.winner_id == self.challenger_id
    }

    pub fn involves(&self, player: &PlayerId) -> bool {
        self.challenger_id == *player || self.defender_id == *player
    }
}
