//! Challenge lifecycle
//!
//! ```text
//! Pending ──accept──> Accepted ──complete──> Completed
//!    │
//!    ├──decline──> Declined   (unit rank swap, uses one of the defender's declines)
//!    └──expire───> Expired    (no roster effect)
//! ```
//!
//! Every operation takes snapshots and returns new ones: the updated
//! challenge, and where relevant the new roster, the updated players and the
//! match record. Nothing is written anywhere; the caller persists the output
//! atomically.

use chrono::{DateTime, Utc};
use ladder_types::{
    Challenge, ChallengeStatus, ChallengeType, DenialReason, LadderError, LadderRoster, Match,
    MatchOutcome, Player, PlayerId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LadderConfig;
use crate::eligibility::{Eligibility, EligibilityContext, EligibilityEvaluator};
use crate::resolver::MatchResolver;

/// Score recorded when a challenge is settled by forfeit
pub const FORFEIT_SCORE: &str = "forfeit";

/// Errors from lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Decline quota exhausted: {used} of {allowed} declines used in the last {window_days} days")]
    DeclineQuotaExhausted {
        used: usize,
        allowed: usize,
        window_days: i64,
    },

    #[error("Invalid challenge transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ChallengeStatus,
        to: ChallengeStatus,
    },

    #[error("Response deadline {deadline} has not passed")]
    DeadlineNotReached { deadline: DateTime<Utc> },

    #[error("Player {0} is not a party to this challenge")]
    NotAParticipant(PlayerId),

    #[error(transparent)]
    Ladder(#[from] LadderError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Decline quota standing of a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineAllowance {
    /// Declines inside the current window
    pub used: usize,
    /// Declines still available now
    pub remaining: usize,
    /// When the oldest counted decline ages out
    pub next_release: Option<DateTime<Utc>>,
}

/// Result of a decline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineOutcome {
    pub challenge: Challenge,
    pub roster: LadderRoster,
    /// Defender with the decline recorded
    pub defender: Player,
}

/// Result of a completed match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub challenge: Challenge,
    pub record: Match,
    pub roster: LadderRoster,
    pub challenger: Player,
    pub defender: Player,
}

impl CompletionOutcome {
    pub fn winner(&self) -> &Player {
        if self.record.challenger_won() {
            &self.challenger
        } else {
            &self.defender
        }
    }
}

/// Drives challenges through their states
#[derive(Debug, Clone, Default)]
pub struct ChallengeLifecycle {
    config: LadderConfig,
    evaluator: EligibilityEvaluator,
}

impl ChallengeLifecycle {
    pub fn new(config: LadderConfig) -> Self {
        let evaluator = EligibilityEvaluator::new(config.ranges.clone());
        Self { config, evaluator }
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    /// Create a pending challenge if the rules allow it
    pub fn issue(
        &self,
        challenge_type: ChallengeType,
        challenger: &Player,
        defender: &Player,
        context: &EligibilityContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Challenge, DenialReason> {
        match self.evaluator.evaluate(challenge_type, challenger, defender, context, now) {
            Eligibility::Allowed => {
                let challenge = Challenge::new(
                    challenge_type,
                    challenger.id.clone(),
                    defender.id.clone(),
                    context.roster.bracket_id().clone(),
                    now,
                );
                info!(
                    "{} {} issued: {} -> {}",
                    challenge_type, challenge.id, challenger.id, defender.id
                );
                Ok(challenge)
            }
            Eligibility::Denied(reason) => Err(reason),
        }
    }

    /// Defender agrees to play; ranks are untouched
    pub fn accept(&self, challenge: &Challenge, now: DateTime<Utc>) -> LifecycleResult<Challenge> {
        let mut accepted = transition(challenge, ChallengeStatus::Accepted)?;
        accepted.responded_at = Some(now);
        info!("Challenge {} accepted", challenge.id);
        Ok(accepted)
    }

    /// Decline quota standing of `player` at `now`
    pub fn decline_allowance(&self, player: &Player, now: DateTime<Utc>) -> DeclineAllowance {
        let window = self.config.declines.window();
        let used = player.declines_within(window, now);
        let next_release = player
            .decline_timestamps
            .iter()
            .filter(|at| **at <= now && now - **at < window)
            .min()
            .map(|oldest| *oldest + window);

        DeclineAllowance {
            used,
            remaining: self.config.declines.max_declines.saturating_sub(used),
            next_release,
        }
    }

    /// Defender refuses the challenge and pays with one rank.
    ///
    /// Refused with [`LifecycleError::DeclineQuotaExhausted`] when the
    /// defender has no decline left; the challenge then stays pending and can
    /// still be accepted or settled with [`ChallengeLifecycle::forfeit`].
    pub fn decline(
        &self,
        challenge: &Challenge,
        defender: &Player,
        roster: &LadderRoster,
        now: DateTime<Utc>,
    ) -> LifecycleResult<DeclineOutcome> {
        if defender.id != challenge.defender_id {
            return Err(LifecycleError::NotAParticipant(defender.id.clone()));
        }
        let mut declined = transition(challenge, ChallengeStatus::Declined)?;

        let allowance = self.decline_allowance(defender, now);
        if allowance.remaining == 0 {
            warn!(
                "Decline of {} refused: {} has used {} declines",
                challenge.id, defender.id, allowance.used
            );
            return Err(LifecycleError::DeclineQuotaExhausted {
                used: allowance.used,
                allowed: self.config.declines.max_declines,
                window_days: self.config.declines.window_days,
            });
        }

        let roster = MatchResolver::apply_decline(roster, challenge)?;

        let mut defender = defender.clone();
        defender.decline_timestamps.push(now);
        declined.responded_at = Some(now);
        declined.resolved_at = Some(now);

        info!(
            "Challenge {} declined by {} ({} declines left)",
            challenge.id,
            defender.id,
            allowance.remaining - 1
        );
        Ok(DeclineOutcome {
            challenge: declined,
            roster,
            defender,
        })
    }

    /// Record the played match of an accepted challenge.
    ///
    /// The winner gains immunity; a Fast Track challenger spends one use of
    /// the grant whatever the result.
    pub fn complete(
        &self,
        challenge: &Challenge,
        roster: &LadderRoster,
        challenger: &Player,
        defender: &Player,
        outcome: &MatchOutcome,
        score: impl Into<String>,
        now: DateTime<Utc>,
    ) -> LifecycleResult<CompletionOutcome> {
        if challenger.id != challenge.challenger_id {
            return Err(LifecycleError::NotAParticipant(challenger.id.clone()));
        }
        if defender.id != challenge.defender_id {
            return Err(LifecycleError::NotAParticipant(defender.id.clone()));
        }
        let mut completed = transition(challenge, ChallengeStatus::Completed)?;

        let roster = MatchResolver::resolve(roster, challenge, outcome)?;
        let record = Match::record(challenge, outcome, score, now);

        let mut challenger = challenger.clone();
        let mut defender = defender.clone();

        if challenge.challenge_type == ChallengeType::FastTrack {
            challenger.fast_track_grant = challenger.fast_track_grant.as_ref().map(|g| g.consumed());
        }

        let immune_until = now + self.config.immunity();
        if record.challenger_won() {
            challenger.immunity_until = Some(immune_until);
        } else {
            defender.immunity_until = Some(immune_until);
        }

        completed.resolved_at = Some(now);
        info!(
            "{} {} completed: {} beat {} ({})",
            challenge.challenge_type, challenge.id, record.winner_id, record.loser_id, record.score
        );

        Ok(CompletionOutcome {
            challenge: completed,
            record,
            roster,
            challenger,
            defender,
        })
    }

    /// Settle a challenge the defender will not play as a challenger win.
    ///
    /// Works from Pending (implicitly accepting first) or Accepted.
    pub fn forfeit(
        &self,
        challenge: &Challenge,
        roster: &LadderRoster,
        challenger: &Player,
        defender: &Player,
        now: DateTime<Utc>,
    ) -> LifecycleResult<CompletionOutcome> {
        let accepted = match challenge.status {
            ChallengeStatus::Pending => self.accept(challenge, now)?,
            _ => challenge.clone(),
        };
        info!("Challenge {} forfeited by {}", challenge.id, defender.id);
        let outcome = MatchOutcome::challenger_won(&accepted);
        self.complete(&accepted, roster, challenger, defender, &outcome, FORFEIT_SCORE, now)
    }

    /// Deadline after which a pending challenge may be expired
    pub fn expiry_deadline(&self, challenge: &Challenge) -> DateTime<Utc> {
        challenge.created_at + self.config.pending_expiry()
    }

    /// Expire a pending challenge once `deadline` has passed
    pub fn expire(
        &self,
        challenge: &Challenge,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> LifecycleResult<Challenge> {
        let mut expired = transition(challenge, ChallengeStatus::Expired)?;
        if now < deadline {
            return Err(LifecycleError::DeadlineNotReached { deadline });
        }
        expired.resolved_at = Some(now);
        info!("Challenge {} expired", challenge.id);
        Ok(expired)
    }
}

fn transition(challenge: &Challenge, to: ChallengeStatus) -> LifecycleResult<Challenge> {
    if !challenge.status.can_transition_to(to) {
        return Err(LifecycleError::InvalidTransition {
            from: challenge.status,
            to,
        });
    }
    let mut next = challenge.clone();
    next.status = to;
    Ok(next)
}
