//! Challenge eligibility
//!
//! Decides whether a proposed challenge is legal. Evaluation is a pure query
//! over a request-scoped [`EligibilityContext`]; refusals come back as
//! [`DenialReason`] values, never as errors.
//!
//! ## Rules
//!
//! With `Rc` the challenger's rank and `Rd` the defender's (lower is better):
//!
//! - **Challenge**: `Rd < Rc`, `Rc - Rd <= 4`, defender not immune, no pending
//!   challenge between the pair
//! - **SmackDown**: `Rd > Rc`, `Rd - Rc <= 5`, defender not immune
//! - **SmackBack**: challenger's last resolved match was a SmackDown lost as
//!   defender, and the target is rank 1
//! - **FastTrack**: usable grant, `Rd < Rc`, `Rc - Rd <= 6`

use chrono::{DateTime, Utc};
use ladder_types::{
    Challenge, ChallengeType, DenialReason, LadderRoster, Match, Player, PlayerId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RangeConfig;

/// Result of an eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    Allowed,
    Denied(DenialReason),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Allowed => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}

/// Ladder state a single eligibility request is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    /// Roster of the bracket the challenge would be played on
    pub roster: &'a LadderRoster,
    /// Open challenges on the bracket
    pub pending: &'a [Challenge],
    /// Resolved matches involving the challenger, in any order
    pub challenger_history: &'a [Match],
}

impl<'a> EligibilityContext<'a> {
    pub fn new(roster: &'a LadderRoster) -> Self {
        Self {
            roster,
            pending: &[],
            challenger_history: &[],
        }
    }

    pub fn with_pending(mut self, pending: &'a [Challenge]) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_history(mut self, history: &'a [Match]) -> Self {
        self.challenger_history = history;
        self
    }

    /// Most recent resolved match the player took part in
    fn last_match_of(&self, player: &PlayerId) -> Option<&'a Match> {
        self.challenger_history
            .iter()
            .filter(|m| m.involves(player))
            .max_by_key(|m| m.played_at)
    }
}

/// Evaluates challenge requests against the ladder rules
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    ranges: RangeConfig,
}

impl EligibilityEvaluator {
    pub fn new(ranges: RangeConfig) -> Self {
        Self { ranges }
    }

    /// Decide whether `challenger` may issue a `challenge_type` against `defender`
    pub fn evaluate(
        &self,
        challenge_type: ChallengeType,
        challenger: &Player,
        defender: &Player,
        context: &EligibilityContext<'_>,
        now: DateTime<Utc>,
    ) -> Eligibility {
        let verdict = match self.check(challenge_type, challenger, defender, context, now) {
            Ok(()) => Eligibility::Allowed,
            Err(reason) => Eligibility::Denied(reason),
        };

        if let Eligibility::Denied(reason) = verdict {
            debug!(
                "{} from {} to {} denied: {}",
                challenge_type, challenger.id, defender.id, reason
            );
        }
        verdict
    }

    fn check(
        &self,
        challenge_type: ChallengeType,
        challenger: &Player,
        defender: &Player,
        context: &EligibilityContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), DenialReason> {
        if challenger.id == defender.id {
            return Err(DenialReason::SelfChallenge);
        }

        let bracket = context.roster.bracket_id();
        if challenger.bracket_id != defender.bracket_id || challenger.bracket_id != *bracket {
            return Err(DenialReason::DifferentBracket);
        }

        let rc = context.roster.rank_of(&challenger.id).ok_or(DenialReason::NotRanked)?;
        let rd = context.roster.rank_of(&defender.id).ok_or(DenialReason::NotRanked)?;

        match challenge_type {
            ChallengeType::Challenge => {
                within_above(rc, rd, self.ranges.challenge)?;
                not_immune(defender, now)?;
                let duplicate = context
                    .pending
                    .iter()
                    .any(|c| c.is_pending_between(&challenger.id, &defender.id));
                if duplicate {
                    return Err(DenialReason::DuplicatePendingChallenge);
                }
            }
            ChallengeType::SmackDown => {
                // Rank 1 is only ever reached through a SmackBack
                if rd <= rc || rd - rc > self.ranges.smackdown || rd == 1 {
                    return Err(DenialReason::OutOfRange);
                }
                not_immune(defender, now)?;
            }
            ChallengeType::SmackBack => {
                let lost_smackdown_as_defender = context
                    .last_match_of(&challenger.id)
                    .map_or(false, |m| {
                        m.challenge_type == ChallengeType::SmackDown
                            && m.defender_id == challenger.id
                            && m.loser_id == challenger.id
                    });
                if !lost_smackdown_as_defender {
                    return Err(DenialReason::NotEligibleForSmackBack);
                }
                if rd != 1 {
                    return Err(DenialReason::OutOfRange);
                }
            }
            ChallengeType::FastTrack => {
                let grant = challenger
                    .fast_track_grant
                    .as_ref()
                    .ok_or(DenialReason::NoFastTrackGrant)?;
                if !grant.is_usable(now) {
                    return Err(DenialReason::GrantExpired);
                }
                within_above(rc, rd, self.ranges.fast_track)?;
            }
        }

        Ok(())
    }
}

/// Defender must stand above the challenger, at most `range` ranks away
fn within_above(rc: u32, rd: u32, range: u32) -> Result<(), DenialReason> {
    if rd < rc && rc - rd <= range {
        Ok(())
    } else {
        Err(DenialReason::OutOfRange)
    }
}

fn not_immune(defender: &Player, now: DateTime<Utc>) -> Result<(), DenialReason> {
    if defender.is_immune(now) {
        Err(DenialReason::ImmunityActive)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ladder_types::{BracketId, FastTrackGrant, MatchOutcome};

    struct Fixture {
        roster: LadderRoster,
        players: Vec<Player>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            let bracket = BracketId::new();
            let players: Vec<Player> = (0..n)
                .map(|i| Player::new(format!("P{}", i + 1), 450, bracket.clone()))
                .collect();
            let roster =
                LadderRoster::from_order(bracket, players.iter().map(|p| p.id.clone()).collect())
                    .unwrap();
            Self { roster, players }
        }

        /// Player holding `rank` (1-indexed)
        fn at(&self, rank: usize) -> &Player {
            &self.players[rank - 1]
        }

        fn evaluate(&self, challenge_type: ChallengeType, rc: usize, rd: usize) -> Eligibility {
            self.evaluate_with(challenge_type, self.at(rc), self.at(rd), &[], &[])
        }

        fn evaluate_with(
            &self,
            challenge_type: ChallengeType,
            challenger: &Player,
            defender: &Player,
            pending: &[Challenge],
            history: &[Match],
        ) -> Eligibility {
            let context = EligibilityContext::new(&self.roster)
                .with_pending(pending)
                .with_history(history);
            EligibilityEvaluator::default().evaluate(
                challenge_type,
                challenger,
                defender,
                &context,
                Utc::now(),
            )
        }
    }

    #[test]
    fn test_challenge_range() {
        let f = Fixture::new(10);
        assert_eq!(f.evaluate(ChallengeType::Challenge, 9, 5), Eligibility::Allowed);
        assert_eq!(
            f.evaluate(ChallengeType::Challenge, 9, 1),
            Eligibility::Denied(DenialReason::OutOfRange)
        );
        // Challenges only go upward
        assert_eq!(
            f.evaluate(ChallengeType::Challenge, 5, 7),
            Eligibility::Denied(DenialReason::OutOfRange)
        );
    }

    #[test]
    fn test_smackdown_range() {
        let f = Fixture::new(10);
        assert_eq!(f.evaluate(ChallengeType::SmackDown, 3, 8), Eligibility::Allowed);
        assert_eq!(
            f.evaluate(ChallengeType::SmackDown, 3, 9),
            Eligibility::Denied(DenialReason::OutOfRange)
        );
        // Upward SmackDowns are refused whatever the distance
        assert_eq!(
            f.evaluate(ChallengeType::SmackDown, 9, 5),
            Eligibility::Denied(DenialReason::OutOfRange)
        );
        assert_eq!(
            f.evaluate(ChallengeType::SmackDown, 9, 3),
            Eligibility::Denied(DenialReason::OutOfRange)
        );
    }

    #[test]
    fn test_immune_defender() {
        let mut f = Fixture::new(6);
        f.players[1].immunity_until = Some(Utc::now() + Duration::days(3));

        assert_eq!(
            f.evaluate(ChallengeType::Challenge, 4, 2),
            Eligibility::Denied(DenialReason::ImmunityActive)
        );
        assert_eq!(
            f.evaluate(ChallengeType::SmackDown, 1, 2),
            Eligibility::Denied(DenialReason::ImmunityActive)
        );
    }

    #[test]
    fn test_duplicate_pending_challenge() {
        let f = Fixture::new(6);
        let existing = Challenge::new(
            ChallengeType::Challenge,
            f.at(4).id.clone(),
            f.at(2).id.clone(),
            f.roster.bracket_id().clone(),
            Utc::now(),
        );

        let verdict =
            f.evaluate_with(ChallengeType::Challenge, f.at(4), f.at(2), &[existing], &[]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::DuplicatePendingChallenge));
    }

    #[test]
    fn test_different_bracket() {
        let f = Fixture::new(4);
        let mut outsider = f.at(1).clone();
        outsider.bracket_id = BracketId::new();

        let verdict = f.evaluate_with(ChallengeType::Challenge, f.at(3), &outsider, &[], &[]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::DifferentBracket));
    }

    #[test]
    fn test_unranked_and_self() {
        let f = Fixture::new(4);
        let newcomer = Player::new("New", 450, f.roster.bracket_id().clone());

        let verdict = f.evaluate_with(ChallengeType::Challenge, &newcomer, f.at(2), &[], &[]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::NotRanked));

        assert_eq!(
            f.evaluate(ChallengeType::Challenge, 2, 2),
            Eligibility::Denied(DenialReason::SelfChallenge)
        );
    }

    fn smackdown_match(f: &Fixture, challenger: usize, defender: usize, challenger_wins: bool) -> Match {
        let challenge = Challenge::new(
            ChallengeType::SmackDown,
            f.at(challenger).id.clone(),
            f.at(defender).id.clone(),
            f.roster.bracket_id().clone(),
            Utc::now() - Duration::days(2),
        );
        let outcome = if challenger_wins {
            MatchOutcome::challenger_won(&challenge)
        } else {
            MatchOutcome::defender_won(&challenge)
        };
        Match::record(&challenge, &outcome, "7-3", Utc::now() - Duration::days(1))
    }

    #[test]
    fn test_smackback_after_losing_smackdown_as_defender() {
        let f = Fixture::new(8);
        let lost = smackdown_match(&f, 2, 5, true);

        let verdict =
            f.evaluate_with(ChallengeType::SmackBack, f.at(5), f.at(1), &[], &[lost.clone()]);
        assert_eq!(verdict, Eligibility::Allowed);

        // Only rank 1 may be targeted
        let verdict = f.evaluate_with(ChallengeType::SmackBack, f.at(5), f.at(2), &[], &[lost]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::OutOfRange));
    }

    #[test]
    fn test_smackback_requires_immediately_preceding_loss() {
        let f = Fixture::new(8);

        let won = smackdown_match(&f, 2, 5, false);
        let verdict = f.evaluate_with(ChallengeType::SmackBack, f.at(5), f.at(1), &[], &[won]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::NotEligibleForSmackBack));

        let lost = smackdown_match(&f, 2, 5, true);
        let mut later = smackdown_match(&f, 5, 7, true);
        later.played_at = Utc::now();
        let verdict =
            f.evaluate_with(ChallengeType::SmackBack, f.at(5), f.at(1), &[], &[lost, later]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::NotEligibleForSmackBack));

        let verdict = f.evaluate_with(ChallengeType::SmackBack, f.at(5), f.at(1), &[], &[]);
        assert_eq!(verdict, Eligibility::Denied(DenialReason::NotEligibleForSmackBack));
    }

    #[test]
    fn test_fast_track_grant_rules() {
        let mut f = Fixture::new(10);
        assert_eq!(
            f.evaluate(ChallengeType::FastTrack, 10, 5),
            Eligibility::Denied(DenialReason::NoFastTrackGrant)
        );

        f.players[9].fast_track_grant = Some(FastTrackGrant::new(2, Utc::now() + Duration::days(20)));
        assert_eq!(f.evaluate(ChallengeType::FastTrack, 10, 4), Eligibility::Allowed);
        assert_eq!(
            f.evaluate(ChallengeType::FastTrack, 10, 3),
            Eligibility::Denied(DenialReason::OutOfRange)
        );

        f.players[9].fast_track_grant = Some(FastTrackGrant::new(0, Utc::now() + Duration::days(20)));
        assert_eq!(
            f.evaluate(ChallengeType::FastTrack, 10, 5),
            Eligibility::Denied(DenialReason::GrantExpired)
        );

        f.players[9].fast_track_grant = Some(FastTrackGrant::new(2, Utc::now() - Duration::days(1)));
        assert_eq!(
            f.evaluate(ChallengeType::FastTrack, 10, 5),
            Eligibility::Denied(DenialReason::GrantExpired)
        );
    }
}
