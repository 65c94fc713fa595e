//! Match resolution
//!
//! [`MatchResolver`] maps a roster, a challenge and its result to the next
//! roster. It never edits ranks in place: each rule builds the complete new
//! order and the result is checked against the rank invariant before it is
//! returned.
//!
//! | Type       | Challenger wins                                   | Defender wins |
//! |------------|---------------------------------------------------|---------------|
//! | Challenge  | swap                                              | no change     |
//! | SmackDown  | challenger up 2 (never to 1), defender down 3     | swap          |
//! | SmackBack  | challenger to rank 1, ranks above shift down one  | no change     |
//! | FastTrack  | challenger takes defender's rank, rest shift down | no change     |

use ladder_types::{
    Challenge, ChallengeType, LadderError, LadderResult, LadderRoster, MatchOutcome, PlayerId,
};
use tracing::{error, info};

/// Ranks a SmackDown winner cannot climb above
const SMACKDOWN_CEILING: u32 = 2;
/// Places a SmackDown winner climbs
const SMACKDOWN_CLIMB: u32 = 2;
/// Places a SmackDown loser drops
const SMACKDOWN_DROP: u32 = 3;

/// Applies match results and declines to a bracket roster
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchResolver;

impl MatchResolver {
    /// Compute the roster after `challenge` was played with `outcome`
    pub fn resolve(
        roster: &LadderRoster,
        challenge: &Challenge,
        outcome: &MatchOutcome,
    ) -> LadderResult<LadderRoster> {
        let challenger_won = Self::validate_outcome(challenge, outcome)?;
        let (challenger, defender) = (&challenge.challenger_id, &challenge.defender_id);
        let (rc, rd) = Self::ranks(roster, challenge)?;

        let next = match (challenge.challenge_type, challenger_won) {
            (ChallengeType::Challenge, true) | (ChallengeType::SmackDown, false) => {
                place_pair(roster, (challenger, rd), (defender, rc))?
            }
            (ChallengeType::SmackDown, true) => {
                let target_challenger = if rc > SMACKDOWN_CEILING {
                    rc.saturating_sub(SMACKDOWN_CLIMB).max(SMACKDOWN_CEILING)
                } else {
                    rc
                };
                let target_defender = (rd + SMACKDOWN_DROP).min(roster.len() as u32);
                place_pair(
                    roster,
                    (challenger, target_challenger),
                    (defender, target_defender),
                )?
            }
            (ChallengeType::SmackBack, true) => move_to(roster, challenger, 1)?,
            (ChallengeType::FastTrack, true) => move_to(roster, challenger, rd)?,
            (ChallengeType::Challenge, false)
            | (ChallengeType::SmackBack, false)
            | (ChallengeType::FastTrack, false) => roster.clone(),
        };

        Self::finish(roster, next, challenge, "match")
    }

    /// Compute the roster after the defender declined `challenge`.
    ///
    /// The challenger moves one rank up and the defender one rank down, both
    /// clamped to the bracket. A SmackDown challenger is never lifted into
    /// rank 1. When both land on the same rank the challenger keeps it and the
    /// defender yields one more place. For an adjacent Challenge pair this is
    /// a plain swap and nobody else moves.
    pub fn apply_decline(roster: &LadderRoster, challenge: &Challenge) -> LadderResult<LadderRoster> {
        let (rc, rd) = Self::ranks(roster, challenge)?;
        let n = roster.len() as u32;

        let target_challenger = match challenge.challenge_type {
            ChallengeType::SmackDown if rc <= SMACKDOWN_CEILING => rc,
            _ => rc.saturating_sub(1).max(1),
        };
        let target_defender = (rd + 1).min(n);

        let next = place_pair(
            roster,
            (&challenge.challenger_id, target_challenger),
            (&challenge.defender_id, target_defender),
        )?;
        Self::finish(roster, next, challenge, "decline")
    }

    /// Whether the challenger won; errors unless the outcome names exactly the two players
    fn validate_outcome(challenge: &Challenge, outcome: &MatchOutcome) -> LadderResult<bool> {
        let challenger = &challenge.challenger_id;
        let defender = &challenge.defender_id;

        if challenger == defender || outcome.winner_id == outcome.loser_id {
            return Err(LadderError::OutcomeMismatch);
        }
        if outcome.winner_id == *challenger && outcome.loser_id == *defender {
            Ok(true)
        } else if outcome.winner_id == *defender && outcome.loser_id == *challenger {
            Ok(false)
        } else {
            Err(LadderError::OutcomeMismatch)
        }
    }

    fn ranks(roster: &LadderRoster, challenge: &Challenge) -> LadderResult<(u32, u32)> {
        if challenge.bracket_id != *roster.bracket_id() {
            return Err(LadderError::BracketMismatch {
                expected: roster.bracket_id().clone(),
                actual: challenge.bracket_id.clone(),
            });
        }
        Ok((
            roster.require_rank(&challenge.challenger_id)?,
            roster.require_rank(&challenge.defender_id)?,
        ))
    }

    /// Postcondition shared by every rule
    fn finish(
        before: &LadderRoster,
        after: LadderRoster,
        challenge: &Challenge,
        cause: &str,
    ) -> LadderResult<LadderRoster> {
        let checked = after.check_invariant().and_then(|_| {
            if after.len() == before.len() {
                Ok(())
            } else {
                Err(LadderError::RankInvariantViolation {
                    bracket: before.bracket_id().clone(),
                    detail: format!("roster size changed from {} to {}", before.len(), after.len()),
                })
            }
        });

        if let Err(err) = checked {
            error!("Rank invariant violated resolving {} {}: {}", cause, challenge.id, err);
            return Err(err);
        }

        for (player, from, to) in before.rank_changes(&after) {
            info!(
                "{} {} ({}): {} moved {} -> {}",
                challenge.challenge_type, challenge.id, cause, player, from, to
            );
        }
        Ok(after)
    }
}

/// Place two players at target ranks and let everyone else fill the
/// remaining ranks in their previous relative order.
///
/// `first` always gets its target. If `second` targets the same rank it
/// yields one rank further down, or up when already at the bottom.
fn place_pair(
    roster: &LadderRoster,
    first: (&PlayerId, u32),
    second: (&PlayerId, u32),
) -> LadderResult<LadderRoster> {
    let n = roster.len() as u32;
    let (first_player, first_rank) = first;
    let (second_player, mut second_rank) = second;
    if second_rank == first_rank {
        second_rank = if second_rank < n { second_rank + 1 } else { second_rank - 1 };
    }

    let mut others = roster
        .order()
        .iter()
        .filter(|p| *p != first_player && *p != second_player)
        .cloned();

    let mut order = Vec::with_capacity(roster.len());
    for rank in 1..=n {
        if rank == first_rank {
            order.push(first_player.clone());
        } else if rank == second_rank {
            order.push(second_player.clone());
        } else if let Some(player) = others.next() {
            order.push(player);
        }
    }
    roster.with_order(order)
}

/// Move one player to `rank`; players in between shift by one toward the gap
fn move_to(roster: &LadderRoster, player: &PlayerId, rank: u32) -> LadderResult<LadderRoster> {
    let mut order: Vec<PlayerId> = roster.order().iter().filter(|p| *p != player).cloned().collect();
    let index = (rank.max(1) as usize - 1).min(order.len());
    order.insert(index, player.clone());
    roster.with_order(order)
}
