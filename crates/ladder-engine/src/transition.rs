//! Bracket transitions
//!
//! Ratings move independently of ladder results. When a rating leaves its
//! bracket the player first gets a grace period; only if the rating is still
//! out of bounds when grace runs out does anything happen:
//!
//! - **Above max**: automatic promotion to the bottom of the next bracket up
//! - **Below min**: the player is offered a move to the bottom of the next
//!   bracket down, with a Fast Track grant to climb back quickly, or may stay
//!
//! A rating that returns within bounds before grace runs out clears the grace
//! record without any move.

use chrono::{DateTime, Duration, Utc};
use ladder_types::{
    Bracket, BracketGraceStatus, BracketId, BracketTable, FastTrackGrant, GraceDirection,
    LadderError, LadderResult, LadderRoster, Player,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{FastTrackConfig, LadderConfig};

/// What should happen after a rating change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketDecision {
    /// Rating within bounds and no grace open
    WithinBounds,
    /// Rating just left the bracket; persist this grace record
    GraceStarted(BracketGraceStatus),
    /// Still out of bounds, grace not yet over
    GraceRunning { elapses_at: DateTime<Utc> },
    /// Rating is back within bounds; delete the grace record
    GraceCleared,
    /// Grace over above max: promote
    Promote { to: BracketId },
    /// Grace over below min: ask the player whether to move down
    DemotionOffered { to: BracketId },
}

/// Player's answer to a demotion offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemotionChoice {
    MoveDown,
    Stay,
}

/// A player moved between two brackets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMove {
    pub player: Player,
    /// Bracket left, with the gap closed
    pub source: LadderRoster,
    /// Bracket joined, player at the bottom
    pub destination: LadderRoster,
}

/// Outcome of a demotion offer. Either way the grace record is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemotionResolution {
    Moved(BracketMove),
    Stayed,
}

/// Watches ratings against bracket bounds
#[derive(Debug, Clone)]
pub struct BracketTransitionMonitor {
    grace_period: Duration,
    fast_track: FastTrackConfig,
}

impl Default for BracketTransitionMonitor {
    fn default() -> Self {
        Self::new(&LadderConfig::default())
    }
}

impl BracketTransitionMonitor {
    pub fn new(config: &LadderConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            fast_track: config.fast_track.clone(),
        }
    }

    /// Re-evaluate a player after a rating change.
    ///
    /// `grace` is the player's open grace record, if any.
    pub fn evaluate(
        &self,
        player: &Player,
        grace: Option<&BracketGraceStatus>,
        brackets: &BracketTable,
        now: DateTime<Utc>,
    ) -> LadderResult<BracketDecision> {
        let bracket = brackets.get(&player.bracket_id)?;
        let grace = grace.filter(|g| g.player_id == player.id);

        let crossing = if bracket.is_above_max(player.rating) {
            brackets
                .higher(&bracket.id)?
                .map(|b| (GraceDirection::AboveMax, b.id.clone()))
        } else if bracket.is_below_min(player.rating) {
            brackets
                .lower(&bracket.id)?
                .map(|b| (GraceDirection::BelowMin, b.id.clone()))
        } else {
            None
        };

        let decision = match (crossing, grace) {
            (None, None) => BracketDecision::WithinBounds,
            (None, Some(_)) => {
                info!("{} back within {}: grace cleared", player.id, bracket.name);
                BracketDecision::GraceCleared
            }
            (Some((direction, _)), open) if open.map_or(true, |g| g.direction != direction) => {
                info!(
                    "{} rated {} left {} ({:?}): grace started",
                    player.id, player.rating, bracket.name, direction
                );
                BracketDecision::GraceStarted(BracketGraceStatus::start(
                    player.id.clone(),
                    direction,
                    now,
                ))
            }
            (Some((direction, target)), Some(open)) => {
                if !open.has_elapsed(self.grace_period, now) {
                    BracketDecision::GraceRunning {
                        elapses_at: open.grace_started_at + self.grace_period,
                    }
                } else if direction == GraceDirection::AboveMax {
                    BracketDecision::Promote { to: target }
                } else {
                    BracketDecision::DemotionOffered { to: target }
                }
            }
            // Guard above covers every `(Some, None)` case
            (Some((direction, _)), None) => BracketDecision::GraceStarted(
                BracketGraceStatus::start(player.id.clone(), direction, now),
            ),
        };
        Ok(decision)
    }

    /// Move a player to the bottom of the next bracket up.
    ///
    /// Any Fast Track grant from an earlier demotion is revoked: it was
    /// issued for climbing the bracket the player is now leaving.
    pub fn promote(
        &self,
        player: &Player,
        source: &LadderRoster,
        destination: &LadderRoster,
        brackets: &BracketTable,
    ) -> LadderResult<BracketMove> {
        let target = brackets
            .higher(&player.bracket_id)?
            .ok_or_else(|| LadderError::UnknownBracket(destination.bracket_id().clone()))?;
        let moved = self.relocate(player, source, destination, target)?;

        let mut player = moved.player;
        player.fast_track_grant = None;
        info!("{} promoted to {}", player.id, target.name);

        Ok(BracketMove { player, ..moved })
    }

    /// Apply the player's answer to a demotion offer
    pub fn resolve_demotion(
        &self,
        choice: DemotionChoice,
        player: &Player,
        source: &LadderRoster,
        destination: &LadderRoster,
        brackets: &BracketTable,
        now: DateTime<Utc>,
    ) -> LadderResult<DemotionResolution> {
        if choice == DemotionChoice::Stay {
            info!("{} declined demotion and stays", player.id);
            return Ok(DemotionResolution::Stayed);
        }

        let target = brackets
            .lower(&player.bracket_id)?
            .ok_or_else(|| LadderError::UnknownBracket(destination.bracket_id().clone()))?;
        let moved = self.relocate(player, source, destination, target)?;

        let mut player = moved.player;
        player.fast_track_grant = Some(FastTrackGrant::new(
            self.fast_track.uses,
            now + self.fast_track.validity(),
        ));
        info!(
            "{} moved down to {} with {} Fast Track uses",
            player.id, target.name, self.fast_track.uses
        );

        Ok(DemotionResolution::Moved(BracketMove { player, ..moved }))
    }

    fn relocate(
        &self,
        player: &Player,
        source: &LadderRoster,
        destination: &LadderRoster,
        target: &Bracket,
    ) -> LadderResult<BracketMove> {
        if *source.bracket_id() != player.bracket_id {
            return Err(LadderError::BracketMismatch {
                expected: player.bracket_id.clone(),
                actual: source.bracket_id().clone(),
            });
        }
        if *destination.bracket_id() != target.id {
            return Err(LadderError::BracketMismatch {
                expected: target.id.clone(),
                actual: destination.bracket_id().clone(),
            });
        }

        let source = source.remove(&player.id)?;
        let destination = destination.push_bottom(player.id.clone())?;

        let mut player = player.clone();
        player.bracket_id = target.id.clone();

        Ok(BracketMove {
            player,
            source,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_types::PlayerId;

    struct Fixture {
        monitor: BracketTransitionMonitor,
        brackets: BracketTable,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            let brackets = BracketTable::new(vec![
                Bracket::new("499-under", None, Some(499)),
                Bracket::new("500-599", Some(500), Some(599)),
                Bracket::new("600-plus", Some(600), None),
            ])
            .unwrap();
            Self {
                monitor: BracketTransitionMonitor::default(),
                brackets,
                now: Utc::now(),
            }
        }

        fn bracket(&self, index: usize) -> BracketId {
            self.brackets.brackets()[index].id.clone()
        }

        fn player(&self, index: usize, rating: u32) -> Player {
            Player::new("Rae", rating, self.bracket(index))
        }

        fn roster_with(&self, index: usize, player: &Player, others: usize) -> LadderRoster {
            let mut order: Vec<PlayerId> = (0..others).map(|_| PlayerId::new()).collect();
            order.insert(0, player.id.clone());
            LadderRoster::from_order(self.bracket(index), order).unwrap()
        }

        fn roster(&self, index: usize, size: usize) -> LadderRoster {
            LadderRoster::from_order(self.bracket(index), (0..size).map(|_| PlayerId::new()).collect())
                .unwrap()
        }
    }

    #[test]
    fn test_within_bounds() {
        let f = Fixture::new();
        let p = f.player(1, 550);
        assert_eq!(
            f.monitor.evaluate(&p, None, &f.brackets, f.now).unwrap(),
            BracketDecision::WithinBounds
        );
    }

    #[test]
    fn test_grace_lifecycle_above_max() {
        let f = Fixture::new();
        let p = f.player(1, 612);

        let started = f.monitor.evaluate(&p, None, &f.brackets, f.now).unwrap();
        let grace = match started {
            BracketDecision::GraceStarted(grace) => grace,
            other => panic!("expected grace, got {:?}", other),
        };
        assert_eq!(grace.direction, GraceDirection::AboveMax);

        let running = f
            .monitor
            .evaluate(&p, Some(&grace), &f.brackets, f.now + Duration::days(13))
            .unwrap();
        assert_eq!(
            running,
            BracketDecision::GraceRunning {
                elapses_at: f.now + Duration::days(14)
            }
        );

        let due = f
            .monitor
            .evaluate(&p, Some(&grace), &f.brackets, f.now + Duration::days(14))
            .unwrap();
        assert_eq!(due, BracketDecision::Promote { to: f.bracket(2) });
    }

    #[test]
    fn test_recovery_clears_grace() {
        let f = Fixture::new();
        let mut p = f.player(1, 612);
        let grace = BracketGraceStatus::start(p.id.clone(), GraceDirection::AboveMax, f.now);

        p.rating = 590;
        let decision = f
            .monitor
            .evaluate(&p, Some(&grace), &f.brackets, f.now + Duration::days(20))
            .unwrap();
        assert_eq!(decision, BracketDecision::GraceCleared);
    }

    #[test]
    fn test_direction_flip_restarts_grace() {
        let f = Fixture::new();
        let p = f.player(1, 480);
        let stale = BracketGraceStatus::start(
            p.id.clone(),
            GraceDirection::AboveMax,
            f.now - Duration::days(30),
        );

        let decision = f.monitor.evaluate(&p, Some(&stale), &f.brackets, f.now).unwrap();
        assert_eq!(
            decision,
            BracketDecision::GraceStarted(BracketGraceStatus::start(
                p.id.clone(),
                GraceDirection::BelowMin,
                f.now
            ))
        );
    }

    #[test]
    fn test_edge_brackets_never_start_grace() {
        let f = Fixture::new();
        let top = f.player(2, 900);
        let bottom = f.player(0, 10);
        assert_eq!(
            f.monitor.evaluate(&top, None, &f.brackets, f.now).unwrap(),
            BracketDecision::WithinBounds
        );
        assert_eq!(
            f.monitor.evaluate(&bottom, None, &f.brackets, f.now).unwrap(),
            BracketDecision::WithinBounds
        );
    }

    #[test]
    fn test_below_min_offers_demotion() {
        let f = Fixture::new();
        let p = f.player(1, 470);
        let grace = BracketGraceStatus::start(p.id.clone(), GraceDirection::BelowMin, f.now);
        let decision = f
            .monitor
            .evaluate(&p, Some(&grace), &f.brackets, f.now + Duration::days(15))
            .unwrap();
        assert_eq!(decision, BracketDecision::DemotionOffered { to: f.bracket(0) });
    }

    #[test]
    fn test_promotion_appends_to_bottom_and_revokes_fast_track() {
        let f = Fixture::new();
        let mut p = f.player(1, 640);
        p.fast_track_grant = Some(FastTrackGrant::new(1, f.now + Duration::days(10)));

        let source = f.roster_with(1, &p, 4);
        let destination = f.roster(2, 6);
        let moved = f.monitor.promote(&p, &source, &destination, &f.brackets).unwrap();

        assert_eq!(moved.player.bracket_id, f.bracket(2));
        assert_eq!(moved.player.fast_track_grant, None);
        assert_eq!(moved.destination.rank_of(&p.id), Some(7));
        assert!(destination.rank_changes(&moved.destination).is_empty());
        assert_eq!(moved.source.len(), 4);
        assert!(!moved.source.contains(&p.id));
        assert_eq!(moved.source.order(), &source.order()[1..]);
    }

    #[test]
    fn test_promotion_rejects_wrong_destination() {
        let f = Fixture::new();
        let p = f.player(1, 640);
        let source = f.roster_with(1, &p, 2);
        let wrong = f.roster(0, 3);
        assert!(matches!(
            f.monitor.promote(&p, &source, &wrong, &f.brackets),
            Err(LadderError::BracketMismatch { .. })
        ));
    }

    #[test]
    fn test_demotion_move_down_grants_fast_track() {
        let f = Fixture::new();
        let p = f.player(1, 470);
        let source = f.roster_with(1, &p, 3);
        let destination = f.roster(0, 5);

        let resolution = f
            .monitor
            .resolve_demotion(DemotionChoice::MoveDown, &p, &source, &destination, &f.brackets, f.now)
            .unwrap();
        let moved = match resolution {
            DemotionResolution::Moved(moved) => moved,
            DemotionResolution::Stayed => panic!("expected a move"),
        };

        assert_eq!(moved.destination.rank_of(&p.id), Some(6));
        assert_eq!(
            moved.player.fast_track_grant,
            Some(FastTrackGrant::new(2, f.now + Duration::days(28)))
        );
    }

    #[test]
    fn test_demotion_stay() {
        let f = Fixture::new();
        let p = f.player(1, 470);
        let source = f.roster_with(1, &p, 3);
        let destination = f.roster(0, 5);

        let resolution = f
            .monitor
            .resolve_demotion(DemotionChoice::Stay, &p, &source, &destination, &f.brackets, f.now)
            .unwrap();
        assert_eq!(resolution, DemotionResolution::Stayed);
    }
}
