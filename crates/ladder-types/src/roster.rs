//! Per-bracket rank order
//!
//! A [`LadderRoster`] holds the rank-ordered player list of one bracket
//! together with a `PlayerId -> rank` index. Both are only ever rebuilt as a
//! whole: every mutation produces a new roster, and every constructor checks
//! that ranks form the contiguous permutation `1..=N`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{BracketId, LadderError, LadderResult, PlayerId};

/// One player's rank on one bracket, as exchanged with the roster store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LadderPosition {
    pub bracket_id: BracketId,
    /// 1-indexed, lower is better
    pub rank: u32,
    pub player_id: PlayerId,
}

/// Wire shape of a roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub bracket_id: BracketId,
    pub positions: Vec<LadderPosition>,
}

/// Ordered rank data for a single bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RosterSnapshot", into = "RosterSnapshot")]
pub struct LadderRoster {
    bracket_id: BracketId,
    /// `order[i]` holds rank `i + 1`
    order: Vec<PlayerId>,
    ranks: HashMap<PlayerId, u32>,
}

impl LadderRoster {
    /// Empty roster for a bracket
    pub fn empty(bracket_id: BracketId) -> Self {
        Self {
            bracket_id,
            order: Vec::new(),
            ranks: HashMap::new(),
        }
    }

    /// Build a roster from stored positions, validating the rank invariant
    pub fn from_positions<I>(bracket_id: BracketId, positions: I) -> LadderResult<Self>
    where
        I: IntoIterator<Item = LadderPosition>,
    {
        let positions: Vec<LadderPosition> = positions.into_iter().collect();
        let n = positions.len();
        let mut slots: Vec<Option<PlayerId>> = vec![None; n];

        for position in positions {
            if position.bracket_id != bracket_id {
                return Err(LadderError::BracketMismatch {
                    expected: bracket_id,
                    actual: position.bracket_id,
                });
            }
            let rank = position.rank as usize;
            if rank == 0 || rank > n {
                return Err(violation(
                    &bracket_id,
                    format!("rank {} outside 1..={}", rank, n),
                ));
            }
            let slot = &mut slots[rank - 1];
            if slot.is_some() {
                return Err(violation(&bracket_id, format!("rank {} held twice", rank)));
            }
            *slot = Some(position.player_id);
        }

        // n positions, n distinct in-range ranks: every slot is filled
        let order = slots.into_iter().flatten().collect();
        Self::from_order(bracket_id, order)
    }

    /// Build a roster from players listed best first
    pub fn from_order(bracket_id: BracketId, order: Vec<PlayerId>) -> LadderResult<Self> {
        let mut ranks = HashMap::with_capacity(order.len());
        for (index, player) in order.iter().enumerate() {
            if ranks.insert(player.clone(), index as u32 + 1).is_some() {
                return Err(violation(
                    &bracket_id,
                    format!("player {} ranked twice", player),
                ));
            }
        }

        let roster = Self {
            bracket_id,
            order,
            ranks,
        };
        roster.check_invariant()?;
        Ok(roster)
    }

    /// Same bracket, new order. Used for every rank mutation.
    pub fn with_order(&self, order: Vec<PlayerId>) -> LadderResult<Self> {
        Self::from_order(self.bracket_id.clone(), order)
    }

    /// Verify that the rank index and the order agree and form `1..=N`
    pub fn check_invariant(&self) -> LadderResult<()> {
        if self.order.len() != self.ranks.len() {
            return Err(violation(
                &self.bracket_id,
                format!(
                    "{} ordered players but {} indexed ranks",
                    self.order.len(),
                    self.ranks.len()
                ),
            ));
        }

        for (index, player) in self.order.iter().enumerate() {
            let expected = index as u32 + 1;
            match self.ranks.get(player) {
                Some(rank) if *rank == expected => {}
                Some(rank) => {
                    return Err(violation(
                        &self.bracket_id,
                        format!("player {} indexed at {} but ordered at {}", player, rank, expected),
                    ));
                }
                None => {
                    return Err(violation(
                        &self.bracket_id,
                        format!("player {} missing from rank index", player),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn bracket_id(&self) -> &BracketId {
        &self.bracket_id
    }

    /// Number of ranked players
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.ranks.contains_key(player)
    }

    /// Rank of a player, if ranked
    pub fn rank_of(&self, player: &PlayerId) -> Option<u32> {
        self.ranks.get(player).copied()
    }

    /// Rank of a player or a [`LadderError::PlayerNotRanked`]
    pub fn require_rank(&self, player: &PlayerId) -> LadderResult<u32> {
        self.rank_of(player).ok_or_else(|| LadderError::PlayerNotRanked {
            player: player.clone(),
            bracket: self.bracket_id.clone(),
        })
    }

    /// Player holding a rank
    pub fn player_at(&self, rank: u32) -> Option<&PlayerId> {
        if rank == 0 {
            return None;
        }
        self.order.get(rank as usize - 1)
    }

    /// Players best first
    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    /// Positions in rank order, ready for the roster store
    pub fn positions(&self) -> Vec<LadderPosition> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, player)| LadderPosition {
                bracket_id: self.bracket_id.clone(),
                rank: index as u32 + 1,
                player_id: player.clone(),
            })
            .collect()
    }

    /// Roster without `player`; everyone below moves up one rank
    pub fn remove(&self, player: &PlayerId) -> LadderResult<Self> {
        self.require_rank(player)?;
        let order = self.order.iter().filter(|p| *p != player).cloned().collect();
        self.with_order(order)
    }

    /// Roster with `player` appended at rank `N + 1`; nobody else moves
    pub fn push_bottom(&self, player: PlayerId) -> LadderResult<Self> {
        if self.contains(&player) {
            return Err(LadderError::AlreadyRanked {
                player,
                bracket: self.bracket_id.clone(),
            });
        }
        let mut order = self.order.clone();
        order.push(player);
        self.with_order(order)
    }

    /// Players whose rank differs between `self` and `other`, as `(player, before, after)`
    pub fn rank_changes(&self, other: &LadderRoster) -> Vec<(PlayerId, u32, u32)> {
        self.order
            .iter()
            .filter_map(|player| {
                let before = self.rank_of(player)?;
                let after = other.rank_of(player)?;
                (before != after).then(|| (player.clone(), before, after))
            })
            .collect()
    }
}

impl TryFrom<RosterSnapshot> for LadderRoster {
    type Error = LadderError;

    fn try_from(snapshot: RosterSnapshot) -> Result<Self, Self::Error> {
        Self::from_positions(snapshot.bracket_id, snapshot.positions)
    }
}

impl From<LadderRoster> for RosterSnapshot {
    fn from(roster: LadderRoster) -> Self {
        Self {
            positions: roster.positions(),
            bracket_id: roster.bracket_id,
        }
    }
}

fn violation(bracket: &BracketId, detail: String) -> LadderError {
    LadderError::RankInvariantViolation {
        bracket: bracket.clone(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| PlayerId::new()).collect()
    }

    fn position(bracket: &BracketId, rank: u32, player: &PlayerId) -> LadderPosition {
        LadderPosition {
            bracket_id: bracket.clone(),
            rank,
            player_id: player.clone(),
        }
    }

    #[test]
    fn test_from_positions_accepts_any_input_order() {
        let bracket = BracketId::new();
        let p = players(3);
        let roster = LadderRoster::from_positions(
            bracket.clone(),
            vec![
                position(&bracket, 3, &p[2]),
                position(&bracket, 1, &p[0]),
                position(&bracket, 2, &p[1]),
            ],
        )
        .unwrap();

        assert_eq!(roster.order(), p.as_slice());
        assert_eq!(roster.rank_of(&p[2]), Some(3));
        assert_eq!(roster.player_at(1), Some(&p[0]));
        assert_eq!(roster.player_at(0), None);
        assert_eq!(roster.player_at(4), None);
    }

    #[test]
    fn test_gap_is_rejected() {
        let bracket = BracketId::new();
        let p = players(2);
        let result = LadderRoster::from_positions(
            bracket.clone(),
            vec![position(&bracket, 1, &p[0]), position(&bracket, 3, &p[1])],
        );
        assert!(matches!(result, Err(LadderError::RankInvariantViolation { .. })));
    }

    #[test]
    fn test_duplicate_rank_is_rejected() {
        let bracket = BracketId::new();
        let p = players(2);
        let result = LadderRoster::from_positions(
            bracket.clone(),
            vec![position(&bracket, 1, &p[0]), position(&bracket, 1, &p[1])],
        );
        assert!(matches!(result, Err(LadderError::RankInvariantViolation { .. })));
    }

    #[test]
    fn test_duplicate_player_is_rejected() {
        let bracket = BracketId::new();
        let p = players(1);
        let result = LadderRoster::from_order(bracket, vec![p[0].clone(), p[0].clone()]);
        assert!(matches!(result, Err(LadderError::RankInvariantViolation { .. })));
    }

    #[test]
    fn test_foreign_bracket_position_is_rejected() {
        let bracket = BracketId::new();
        let other = BracketId::new();
        let p = players(1);
        let result = LadderRoster::from_positions(bracket, vec![position(&other, 1, &p[0])]);
        assert!(matches!(result, Err(LadderError::BracketMismatch { .. })));
    }

    #[test]
    fn test_remove_closes_gap() {
        let p = players(4);
        let roster = LadderRoster::from_order(BracketId::new(), p.clone()).unwrap();
        let removed = roster.remove(&p[1]).unwrap();

        assert_eq!(removed.len(), 3);
        assert_eq!(removed.rank_of(&p[0]), Some(1));
        assert_eq!(removed.rank_of(&p[2]), Some(2));
        assert_eq!(removed.rank_of(&p[3]), Some(3));
        assert!(!removed.contains(&p[1]));
    }

    #[test]
    fn test_push_bottom_keeps_existing_ranks() {
        let p = players(3);
        let roster = LadderRoster::from_order(BracketId::new(), p[..2].to_vec()).unwrap();
        let grown = roster.push_bottom(p[2].clone()).unwrap();

        assert_eq!(grown.rank_of(&p[2]), Some(3));
        assert!(roster.rank_changes(&grown).is_empty());
        assert!(matches!(
            grown.push_bottom(p[0].clone()),
            Err(LadderError::AlreadyRanked { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let p = players(3);
        let roster = LadderRoster::from_order(BracketId::new(), p).unwrap();
        let json = serde_json::to_string(&roster).unwrap();
        let back: LadderRoster = serde_json::from_str(&json).unwrap();
        assert_eq!(roster, back);

        let mut snapshot = RosterSnapshot::from(roster);
        snapshot.positions[0].rank = 7;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(serde_json::from_str::<LadderRoster>(&json).is_err());
    }
}
