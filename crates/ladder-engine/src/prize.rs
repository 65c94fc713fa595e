//! Period prize pool
//!
//! Each bracket runs a prize pool per period, funded from league
//! contributions and match fees. At period end the pool is split into a
//! climber bonus for the most improved player and a placement pool paid down
//! the final standings.

use std::collections::HashMap;

use ladder_types::{LadderRoster, Match, PlayerId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PaidPlacesRounding, PrizeConfig};

/// Split for the first five places, in percent
const TOP_FIVE: [Decimal; 5] = [dec!(40), dec!(25), dec!(15), dec!(10), dec!(5)];

/// Period counts that drive funding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFunding {
    pub active_members: u32,
    pub matches_played: u32,
    /// Matches played by the period's climber
    pub climber_matches: u32,
}

/// Funded amounts for a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePool {
    pub total: Decimal,
    pub climber_bonus: Decimal,
    pub placement_pool: Decimal,
}

/// One paid place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub place: u32,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// Full period-end split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDistribution {
    pub pool: PrizePool,
    pub paid_places: u32,
    pub payouts: Vec<Payout>,
}

impl PrizeDistribution {
    pub fn total_paid(&self) -> Decimal {
        self.payouts.iter().map(|p| p.amount).sum()
    }
}

/// A payout matched to the player holding that place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub player_id: PlayerId,
    pub place: u32,
    pub amount: Decimal,
}

/// Largest net rank gain over a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Climber {
    pub player_id: PlayerId,
    pub start_rank: u32,
    pub end_rank: u32,
}

impl Climber {
    pub fn places_gained(&self) -> u32 {
        self.start_rank - self.end_rank
    }
}

/// Computes period-end payouts
#[derive(Debug, Clone, Default)]
pub struct PrizePoolAllocator {
    config: PrizeConfig,
}

impl PrizePoolAllocator {
    pub fn new(config: PrizeConfig) -> Self {
        Self { config }
    }

    /// Fund the pool and split off the climber bonus
    pub fn fund(&self, funding: &PeriodFunding) -> PrizePool {
        let members = Decimal::from(funding.active_members);
        let total = self.config.league_contribution * members
            + self.config.placement_match_rate * Decimal::from(funding.matches_played);
        let climber_bonus = self.config.climber_member_rate * members
            + self.config.climber_match_rate * Decimal::from(funding.climber_matches);

        PrizePool {
            total,
            climber_bonus,
            placement_pool: (total - climber_bonus).max(Decimal::ZERO),
        }
    }

    /// Number of paid places for a field. Never below one, never above the field.
    pub fn paid_places(&self, active_members: u32) -> u32 {
        if active_members == 0 {
            return 0;
        }
        let raw = self.config.paid_fraction * Decimal::from(active_members);
        let rounded = match self.config.paid_places_rounding {
            PaidPlacesRounding::Ceil => raw.ceil(),
            PaidPlacesRounding::Floor => raw.floor(),
        };
        rounded
            .to_u32()
            .unwrap_or(active_members)
            .clamp(1, active_members)
    }

    /// Percent of the placement pool for each of `places`, first place first
    pub fn payout_percentages(places: u32) -> Vec<Decimal> {
        match places {
            0 => Vec::new(),
            1 => vec![dec!(100)],
            2 => vec![dec!(60), dec!(40)],
            3 => vec![dec!(50), dec!(30), dec!(20)],
            4 => vec![dec!(50), dec!(30), dec!(15), dec!(5)],
            5 => TOP_FIVE.iter().map(|p| p + dec!(1)).collect(),
            n => {
                let remainder: Decimal = dec!(100) - TOP_FIVE.iter().sum::<Decimal>();
                let share = remainder / Decimal::from(n - 5);
                TOP_FIVE
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(share).take((n - 5) as usize))
                    .collect()
            }
        }
    }

    /// Fund and split the pool for a finished period
    pub fn distribute(&self, funding: &PeriodFunding) -> PrizeDistribution {
        let pool = self.fund(funding);
        let paid_places = self.paid_places(funding.active_members);
        let percentages = Self::payout_percentages(paid_places);

        let mut payouts: Vec<Payout> = percentages
            .into_iter()
            .zip(1..)
            .map(|(percentage, place)| Payout {
                place,
                percentage,
                amount: (pool.placement_pool * percentage / dec!(100)).round_dp(2),
            })
            .collect();

        let paid: Decimal = payouts.iter().map(|p| p.amount).sum();
        if let Some(first) = payouts.first_mut() {
            first.amount += pool.placement_pool - paid;
        }

        info!(
            "Prize pool {} (climber {}, placement {}) over {} places",
            pool.total, pool.climber_bonus, pool.placement_pool, paid_places
        );

        PrizeDistribution {
            pool,
            paid_places,
            payouts,
        }
    }

    /// Match payouts to the final standings. Places beyond the roster go unpaid.
    pub fn assign(distribution: &PrizeDistribution, standings: &LadderRoster) -> Vec<Award> {
        distribution
            .payouts
            .iter()
            .filter_map(|payout| {
                standings.player_at(payout.place).map(|player| Award {
                    player_id: player.clone(),
                    place: payout.place,
                    amount: payout.amount,
                })
            })
            .collect()
    }
}

/// Find the period's climber from opening and closing standings.
///
/// Only players ranked in both snapshots count. Ties go to the better final
/// rank. `None` when nobody gained a place.
pub fn most_improved(start: &LadderRoster, end: &LadderRoster) -> Option<Climber> {
    end.order()
        .iter()
        .filter_map(|player| {
            let start_rank = start.rank_of(player)?;
            let end_rank = end.rank_of(player)?;
            (end_rank < start_rank).then(|| Climber {
                player_id: player.clone(),
                start_rank,
                end_rank,
            })
        })
        .max_by(|a, b| {
            a.places_gained()
                .cmp(&b.places_gained())
                .then(b.end_rank.cmp(&a.end_rank))
        })
}

/// Running fee totals for one bracket's period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccrual {
    members: Vec<PlayerId>,
    matches_played: u32,
    matches_by_player: HashMap<PlayerId, u32>,
}

impl FeeAccrual {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member for the period. Returns false if already registered.
    pub fn record_member(&mut self, player: PlayerId) -> bool {
        if self.members.contains(&player) {
            return false;
        }
        self.members.push(player);
        true
    }

    pub fn record_match(&mut self, record: &Match) {
        self.matches_played += 1;
        for player in [&record.challenger_id, &record.defender_id] {
            *self.matches_by_player.entry(player.clone()).or_insert(0) += 1;
        }
    }

    pub fn active_members(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn matches_played(&self) -> u32 {
        self.matches_played
    }

    pub fn matches_for(&self, player: &PlayerId) -> u32 {
        self.matches_by_player.get(player).copied().unwrap_or(0)
    }

    /// Fees collected so far: contributions plus match fees
    pub fn collected(&self, config: &PrizeConfig) -> Decimal {
        config.league_contribution * Decimal::from(self.active_members())
            + config.match_fee * Decimal::from(self.matches_played)
    }

    /// Period counts, with `climber` supplying the climber match count
    pub fn funding(&self, climber: Option<&PlayerId>) -> PeriodFunding {
        PeriodFunding {
            active_members: self.active_members(),
            matches_played: self.matches_played,
            climber_matches: climber.map_or(0, |c| self.matches_for(c)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ladder_types::{BracketId, Challenge, ChallengeType, MatchOutcome};

    fn worked_example() -> PeriodFunding {
        PeriodFunding {
            active_members: 25,
            matches_played: 60,
            climber_matches: 60,
        }
    }

    fn floor_allocator() -> PrizePoolAllocator {
        PrizePoolAllocator::new(PrizeConfig {
            paid_places_rounding: PaidPlacesRounding::Floor,
            ..PrizeConfig::default()
        })
    }

    #[test]
    fn test_funding_worked_example() {
        let pool = PrizePoolAllocator::default().fund(&worked_example());
        assert_eq!(pool.total, dec!(450));
        assert_eq!(pool.climber_bonus, dec!(55));
        assert_eq!(pool.placement_pool, dec!(395));
    }

    #[test]
    fn test_worked_example_with_floor() {
        let distribution = floor_allocator().distribute(&worked_example());
        let amounts: Vec<Decimal> = distribution.payouts.iter().map(|p| p.amount).collect();

        assert_eq!(distribution.paid_places, 3);
        assert_eq!(amounts, vec![dec!(197.50), dec!(118.50), dec!(79.00)]);
        assert_eq!(distribution.total_paid(), dec!(395));
    }

    #[test]
    fn test_paid_places_rounding() {
        let ceil = PrizePoolAllocator::default();
        assert_eq!(ceil.paid_places(25), 4);
        assert_eq!(ceil.paid_places(20), 3);
        assert_eq!(ceil.paid_places(3), 1);
        assert_eq!(ceil.paid_places(0), 0);

        let floor = floor_allocator();
        assert_eq!(floor.paid_places(25), 3);
        assert_eq!(floor.paid_places(4), 1);
        assert_eq!(floor.paid_places(1), 1);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        for places in 1..=40 {
            let percentages = PrizePoolAllocator::payout_percentages(places);
            assert_eq!(percentages.len(), places as usize);
            let sum: Decimal = percentages.iter().sum();
            assert!((sum - dec!(100)).abs() <= dec!(0.01), "{} places sum {}", places, sum);
        }
    }

    #[test]
    fn test_five_places_spread_remainder() {
        assert_eq!(
            PrizePoolAllocator::payout_percentages(5),
            vec![dec!(41), dec!(26), dec!(16), dec!(11), dec!(6)]
        );
        let seven = PrizePoolAllocator::payout_percentages(7);
        assert_eq!(seven[5], dec!(2.5));
        assert_eq!(seven[6], dec!(2.5));
    }

    #[test]
    fn test_rounding_residue_goes_to_first() {
        let allocator = PrizePoolAllocator::default();
        // 40 members -> 6 places, 1% shares of an odd pool
        let distribution = allocator.distribute(&PeriodFunding {
            active_members: 40,
            matches_played: 7,
            climber_matches: 3,
        });
        assert_eq!(distribution.paid_places, 6);
        assert_eq!(distribution.total_paid(), distribution.pool.placement_pool);
        for payout in &distribution.payouts {
            assert_eq!(payout.amount, payout.amount.round_dp(2));
        }
    }

    #[test]
    fn test_empty_period() {
        let distribution = PrizePoolAllocator::default().distribute(&PeriodFunding::default());
        assert!(distribution.payouts.is_empty());
        assert_eq!(distribution.pool.total, Decimal::ZERO);
    }

    #[test]
    fn test_most_improved() {
        let bracket = BracketId::new();
        let players: Vec<PlayerId> = (0..6).map(|_| PlayerId::new()).collect();
        let start = LadderRoster::from_order(bracket.clone(), players.clone()).unwrap();

        // p5 climbs 3 (6 -> 3), p4 climbs 3 (5 -> 2): p4 wins on final rank
        let end = LadderRoster::from_order(
            bracket,
            vec![
                players[0].clone(),
                players[4].clone(),
                players[5].clone(),
                players[1].clone(),
                players[2].clone(),
                players[3].clone(),
            ],
        )
        .unwrap();

        let climber = most_improved(&start, &end).unwrap();
        assert_eq!(climber.player_id, players[4]);
        assert_eq!(climber.places_gained(), 3);
        assert!(most_improved(&start, &start).is_none());
    }

    #[test]
    fn test_assign_to_standings() {
        let bracket = BracketId::new();
        let players: Vec<PlayerId> = (0..2).map(|_| PlayerId::new()).collect();
        let standings = LadderRoster::from_order(bracket, players.clone()).unwrap();
        let distribution = floor_allocator().distribute(&worked_example());

        let awards = PrizePoolAllocator::assign(&distribution, &standings);
        assert_eq!(awards.len(), 2);
        assert_eq!(awards[0].player_id, players[0]);
        assert_eq!(awards[1].amount, dec!(118.50));
    }

    #[test]
    fn test_fee_accrual() {
        let bracket = BracketId::new();
        let a = PlayerId::new();
        let b = PlayerId::new();
        let mut accrual = FeeAccrual::new();
        assert!(accrual.record_member(a.clone()));
        assert!(accrual.record_member(b.clone()));
        assert!(!accrual.record_member(a.clone()));

        let challenge = Challenge::new(ChallengeType::Challenge, b.clone(), a.clone(), bracket, Utc::now());
        let outcome = MatchOutcome::challenger_won(&challenge);
        let record = Match::record(&challenge, &outcome, "6-4 6-4", Utc::now());
        accrual.record_match(&record);
        accrual.record_match(&record);

        let config = PrizeConfig::default();
        assert_eq!(accrual.collected(&config), dec!(34));
        assert_eq!(
            accrual.funding(Some(&b)),
            PeriodFunding {
                active_members: 2,
                matches_played: 2,
                climber_matches: 2
            }
        );
    }
}
