//! Ladder Engine - Rules for a skill-bracketed challenge ladder
//!
//! Players in each rating bracket hold a strict rank order and move by
//! challenging one another. This crate decides which challenges are legal,
//! tracks each challenge from issue to result, reorders the ladder after
//! matches and declines, moves players between brackets as their ratings
//! drift, and splits the period prize pool.
//!
//! # Components
//!
//! - **EligibilityEvaluator**: Range, immunity and grant checks per challenge type
//! - **ChallengeLifecycle**: Pending, Accepted, Declined, Expired, Completed
//! - **MatchResolver**: New rank order from a match result or a decline
//! - **BracketTransitionMonitor**: Grace periods, promotion and demotion offers
//! - **PrizePoolAllocator**: Climber bonus and placement payouts
//!
//! # Challenge Types
//!
//! - **Challenge**: Up to 4 ranks up; the winner takes the higher rank
//! - **SmackDown**: Up to 5 ranks down; a win lifts the challenger 2 and drops the defender 3
//! - **SmackBack**: The SmackDown victim may take on rank 1 directly
//! - **Fast Track**: Up to 6 ranks up, for players who accepted a demotion
//!
//! Every operation is a pure function over snapshots. Nothing here reads the
//! clock or touches storage: callers pass `now`, load the records, and write
//! back whatever the engine returns in one step per bracket.
//!
//! # Example
//!
//! ```ignore
//! use ladder_engine::{ChallengeLifecycle, EligibilityContext, LadderConfig};
//!
//! let lifecycle = ChallengeLifecycle::new(LadderConfig::default());
//! let context = EligibilityContext::new(&roster).with_pending(&pending);
//!
//! let challenge = lifecycle.issue(ChallengeType::Challenge, &challenger, &defender, &context, now)?;
//! let challenge = lifecycle.accept(&challenge, now)?;
//!
//! let outcome = MatchOutcome::challenger_won(&challenge);
//! let done = lifecycle.complete(&challenge, &roster, &challenger, &defender, &outcome, "6-3 6-4", now)?;
//! store.write_roster(done.roster.positions())?;
//! ```

pub mod config;
pub mod eligibility;
pub mod lifecycle;
pub mod prize;
pub mod resolver;
pub mod transition;

pub use config::{
    ConfigError, DeclineConfig, FastTrackConfig, LadderConfig, PaidPlacesRounding, PrizeConfig,
    RangeConfig,
};
pub use eligibility::{Eligibility, EligibilityContext, EligibilityEvaluator};
pub use lifecycle::{
    ChallengeLifecycle, CompletionOutcome, DeclineAllowance, DeclineOutcome, LifecycleError,
    LifecycleResult, FORFEIT_SCORE,
};
pub use prize::{
    most_improved, Award, Climber, FeeAccrual, Payout, PeriodFunding, PrizeDistribution,
    PrizePool, PrizePoolAllocator,
};
pub use resolver::MatchResolver;
pub use transition::{
    BracketDecision, BracketMove, BracketTransitionMonitor, DemotionChoice, DemotionResolution,
};

pub use ladder_types;
