//! Engine configuration
//!
//! Every rule constant lives here with the league's standard value as its
//! default. Deployments override individual fields from JSON; missing fields
//! keep their defaults.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main ladder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// How far each challenge type may reach
    pub ranges: RangeConfig,
    /// Decline quota
    pub declines: DeclineConfig,
    /// Days a winner cannot be challenged
    pub immunity_days: i64,
    /// Days a rating may sit outside its bracket before action is taken
    pub grace_days: i64,
    /// Grant issued when a player accepts a demotion
    pub fast_track: FastTrackConfig,
    /// Days a pending challenge waits for a response
    pub pending_expiry_days: i64,
    /// Prize pool funding and split
    pub prizes: PrizeConfig,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            ranges: RangeConfig::default(),
            declines: DeclineConfig::default(),
            immunity_days: 7,
            grace_days: 14,
            fast_track: FastTrackConfig::default(),
            pending_expiry_days: 7,
            prizes: PrizeConfig::default(),
        }
    }
}

impl LadderConfig {
    /// Parse from JSON and validate
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rules cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("challenge", self.ranges.challenge),
            ("smackdown", self.ranges.smackdown),
            ("fast_track", self.ranges.fast_track),
        ];
        for (name, range) in ranges {
            if range == 0 {
                return Err(ConfigError::Invalid(format!("{} range must be at least 1", name)));
            }
        }

        let days = [
            ("declines.window_days", self.declines.window_days),
            ("immunity_days", self.immunity_days),
            ("grace_days", self.grace_days),
            ("fast_track.valid_days", self.fast_track.valid_days),
            ("pending_expiry_days", self.pending_expiry_days),
        ];
        for (name, value) in days {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{} must not be negative", name)));
            }
        }

        self.prizes.validate()
    }

    pub fn immunity(&self) -> Duration {
        Duration::days(self.immunity_days)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::days(self.grace_days)
    }

    pub fn pending_expiry(&self) -> Duration {
        Duration::days(self.pending_expiry_days)
    }
}

/// Maximum rank distance per challenge type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub challenge: u32,
    pub smackdown: u32,
    pub fast_track: u32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            challenge: 4,
            smackdown: 5,
            fast_track: 6,
        }
    }
}

/// Decline quota: `max_declines` per trailing `window_days`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclineConfig {
    pub max_declines: usize,
    pub window_days: i64,
}

impl Default for DeclineConfig {
    fn default() -> Self {
        Self {
            max_declines: 2,
            window_days: 30,
        }
    }
}

impl DeclineConfig {
    pub fn window(&self) -> Duration {
        Duration::days(self.window_days)
    }
}

/// Fast Track grant terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastTrackConfig {
    pub uses: u32,
    pub valid_days: i64,
}

impl Default for FastTrackConfig {
    fn default() -> Self {
        Self {
            uses: 2,
            valid_days: 28,
        }
    }
}

impl FastTrackConfig {
    pub fn validity(&self) -> Duration {
        Duration::days(self.valid_days)
    }
}

/// How the paid-places count is rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaidPlacesRounding {
    Ceil,
    Floor,
}

/// Prize pool funding rates, in dollars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrizeConfig {
    /// Climber bonus funding per active member
    pub climber_member_rate: Decimal,
    /// Climber bonus funding per match played by the climber
    pub climber_match_rate: Decimal,
    /// Placement pool funding per match played
    pub placement_match_rate: Decimal,
    /// League contribution per member collected at period reset
    pub league_contribution: Decimal,
    /// Flat fee charged per match
    pub match_fee: Decimal,
    /// Share of the field that is paid
    pub paid_fraction: Decimal,
    pub paid_places_rounding: PaidPlacesRounding,
}

impl Default for PrizeConfig {
    fn default() -> Self {
        Self {
            climber_member_rate: dec!(1.00),
            climber_match_rate: dec!(0.50),
            placement_match_rate: dec!(2.50),
            league_contribution: dec!(12.00),
            match_fee: dec!(5.00),
            paid_fraction: dec!(0.15),
            paid_places_rounding: PaidPlacesRounding::Ceil,
        }
    }
}

impl PrizeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("climber_member_rate", self.climber_member_rate),
            ("climber_match_rate", self.climber_match_rate),
            ("placement_match_rate", self.placement_match_rate),
            ("league_contribution", self.league_contribution),
            ("match_fee", self.match_fee),
        ];
        for (name, rate) in rates {
            if rate.is_sign_negative() {
                return Err(ConfigError::Invalid(format!("prizes.{} must not be negative", name)));
            }
        }

        if self.climber_match_rate + self.placement_match_rate > self.match_fee {
            return Err(ConfigError::Invalid(
                "per-match prize rates exceed the match fee".to_string(),
            ));
        }

        if self.paid_fraction <= Decimal::ZERO || self.paid_fraction > Decimal::ONE {
            return Err(ConfigError::Invalid(
                "prizes.paid_fraction must be in (0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}
