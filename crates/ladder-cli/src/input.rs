//! Input files and request records

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use ladder_engine::{DemotionChoice, LadderConfig, PeriodFunding};
use ladder_types::{
    BracketGraceStatus, BracketTable, Challenge, ChallengeType, LadderRoster, Match, MatchOutcome,
    Player,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Load the league configuration, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LadderConfig> {
    let Some(path) = path else {
        return Ok(LadderConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = LadderConfig::from_json_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Read and parse a request file
pub fn read_input<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed input {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Instant of the request, or the wall clock when omitted
pub fn instant(now: Option<DateTime<Utc>>) -> DateTime<Utc> {
    now.unwrap_or_else(Utc::now)
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub challenge_type: ChallengeType,
    pub challenger: Player,
    pub defender: Player,
    pub roster: LadderRoster,
    #[serde(default)]
    pub pending: Vec<Challenge>,
    #[serde(default)]
    pub history: Vec<Match>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub roster: LadderRoster,
    pub challenge: Challenge,
    pub outcome: MatchOutcome,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub roster: LadderRoster,
    pub challenge: Challenge,
    pub challenger: Player,
    pub defender: Player,
    pub outcome: MatchOutcome,
    #[serde(default)]
    pub score: String,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DeclineRequest {
    pub roster: LadderRoster,
    pub challenge: Challenge,
    pub defender: Player,
    pub now: Option<DateTime<Utc>>,
}

/// Bracket re-evaluation, optionally applying a due move.
///
/// With `source` and `destination` rosters a due promotion is applied; a due
/// demotion is applied only when `choice` is also given.
#[derive(Debug, Deserialize)]
pub struct BracketRequest {
    pub player: Player,
    pub grace: Option<BracketGraceStatus>,
    pub brackets: BracketTable,
    pub source: Option<LadderRoster>,
    pub destination: Option<LadderRoster>,
    pub choice: Option<DemotionChoice>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PrizesRequest {
    pub funding: PeriodFunding,
    /// Standings at period start, used to find the climber
    pub opening: Option<LadderRoster>,
    /// Final standings the payouts are assigned to
    pub closing: Option<LadderRoster>,
}
