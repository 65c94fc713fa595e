//! Player profile fields the ladder reads and writes
//!
//! The profile store owns players; the engine only ever touches the fields
//! declared here and hands updated copies back.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{BracketId, PlayerId};

/// Limited-use wide-range challenge privilege
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastTrackGrant {
    /// Fast Track challenges still available
    pub uses_remaining: u32,
    /// Instant after which the grant can no longer be used
    pub expires_at: DateTime<Utc>,
}

impl FastTrackGrant {
    pub fn new(uses: u32, expires_at: DateTime<Utc>) -> Self {
        Self {
            uses_remaining: uses,
            expires_at,
        }
    }

    /// Whether the grant still has uses left at `now`
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.uses_remaining > 0 && now < self.expires_at
    }

    /// Grant with one use consumed
    pub fn consumed(&self) -> Self {
        Self {
            uses_remaining: self.uses_remaining.saturating_sub(1),
            expires_at: self.expires_at,
        }
    }
}

/// Ladder player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    /// Skill rating used for bracket placement
    pub rating: u32,
    pub bracket_id: BracketId,
    /// Instants at which the player used a decline
    #[serde(default)]
    pub decline_timestamps: Vec<DateTime<Utc>>,
    /// Player cannot be challenged before this instant
    #[serde(default)]
    pub immunity_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fast_track_grant: Option<FastTrackGrant>,
    /// Holds a current sanctioning membership
    #[serde(default)]
    pub sanctioned: bool,
}

impl Player {
    /// Create a player with a clean history
    pub fn new(display_name: impl Into<String>, rating: u32, bracket_id: BracketId) -> Self {
        Self {
            id: PlayerId::new(),
            display_name: display_name.into(),
            rating,
            bracket_id,
            decline_timestamps: Vec::new(),
            immunity_until: None,
            fast_track_grant: None,
            sanctioned: false,
        }
    }

    /// Whether the player is protected from challenges at `now`
    pub fn is_immune(&self, now: DateTime<Utc>) -> bool {
        self.immunity_until.map_or(false, |until| now < until)
    }

    /// Declines used inside the trailing `window` ending at `now`.
    ///
    /// Each decline ages out on its own, `window` after it was used.
    pub fn declines_within(&self, window: Duration, now: DateTime<Utc>) -> usize {
        self.decline_timestamps
            .iter()
            .filter(|used| **used <= now && now - **used < window)
            .count()
    }
}
