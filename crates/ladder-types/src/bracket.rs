//! Skill brackets and grace tracking

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{BracketId, LadderError, LadderResult, PlayerId};

/// A rating-bounded pool of ranked players, e.g. "499-under"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub name: String,
    /// Lowest rating that belongs here; `None` for the bottom bracket
    pub min_rating: Option<u32>,
    /// Highest rating that belongs here; `None` for the top bracket
    pub max_rating: Option<u32>,
}

impl Bracket {
    pub fn new(name: impl Into<String>, min_rating: Option<u32>, max_rating: Option<u32>) -> Self {
        Self {
            id: BracketId::new(),
            name: name.into(),
            min_rating,
            max_rating,
        }
    }

    pub fn is_above_max(&self, rating: u32) -> bool {
        self.max_rating.map_or(false, |max| rating > max)
    }

    pub fn is_below_min(&self, rating: u32) -> bool {
        self.min_rating.map_or(false, |min| rating < min)
    }

    pub fn contains_rating(&self, rating: u32) -> bool {
        !self.is_above_max(rating) && !self.is_below_min(rating)
    }
}

/// Brackets ordered from lowest to highest rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bracket>", into = "Vec<Bracket>")]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    /// Validate that bounds tile the rating line without gaps or overlaps
    pub fn new(brackets: Vec<Bracket>) -> LadderResult<Self> {
        let (first, last) = match (brackets.first(), brackets.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(LadderError::InvalidBracketTable("no brackets".to_string())),
        };
        if first.min_rating.is_some() {
            return Err(LadderError::InvalidBracketTable(format!(
                "lowest bracket '{}' must have no minimum",
                first.name
            )));
        }
        if last.max_rating.is_some() {
            return Err(LadderError::InvalidBracketTable(format!(
                "highest bracket '{}' must have no maximum",
                last.name
            )));
        }

        for pair in brackets.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            match (lower.max_rating, upper.min_rating) {
                (Some(max), Some(min)) if max.checked_add(1) == Some(min) => {}
                _ => {
                    return Err(LadderError::InvalidBracketTable(format!(
                        "'{}' and '{}' do not meet",
                        lower.name, upper.name
                    )));
                }
            }
            if lower.id == upper.id {
                return Err(LadderError::InvalidBracketTable(format!(
                    "bracket {} listed twice",
                    lower.id
                )));
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    fn position(&self, id: &BracketId) -> LadderResult<usize> {
        self.brackets
            .iter()
            .position(|b| b.id == *id)
            .ok_or_else(|| LadderError::UnknownBracket(id.clone()))
    }

    pub fn get(&self, id: &BracketId) -> LadderResult<&Bracket> {
        Ok(&self.brackets[self.position(id)?])
    }

    /// Next bracket up, if any
    pub fn higher(&self, id: &BracketId) -> LadderResult<Option<&Bracket>> {
        Ok(self.brackets.get(self.position(id)? + 1))
    }

    /// Next bracket down, if any
    pub fn lower(&self, id: &BracketId) -> LadderResult<Option<&Bracket>> {
        let index = self.position(id)?;
        Ok(index.checked_sub(1).and_then(|i| self.brackets.get(i)))
    }

    /// Bracket whose bounds contain `rating`
    pub fn for_rating(&self, rating: u32) -> Option<&Bracket> {
        self.brackets.iter().find(|b| b.contains_rating(rating))
    }
}

impl TryFrom<Vec<Bracket>> for BracketTable {
    type Error = LadderError;

    fn try_from(brackets: Vec<Bracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketTable> for Vec<Bracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

/// Which bound a rating has crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraceDirection {
    AboveMax,
    BelowMin,
}

/// Open grace period for a player whose rating left their bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketGraceStatus {
    pub player_id: PlayerId,
    pub direction: GraceDirection,
    pub grace_started_at: DateTime<Utc>,
}

impl BracketGraceStatus {
    pub fn start(player_id: PlayerId, direction: GraceDirection, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            direction,
            grace_started_at: now,
        }
    }

    /// Whether a grace period of `length` has run out at `now`
    pub fn has_elapsed(&self, length: Duration, now: DateTime<Utc>) -> bool {
        now - self.grace_started_at >= length
    }
}
