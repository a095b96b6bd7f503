//! Match (game), match seeds and phase tags.

use crate::models::team::TeamId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Phase string that is neither `round{n}` nor `Matchday {k}`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unrecognized phase tag: {0:?}")]
pub struct InvalidPhase(pub String);

/// Which round or matchday a match belongs to.
///
/// Serialized as the string tag (`"round2"`, `"Matchday 7"`). Only `Round` phases
/// are knockout rounds; matchdays are independent round-robin slots.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Phase {
    Round(u32),
    Matchday(u32),
}

impl Phase {
    /// Knockout round number, if this is a knockout phase.
    pub fn round_number(&self) -> Option<u32> {
        match self {
            Phase::Round(n) => Some(*n),
            Phase::Matchday(_) => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Round(n) => write!(f, "round{n}"),
            Phase::Matchday(k) => write!(f, "Matchday {k}"),
        }
    }
}

impl FromStr for Phase {
    type Err = InvalidPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_index = |digits: &str| digits.parse::<u32>().ok().filter(|n| *n >= 1);
        let parsed = if let Some(rest) = s.strip_prefix("round") {
            parse_index(rest).map(Phase::Round)
        } else if let Some(rest) = s.strip_prefix("Matchday ") {
            parse_index(rest).map(Phase::Matchday)
        } else {
            None
        };
        parsed.ok_or_else(|| InvalidPhase(s.to_string()))
    }
}

impl TryFrom<String> for Phase {
    type Error = InvalidPhase;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.to_string()
    }
}

/// A match to be persisted: what the pairing logic produces before the repository assigns ids.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSeed {
    pub phase: Phase,
    pub team_a: Option<TeamId>,
    /// None means BYE.
    pub team_b: Option<TeamId>,
    /// Pre-set only for byes (already decided).
    pub winner: Option<TeamId>,
}

impl MatchSeed {
    /// A real match awaiting a result.
    pub fn pending(phase: Phase, team_a: TeamId, team_b: TeamId) -> Self {
        Self {
            phase,
            team_a: Some(team_a),
            team_b: Some(team_b),
            winner: None,
        }
    }

    /// A bye: the team advances without playing.
    pub fn bye(phase: Phase, team: TeamId) -> Self {
        Self {
            phase,
            team_a: Some(team.clone()),
            team_b: None,
            winner: Some(team),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.team_a.is_some() != self.team_b.is_some()
    }
}

/// Where a match stands with respect to its result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// No result recorded yet.
    Pending,
    /// Scores recorded and equal: no winner.
    Draw,
    /// Scores recorded, winner set.
    Decided,
    /// Only one team; it advances.
    Bye,
}

/// A persisted match row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// Insertion order within the tournament.
    pub sequence: u64,
    pub phase: Phase,
    pub team_a: Option<TeamId>,
    pub team_b: Option<TeamId>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub winner: Option<TeamId>,
    pub created_at: DateTime<Utc>,
}

impl GameMatch {
    pub fn from_seed(tournament_id: TournamentId, sequence: u64, seed: MatchSeed) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            sequence,
            phase: seed.phase,
            team_a: seed.team_a,
            team_b: seed.team_b,
            score_a: None,
            score_b: None,
            winner: seed.winner,
            created_at: Utc::now(),
        }
    }

    /// Exactly one of the two slots is filled.
    pub fn is_bye(&self) -> bool {
        self.team_a.is_some() != self.team_b.is_some()
    }

    /// The sole team of a bye.
    pub fn bye_team(&self) -> Option<&TeamId> {
        match (&self.team_a, &self.team_b) {
            (Some(t), None) | (None, Some(t)) => Some(t),
            _ => None,
        }
    }

    /// Recorded winner, or the implicit winner of a bye.
    pub fn decided_winner(&self) -> Option<&TeamId> {
        self.winner.as_ref().or_else(|| self.bye_team())
    }

    pub fn has_scores(&self) -> bool {
        self.score_a.is_some() && self.score_b.is_some()
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team_a.as_deref() == Some(team) || self.team_b.as_deref() == Some(team)
    }

    pub fn status(&self) -> MatchStatus {
        if self.is_bye() {
            MatchStatus::Bye
        } else if self.winner.is_some() {
            MatchStatus::Decided
        } else if self.has_scores() {
            MatchStatus::Draw
        } else {
            MatchStatus::Pending
        }
    }
}
