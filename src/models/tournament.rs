//! Tournament, its settings, and TournamentError.

use crate::logic::{BracketError, ScheduleError};
use crate::models::game::MatchId;
use crate::models::team::{Team, TeamId};
use crate::repository::RepositoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament is not in a state that allows this action.
    #[error("Invalid state for this action")]
    InvalidState,
    #[error("Need at least {required} teams to start")]
    NotEnoughTeams { required: usize },
    #[error("Team not found")]
    TeamNotFound(TeamId),
    /// Team names are unique, case-insensitive.
    #[error("A team with this name already exists")]
    DuplicateTeamName,
    #[error("A team with this id already exists")]
    DuplicateTeamId(TeamId),
    #[error("Team name must not be empty")]
    InvalidTeamName,
    #[error("Tournament name must not be empty")]
    InvalidTournamentName,
    #[error("Match not found")]
    MatchNotFound(MatchId),
    /// The match's round is already closed (next round generated, or tournament completed).
    #[error("Match result can no longer be changed")]
    MatchLocked(MatchId),
    #[error(transparent)]
    Bracket(#[from] BracketError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    #[default]
    Babyfoot,
    Padel,
    PingPong,
    Other,
}

/// Competition format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Direct elimination.
    #[default]
    Knockout,
    /// Everyone plays everyone once ("Italian tournament").
    RoundRobin,
}

/// How the first knockout round is built.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockoutSeeding {
    /// Shuffle, pair two at a time, one bye for an odd count.
    #[default]
    Random,
    /// Input order; byes up to the next power of two, optionally proposed by the oracle.
    Planned,
}

/// How round-robin matches are grouped into matchdays.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchdayLayout {
    /// Every match is its own matchday.
    #[default]
    PerMatch,
    /// Circle method: no team plays twice in a matchday.
    Balanced,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    #[serde(default)]
    pub sport: Sport,
    #[serde(default)]
    pub format: TournamentFormat,
    #[serde(default)]
    pub seeding: KnockoutSeeding,
    #[serde(default)]
    pub matchdays: MatchdayLayout,
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Adding teams; no schedule yet.
    #[default]
    Setup,
    /// Schedule generated, results coming in.
    Running,
    /// Knockout champion decided.
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub settings: TournamentSettings,
    pub teams: Vec<Team>,
    pub state: TournamentState,
    pub champion: Option<TeamId>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament in Setup state with no teams.
    pub fn new(name: impl Into<String>, settings: TournamentSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            settings,
            teams: Vec::new(),
            state: TournamentState::Setup,
            champion: None,
            created_at: Utc::now(),
        }
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Team ids in entry order.
    pub fn team_ids(&self) -> Vec<TeamId> {
        self.teams.iter().map(|t| t.id.clone()).collect()
    }

    /// Add a team with a generated id (Setup only). Names must be unique (case-insensitive).
    pub fn add_team(&mut self, name: impl Into<String>) -> Result<&Team, TournamentError> {
        let name = name.into();
        self.insert_team(Team::new(Uuid::new_v4().to_string(), name))
    }

    /// Add a team whose id was assigned elsewhere (Setup only).
    pub fn insert_team(&mut self, team: Team) -> Result<&Team, TournamentError> {
        if self.state != TournamentState::Setup {
            return Err(TournamentError::InvalidState);
        }
        let name = team.name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidTeamName);
        }
        if self.teams.iter().any(|t| t.name.eq_ignore_ascii_case(name)) {
            return Err(TournamentError::DuplicateTeamName);
        }
        if self.team(&team.id).is_some() {
            return Err(TournamentError::DuplicateTeamId(team.id));
        }
        let team = Team::new(team.id, name);
        self.teams.push(team);
        Ok(&self.teams[self.teams.len() - 1])
    }

    /// Remove a team by id (Setup only).
    pub fn remove_team(&mut self, team_id: &str) -> Result<Team, TournamentError> {
        if self.state != TournamentState::Setup {
            return Err(TournamentError::InvalidState);
        }
        let idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| TournamentError::TeamNotFound(team_id.to_string()))?;
        Ok(self.teams.remove(idx))
    }

    /// Rename the tournament (any state).
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), TournamentError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TournamentError::InvalidTournamentName);
        }
        self.name = trimmed.to_string();
        Ok(())
    }

    /// Change settings (Setup only).
    pub fn set_settings(&mut self, settings: TournamentSettings) -> Result<(), TournamentError> {
        if self.state != TournamentState::Setup {
            return Err(TournamentError::InvalidState);
        }
        self.settings = settings;
        Ok(())
    }
}
