//! Data structures for the tournament organizer: teams, matches, tournament state.

mod game;
mod team;
mod tournament;

pub use game::{GameMatch, InvalidPhase, MatchId, MatchSeed, MatchStatus, Phase};
pub use team::{team_id, Team, TeamId};
pub use tournament::{
    KnockoutSeeding, MatchdayLayout, Sport, Tournament, TournamentError, TournamentFormat,
    TournamentId, TournamentSettings, TournamentState,
};
