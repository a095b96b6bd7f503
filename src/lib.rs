//! Two-player team tournament organizer: library with models, bracket logic, schedule
//! planning, persistence boundary and the REST API.

pub mod api;
pub mod config;
pub mod logic;
pub mod models;
pub mod oracle;
pub mod repository;

pub use logic::{
    advance_round, compute_next_round, generate_balanced_round_robin, generate_knockout_matches,
    generate_knockout_matches_in_order, generate_round_robin, is_round_advanceable,
    record_result, restart_tournament, round_status, start_tournament, submit_result, Bracket,
    BracketError, RoundAdvance, RoundStatus, Schedule, ScheduleError, ScheduleOutcome,
    SchedulePlanner, ScheduleSource, ScheduledMatch,
};
pub use models::{
    GameMatch, KnockoutSeeding, MatchId, MatchSeed, MatchStatus, MatchdayLayout, Phase, Sport,
    Team, TeamId, Tournament, TournamentError, TournamentFormat, TournamentId,
    TournamentSettings, TournamentState,
};
pub use oracle::{ChatCompletionOracle, OracleConfig, OracleError, ScheduleOracle};
pub use repository::{InMemoryStore, MatchRepository, RepositoryError};
