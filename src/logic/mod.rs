//! Tournament business logic: pairing, bracket progression, schedule planning, and the
//! setup/result/advance flow on top of a repository.

mod advance;
mod bracket;
mod pairing;
mod results;
mod schedule;
mod setup;

pub use advance::advance_round;
pub use bracket::{
    bye_counts, compute_next_round, is_round_advanceable, latest_round, record_result,
    round_matches, round_status, validate_match, Bracket, BracketError, Round, RoundAdvance,
    RoundStatus,
};
pub use pairing::{
    generate_balanced_round_robin, generate_knockout_matches, generate_knockout_matches_in_order,
    generate_round_robin,
};
pub use results::submit_result;
pub use schedule::{
    accept_proposal, fallback_schedule, is_power_of_two, power_of_two_schedule, validate_teams,
    Schedule, ScheduleError, ScheduleOutcome, SchedulePlanner, ScheduleSource, ScheduledMatch,
    DEFAULT_ORACLE_TIMEOUT, KNOCKOUT_STRATEGY,
};
pub use setup::{restart_tournament, start_tournament, StartReport, MIN_TEAMS};
