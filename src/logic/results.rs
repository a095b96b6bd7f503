//! Recording match results.

use crate::logic::bracket::record_result;
use crate::models::{GameMatch, MatchId, Phase, TournamentError, TournamentId, TournamentState};
use crate::repository::{MatchRepository, RepositoryError};
use log::info;

/// Record scores for one match and persist the derived winner.
///
/// A knockout result is locked once the following round exists, and every result is
/// locked once the tournament is completed.
pub fn submit_result(
    repo: &dyn MatchRepository,
    id: TournamentId,
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
) -> Result<GameMatch, TournamentError> {
    let tournament = repo.tournament(id)?;
    match tournament.state {
        TournamentState::Setup => return Err(TournamentError::InvalidState),
        TournamentState::Completed => return Err(TournamentError::MatchLocked(match_id)),
        TournamentState::Running => {}
    }

    let matches = repo.list_matches(id)?;
    let current = matches
        .iter()
        .find(|m| m.id == match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    if let Some(round) = current.phase.round_number() {
        let next = Phase::Round(round + 1);
        if matches.iter().any(|m| m.phase == next) {
            return Err(TournamentError::MatchLocked(match_id));
        }
    }

    // The store repeats the lock check atomically with the write.
    let updated = repo
        .update_match(record_result(current, score_a, score_b)?)
        .map_err(|e| match e {
            RepositoryError::ResultLocked(id) => TournamentError::MatchLocked(id),
            other => TournamentError::from(other),
        })?;
    info!(
        "Tournament {} {}: {} - {} (winner: {})",
        id,
        updated.phase,
        score_a,
        score_b,
        updated.winner.as_deref().unwrap_or("draw")
    );
    Ok(updated)
}
