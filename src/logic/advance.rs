//! Knockout progression: persist the next round at most once, or crown the champion.

use crate::logic::bracket::{compute_next_round, RoundAdvance};
use crate::models::{TournamentError, TournamentFormat, TournamentId, TournamentState};
use crate::repository::MatchRepository;
use log::info;

/// Advance a knockout tournament past its current round, working on a fresh snapshot.
///
/// `NotReady` changes nothing. A concurrent second insert of the same round is refused by
/// the repository (`PhaseExists`). Calling again after completion returns the champion.
pub fn advance_round(
    repo: &dyn MatchRepository,
    id: TournamentId,
) -> Result<RoundAdvance, TournamentError> {
    let tournament = repo.tournament(id)?;
    if tournament.settings.format != TournamentFormat::Knockout {
        return Err(TournamentError::InvalidState);
    }
    match (tournament.state, tournament.champion) {
        (TournamentState::Setup, _) => return Err(TournamentError::InvalidState),
        (TournamentState::Completed, Some(champion)) => {
            return Ok(RoundAdvance::Complete { champion })
        }
        _ => {}
    }

    let matches = repo.list_matches(id)?;
    let advance = compute_next_round(&matches, None)?;
    match &advance {
        RoundAdvance::NextRound { round, pairings } => {
            repo.insert_matches(id, pairings.clone())?;
            info!(
                "Tournament {} advanced to round {} ({} matches)",
                id,
                round,
                pairings.len()
            );
        }
        RoundAdvance::Complete { champion } => {
            let champion = champion.clone();
            repo.modify_tournament(id, &mut |t| {
                t.state = TournamentState::Completed;
                t.champion = Some(champion.clone());
                Ok(())
            })?;
            info!("Tournament {} completed, champion: {}", id, champion);
        }
        RoundAdvance::NotReady => {}
    }
    Ok(advance)
}
