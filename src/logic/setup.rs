//! Setup phase: generate and persist the schedule (Setup -> Running), or restart back to Setup.

use crate::logic::pairing::{
    generate_balanced_round_robin, generate_knockout_matches, generate_round_robin,
};
use crate::logic::schedule::SchedulePlanner;
use crate::models::{
    GameMatch, KnockoutSeeding, MatchdayLayout, Tournament, TournamentError, TournamentFormat,
    TournamentId, TournamentState,
};
use crate::repository::MatchRepository;
use log::info;
use rand::Rng;

/// Minimum number of teams for any format.
pub const MIN_TEAMS: usize = 2;

/// What `start_tournament` produced.
#[derive(Clone, Debug)]
pub struct StartReport {
    pub tournament: Tournament,
    pub matches: Vec<GameMatch>,
    /// How the schedule was obtained (oracle attempts, fallbacks).
    pub debug: Vec<String>,
}

/// Start the tournament: build its first schedule according to its settings and persist it.
///
/// Round-robin creates every match up front. Knockout creates round 1 only; later rounds
/// come from [`crate::logic::advance_round`].
pub async fn start_tournament<R>(
    repo: &dyn MatchRepository,
    planner: &SchedulePlanner,
    id: TournamentId,
    rng: &mut R,
) -> Result<StartReport, TournamentError>
where
    R: Rng + ?Sized,
{
    let tournament = repo.tournament(id)?;
    if tournament.state != TournamentState::Setup {
        return Err(TournamentError::InvalidState);
    }
    if tournament.teams.len() < MIN_TEAMS {
        return Err(TournamentError::NotEnoughTeams {
            required: MIN_TEAMS,
        });
    }

    let team_ids = tournament.team_ids();
    let settings = tournament.settings;
    let (seeds, debug) = match (settings.format, settings.seeding) {
        (TournamentFormat::RoundRobin, _) => {
            let seeds = match settings.matchdays {
                MatchdayLayout::PerMatch => generate_round_robin(&team_ids),
                MatchdayLayout::Balanced => generate_balanced_round_robin(&team_ids),
            };
            (seeds, Vec::new())
        }
        (TournamentFormat::Knockout, KnockoutSeeding::Random) => {
            (generate_knockout_matches(&team_ids, rng), Vec::new())
        }
        (TournamentFormat::Knockout, KnockoutSeeding::Planned) => {
            let outcome = planner.build_schedule(&tournament.teams).await?;
            (outcome.to_seeds(), outcome.debug)
        }
    };

    let matches = repo.insert_matches(id, seeds)?;
    let tournament = repo.modify_tournament(id, &mut |t| {
        if t.state != TournamentState::Setup {
            return Err(TournamentError::InvalidState);
        }
        t.state = TournamentState::Running;
        Ok(())
    })?;
    info!(
        "Tournament {} started: {} teams, {} matches scheduled",
        id,
        tournament.teams.len(),
        matches.len()
    );
    Ok(StartReport {
        tournament,
        matches,
        debug,
    })
}

/// Restart tournament: back to Setup with the same teams. Clears all matches.
pub fn restart_tournament(
    repo: &dyn MatchRepository,
    id: TournamentId,
) -> Result<Tournament, TournamentError> {
    let tournament = repo.modify_tournament(id, &mut |t| {
        if t.state == TournamentState::Setup {
            return Err(TournamentError::InvalidState);
        }
        t.state = TournamentState::Setup;
        t.champion = None;
        Ok(())
    })?;
    repo.clear_matches(id)?;
    info!("Tournament {} restarted", id);
    Ok(tournament)
}
