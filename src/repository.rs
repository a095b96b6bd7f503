//! Persistence boundary for tournaments, teams and matches, and the in-memory store
//! used by the web binary.

use crate::logic::{validate_match, BracketError};
use crate::models::{
    GameMatch, MatchId, MatchSeed, Phase, Team, TeamId, Tournament, TournamentError,
    TournamentId, TournamentState,
};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RepositoryError {
    #[error("No tournament")]
    TournamentNotFound(TournamentId),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    /// Uniqueness of (tournament, phase): a round is inserted at most once.
    #[error("Matches for {0} already exist")]
    PhaseExists(Phase),
    #[error("Team {0} is not part of this tournament")]
    UnknownTeam(TeamId),
    /// Only scores and winner may change once a match exists.
    #[error("Match {0} can only have its result updated")]
    ImmutableMatch(MatchId),
    /// The next knockout round already exists, or the tournament is completed.
    #[error("Result of match {0} is locked")]
    ResultLocked(MatchId),
    #[error(transparent)]
    Integrity(#[from] BracketError),
    #[error("lock error")]
    Poisoned,
}

/// Row store for tournaments and their matches. Match lists come back in insertion order.
pub trait MatchRepository: Send + Sync {
    fn create_tournament(&self, tournament: Tournament) -> Result<Tournament, RepositoryError>;

    fn tournament(&self, id: TournamentId) -> Result<Tournament, RepositoryError>;

    fn list_tournaments(&self) -> Result<Vec<Tournament>, RepositoryError>;

    /// Apply `change` to the stored tournament atomically; nothing is written if it fails.
    fn modify_tournament(
        &self,
        id: TournamentId,
        change: &mut dyn FnMut(&mut Tournament) -> Result<(), TournamentError>,
    ) -> Result<Tournament, TournamentError>;

    fn list_teams(&self, id: TournamentId) -> Result<Vec<Team>, RepositoryError> {
        Ok(self.tournament(id)?.teams)
    }

    fn list_matches(&self, id: TournamentId) -> Result<Vec<GameMatch>, RepositoryError>;

    fn list_matches_in_phase(
        &self,
        id: TournamentId,
        phase: Phase,
    ) -> Result<Vec<GameMatch>, RepositoryError> {
        Ok(self
            .list_matches(id)?
            .into_iter()
            .filter(|m| m.phase == phase)
            .collect())
    }

    /// Insert seeds as new matches. Fails without inserting anything if any seed's phase
    /// already has matches, a seed is malformed, or it names a team outside the tournament.
    fn insert_matches(
        &self,
        id: TournamentId,
        seeds: Vec<MatchSeed>,
    ) -> Result<Vec<GameMatch>, RepositoryError>;

    /// Store a match's scores and winner. Refused with `ResultLocked` once the match's
    /// successor round exists or the tournament is completed, checked under the same lock
    /// as the write.
    fn update_match(&self, updated: GameMatch) -> Result<GameMatch, RepositoryError>;

    fn clear_matches(&self, id: TournamentId) -> Result<(), RepositoryError>;
}

/// Per-tournament entry: tournament data, its matches, and last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    matches: Vec<GameMatch>,
    next_sequence: u64,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID behind one lock.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<TournamentId, TournamentEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<TournamentId, TournamentEntry>>, RepositoryError> {
        self.entries.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<TournamentId, TournamentEntry>>, RepositoryError> {
        self.entries.write().map_err(|_| RepositoryError::Poisoned)
    }

    /// Run `f` on an entry, refreshing its last activity.
    fn with_entry<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut TournamentEntry) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut g = self.write()?;
        let entry = g
            .get_mut(&id)
            .ok_or(RepositoryError::TournamentNotFound(id))?;
        entry.last_activity = Instant::now();
        f(entry)
    }

    /// Remove tournaments not accessed for `timeout`. Returns how many were removed.
    pub fn purge_inactive(&self, timeout: Duration) -> Result<usize, RepositoryError> {
        let mut g = self.write()?;
        let before = g.len();
        g.retain(|_, entry| entry.last_activity.elapsed() < timeout);
        Ok(before - g.len())
    }

    pub fn len(&self) -> usize {
        self.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchRepository for InMemoryStore {
    fn create_tournament(&self, tournament: Tournament) -> Result<Tournament, RepositoryError> {
        let mut g = self.write()?;
        g.insert(
            tournament.id,
            TournamentEntry {
                tournament: tournament.clone(),
                matches: Vec::new(),
                next_sequence: 0,
                last_activity: Instant::now(),
            },
        );
        Ok(tournament)
    }

    fn tournament(&self, id: TournamentId) -> Result<Tournament, RepositoryError> {
        self.with_entry(id, |entry| Ok(entry.tournament.clone()))
    }

    fn list_tournaments(&self) -> Result<Vec<Tournament>, RepositoryError> {
        let g = self.read()?;
        let mut all: Vec<Tournament> = g.values().map(|e| e.tournament.clone()).collect();
        all.sort_by_key(|t| t.created_at);
        Ok(all)
    }

    fn modify_tournament(
        &self,
        id: TournamentId,
        change: &mut dyn FnMut(&mut Tournament) -> Result<(), TournamentError>,
    ) -> Result<Tournament, TournamentError> {
        let mut g = self.write()?;
        let entry = g
            .get_mut(&id)
            .ok_or(RepositoryError::TournamentNotFound(id))?;
        entry.last_activity = Instant::now();
        let mut draft = entry.tournament.clone();
        change(&mut draft)?;
        entry.tournament = draft.clone();
        Ok(draft)
    }

    fn list_matches(&self, id: TournamentId) -> Result<Vec<GameMatch>, RepositoryError> {
        self.with_entry(id, |entry| Ok(entry.matches.clone()))
    }

    fn insert_matches(
        &self,
        id: TournamentId,
        seeds: Vec<MatchSeed>,
    ) -> Result<Vec<GameMatch>, RepositoryError> {
        self.with_entry(id, |entry| {
            let existing: HashSet<Phase> = entry.matches.iter().map(|m| m.phase).collect();
            if let Some(seed) = seeds.iter().find(|s| existing.contains(&s.phase)) {
                return Err(RepositoryError::PhaseExists(seed.phase));
            }
            let mut inserted = Vec::with_capacity(seeds.len());
            for (offset, seed) in seeds.into_iter().enumerate() {
                let m = GameMatch::from_seed(id, entry.next_sequence + offset as u64, seed);
                validate_match(&m)?;
                if let Some(team) = m
                    .team_a
                    .iter()
                    .chain(m.team_b.iter())
                    .find(|t| entry.tournament.team(t).is_none())
                {
                    return Err(RepositoryError::UnknownTeam(team.clone()));
                }
                inserted.push(m);
            }
            entry.next_sequence += inserted.len() as u64;
            entry.matches.extend(inserted.iter().cloned());
            Ok(inserted)
        })
    }

    fn update_match(&self, updated: GameMatch) -> Result<GameMatch, RepositoryError> {
        validate_match(&updated)?;
        self.with_entry(updated.tournament_id, |entry| {
            if entry.tournament.state == TournamentState::Completed {
                return Err(RepositoryError::ResultLocked(updated.id));
            }
            if let Some(round) = updated.phase.round_number() {
                let next = Phase::Round(round + 1);
                if entry.matches.iter().any(|m| m.phase == next) {
                    return Err(RepositoryError::ResultLocked(updated.id));
                }
            }
            let stored = entry
                .matches
                .iter_mut()
                .find(|m| m.id == updated.id)
                .ok_or(RepositoryError::MatchNotFound(updated.id))?;
            let same_identity = stored.phase == updated.phase
                && stored.team_a == updated.team_a
                && stored.team_b == updated.team_b
                && stored.sequence == updated.sequence;
            if !same_identity {
                return Err(RepositoryError::ImmutableMatch(updated.id));
            }
            stored.score_a = updated.score_a;
            stored.score_b = updated.score_b;
            stored.winner = updated.winner;
            Ok(stored.clone())
        })
    }

    fn clear_matches(&self, id: TournamentId) -> Result<(), RepositoryError> {
        self.with_entry(id, |entry| {
            entry.matches.clear();
            Ok(())
        })
    }
}
