//! Knockout bracket: result recording, round advancement with fair byes, completion detection.
//!
//! Everything here works on a snapshot of a tournament's matches supplied by the caller,
//! in persisted insertion order. Nothing is mutated; new rounds are returned for the
//! caller to persist.

use crate::logic::pairing::pair_for_round;
use crate::models::{GameMatch, MatchId, MatchSeed, Phase, TeamId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Bracket data that cannot be right. These are caller bugs and are never guessed around.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BracketError {
    #[error("match {0} has no teams")]
    MissingTeams(MatchId),
    #[error("winner {winner} of match {match_id} is not one of its teams")]
    WinnerNotInMatch { match_id: MatchId, winner: TeamId },
    #[error("team {team} appears more than once in round {round}")]
    TeamRepeatedInRound { team: TeamId, round: u32 },
    #[error("round {0} has no matches")]
    RoundNotFound(u32),
    #[error("a bye has no opponent to score against")]
    ScoreOnBye(MatchId),
}

/// Outcome of trying to move a knockout past its current round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundAdvance {
    /// Pairings for round `round`, to be persisted by the caller.
    NextRound { round: u32, pairings: Vec<MatchSeed> },
    /// Final decided.
    Complete { champion: TeamId },
    /// Some match of the current round has no winner yet (or there are no rounds).
    NotReady,
}

/// Reject a match missing both teams, or whose winner is not one of its teams.
pub fn validate_match(m: &GameMatch) -> Result<(), BracketError> {
    if m.team_a.is_none() && m.team_b.is_none() {
        return Err(BracketError::MissingTeams(m.id));
    }
    if let Some(winner) = &m.winner {
        if !m.involves(winner) {
            return Err(BracketError::WinnerNotInMatch {
                match_id: m.id,
                winner: winner.clone(),
            });
        }
    }
    Ok(())
}

/// Highest knockout round number present.
pub fn latest_round(matches: &[GameMatch]) -> Option<u32> {
    matches.iter().filter_map(|m| m.phase.round_number()).max()
}

/// Matches of one knockout round, in supplied order.
pub fn round_matches(matches: &[GameMatch], round: u32) -> Vec<&GameMatch> {
    matches
        .iter()
        .filter(|m| m.phase == Phase::Round(round))
        .collect()
}

/// How many byes each team has received so far, across every match given.
pub fn bye_counts(matches: &[GameMatch]) -> HashMap<&TeamId, u32> {
    let mut counts = HashMap::new();
    for team in matches.iter().filter_map(GameMatch::bye_team) {
        *counts.entry(team).or_insert(0) += 1;
    }
    counts
}

/// Index of the winner with the fewest byes so far; ties go to the earliest.
fn select_bye_recipient(winners: &[TeamId], counts: &HashMap<&TeamId, u32>) -> usize {
    let byes_of = |team: &TeamId| counts.get(team).copied().unwrap_or(0);
    let mut best = 0;
    for (i, team) in winners.iter().enumerate().skip(1) {
        if byes_of(team) < byes_of(&winners[best]) {
            best = i;
        }
    }
    best
}

fn ensure_distinct_teams(current: &[&GameMatch], round: u32) -> Result<(), BracketError> {
    let mut seen = HashSet::new();
    for team in current
        .iter()
        .flat_map(|m| m.team_a.iter().chain(m.team_b.iter()))
    {
        if !seen.insert(team) {
            return Err(BracketError::TeamRepeatedInRound {
                team: team.clone(),
                round,
            });
        }
    }
    Ok(())
}

/// Compute the round after `round` (defaults to the latest round present).
///
/// Winners advance in the order their matches were supplied. With an odd number of
/// winners, the one with the fewest byes so far (earliest on ties) gets a bye, emitted
/// first with its winner set; the rest are paired two at a time.
pub fn compute_next_round(
    matches: &[GameMatch],
    round: Option<u32>,
) -> Result<RoundAdvance, BracketError> {
    for m in matches {
        validate_match(m)?;
    }
    let Some(current) = round.or_else(|| latest_round(matches)) else {
        return Ok(RoundAdvance::NotReady);
    };
    let current_matches = round_matches(matches, current);
    if current_matches.is_empty() {
        return Err(BracketError::RoundNotFound(current));
    }
    ensure_distinct_teams(&current_matches, current)?;

    let mut winners: Vec<TeamId> = Vec::with_capacity(current_matches.len());
    for m in &current_matches {
        match m.decided_winner() {
            Some(w) => winners.push(w.clone()),
            None => return Ok(RoundAdvance::NotReady),
        }
    }

    if winners.len() == 1 {
        return Ok(RoundAdvance::Complete {
            champion: winners.remove(0),
        });
    }

    let next = current + 1;
    let phase = Phase::Round(next);
    let mut pairings = Vec::with_capacity(winners.len() / 2 + 1);
    if winners.len() % 2 == 1 {
        let counts = bye_counts(matches);
        let idx = select_bye_recipient(&winners, &counts);
        pairings.push(MatchSeed::bye(phase, winners.remove(idx)));
    }
    pairings.extend(pair_for_round(phase, &winners));

    Ok(RoundAdvance::NextRound {
        round: next,
        pairings,
    })
}

/// Whether the UI may offer "next round": the current round is fully decided, has more
/// than one match, and its successor does not exist yet.
pub fn is_round_advanceable(matches: &[GameMatch], round: Option<u32>) -> bool {
    let Some(current) = round.or_else(|| latest_round(matches)) else {
        return false;
    };
    if !round_matches(matches, current + 1).is_empty() {
        return false;
    }
    matches!(
        compute_next_round(matches, Some(current)),
        Ok(RoundAdvance::NextRound { .. })
    )
}

/// Attach scores and derive the winner; equal scores leave no winner.
pub fn record_result(m: &GameMatch, score_a: u32, score_b: u32) -> Result<GameMatch, BracketError> {
    let (Some(team_a), Some(team_b)) = (&m.team_a, &m.team_b) else {
        return Err(if m.is_bye() {
            BracketError::ScoreOnBye(m.id)
        } else {
            BracketError::MissingTeams(m.id)
        });
    };
    let winner = match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => Some(team_a.clone()),
        std::cmp::Ordering::Less => Some(team_b.clone()),
        std::cmp::Ordering::Equal => None,
    };
    Ok(GameMatch {
        score_a: Some(score_a),
        score_b: Some(score_b),
        winner,
        ..m.clone()
    })
}

/// One knockout round for display.
#[derive(Clone, Debug, Serialize)]
pub struct Round {
    pub number: u32,
    pub matches: Vec<GameMatch>,
}

/// Knockout rounds ordered by number. Matchday matches are left out.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Bracket {
    pub rounds: Vec<Round>,
}

impl Bracket {
    pub fn from_matches(matches: &[GameMatch]) -> Self {
        let mut by_round: BTreeMap<u32, Vec<GameMatch>> = BTreeMap::new();
        for m in matches {
            if let Some(n) = m.phase.round_number() {
                by_round.entry(n).or_default().push(m.clone());
            }
        }
        let rounds = by_round
            .into_iter()
            .map(|(number, matches)| Round { number, matches })
            .collect();
        Self { rounds }
    }

    /// Winner of the final, if played.
    pub fn champion(&self) -> Option<&TeamId> {
        match self.rounds.last() {
            Some(Round { matches, .. }) if matches.len() == 1 => matches[0].decided_winner(),
            _ => None,
        }
    }
}

/// Progress summary exposed to the UI.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RoundStatus {
    pub current_round: Option<u32>,
    /// Matches of the current round without a winner (pending or drawn).
    pub undecided_matches: usize,
    pub advanceable: bool,
    pub champion: Option<TeamId>,
}

pub fn round_status(matches: &[GameMatch]) -> RoundStatus {
    let current_round = latest_round(matches);
    let undecided_matches = current_round
        .map(|n| {
            round_matches(matches, n)
                .into_iter()
                .filter(|m| m.decided_winner().is_none())
                .count()
        })
        .unwrap_or(0);
    let champion = match compute_next_round(matches, current_round) {
        Ok(RoundAdvance::Complete { champion }) => Some(champion),
        _ => None,
    };
    RoundStatus {
        current_round,
        undecided_matches,
        advanceable: is_round_advanceable(matches, current_round),
        champion,
    }
}
