//! Pairing generation: round-robin and first knockout round. Pure functions, no side effects.

use crate::models::{MatchSeed, Phase, TeamId};
use rand::seq::SliceRandom;
use rand::Rng;

/// Every unordered pair (i, j), i < j in input order, once. The k-th match is tagged `Matchday k`.
pub fn generate_round_robin(team_ids: &[TeamId]) -> Vec<MatchSeed> {
    let n = team_ids.len();
    let mut matches = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let phase = Phase::Matchday(matches.len() as u32 + 1);
            matches.push(MatchSeed::pending(
                phase,
                team_ids[i].clone(),
                team_ids[j].clone(),
            ));
        }
    }
    matches
}

/// Round-robin grouped into matchdays where no team plays twice (circle method).
///
/// Even n gives n - 1 matchdays, odd n gives n with one team idle per matchday.
/// The idle slot is just skipped; it is not a bye match.
pub fn generate_balanced_round_robin(team_ids: &[TeamId]) -> Vec<MatchSeed> {
    if team_ids.len() < 2 {
        return Vec::new();
    }
    let mut slots: Vec<Option<&TeamId>> = team_ids.iter().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut matches = Vec::with_capacity(team_ids.len() * (team_ids.len() - 1) / 2);
    for day in 0..(n - 1) {
        let phase = Phase::Matchday(day as u32 + 1);
        for i in 0..(n / 2) {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                matches.push(MatchSeed::pending(phase, a.clone(), b.clone()));
            }
        }
        // slot 0 stays fixed, the rest turn one step
        slots[1..].rotate_right(1);
    }
    matches
}

/// First knockout round from a shuffled copy of `team_ids`.
///
/// The random source is injected so callers (and tests) decide how the order is drawn.
/// An odd count leaves one team with a bye, emitted last with its winner already set.
pub fn generate_knockout_matches<R>(team_ids: &[TeamId], rng: &mut R) -> Vec<MatchSeed>
where
    R: Rng + ?Sized,
{
    let mut shuffled = team_ids.to_vec();
    shuffled.shuffle(rng);
    pair_for_round(Phase::Round(1), &shuffled)
}

/// Same as [`generate_knockout_matches`] but keeps the input order (the last team gets the bye).
pub fn generate_knockout_matches_in_order(team_ids: &[TeamId]) -> Vec<MatchSeed> {
    pair_for_round(Phase::Round(1), team_ids)
}

/// Pair sequentially two at a time; a leftover team gets a bye.
pub(crate) fn pair_for_round(phase: Phase, team_ids: &[TeamId]) -> Vec<MatchSeed> {
    let mut matches: Vec<MatchSeed> = team_ids
        .chunks_exact(2)
        .map(|pair| MatchSeed::pending(phase, pair[0].clone(), pair[1].clone()))
        .collect();
    if let [leftover] = team_ids.chunks_exact(2).remainder() {
        matches.push(MatchSeed::bye(phase, leftover.clone()));
    }
    matches
}
