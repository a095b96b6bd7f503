//! First-round knockout schedule: power-of-two fast path, deterministic byes, optional oracle.

use crate::models::{team_id, MatchSeed, Phase, Team, TeamId};
use crate::oracle::{OracleError, ScheduleOracle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Strategy label of every schedule this crate produces itself.
pub const KNOCKOUT_STRATEGY: &str = "knockout";

/// Upper bound on an oracle call when the planner is built without an explicit timeout.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Rejected input, reported before any schedule is computed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ScheduleError {
    #[error("Team {0} is listed more than once")]
    DuplicateTeam(TeamId),
}

/// One scheduled match; `team_b` None is a bye. Both team keys must be present on the
/// wire, a bye carries an explicit `null`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMatch {
    pub round: u32,
    #[serde(deserialize_with = "team_id::deserialize")]
    pub team_a: TeamId,
    #[serde(deserialize_with = "team_id::deserialize_option")]
    pub team_b: Option<TeamId>,
}

impl ScheduledMatch {
    fn first_round(team_a: &TeamId, team_b: Option<&TeamId>) -> Self {
        Self {
            round: 1,
            team_a: team_a.clone(),
            team_b: team_b.cloned(),
        }
    }
}

/// The `{strategy, matches}` shape, as exchanged with the oracle.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub strategy: String,
    pub matches: Vec<ScheduledMatch>,
}

/// Which path produced a schedule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    PowerOfTwo,
    Oracle,
    Fallback,
}

/// A schedule plus the diagnostic trail of how it was obtained.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleOutcome {
    pub strategy: String,
    pub matches: Vec<ScheduledMatch>,
    pub source: ScheduleSource,
    pub debug: Vec<String>,
}

impl ScheduleOutcome {
    /// Match seeds ready for insertion. Byes carry their team as winner.
    pub fn to_seeds(&self) -> Vec<MatchSeed> {
        self.matches
            .iter()
            .map(|m| {
                let phase = Phase::Round(m.round);
                match &m.team_b {
                    Some(b) => MatchSeed::pending(phase, m.team_a.clone(), b.clone()),
                    None => MatchSeed::bye(phase, m.team_a.clone()),
                }
            })
            .collect()
    }
}

/// `n & (n - 1) == 0 && n != 0`
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// No id twice.
pub fn validate_teams(teams: &[Team]) -> Result<(), ScheduleError> {
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.id.as_str()) {
            return Err(ScheduleError::DuplicateTeam(team.id.clone()));
        }
    }
    Ok(())
}

/// Consecutive pairs in input order, all round 1. A lone team gets no match, so a single
/// team schedules nothing.
pub fn power_of_two_schedule(teams: &[Team]) -> Vec<ScheduledMatch> {
    teams
        .chunks_exact(2)
        .map(|pair| ScheduledMatch::first_round(&pair[0].id, Some(&pair[1].id)))
        .collect()
}

/// Byes for the first `next_power_of_two(n) - n` teams, then consecutive pairs.
pub fn fallback_schedule(teams: &[Team]) -> Vec<ScheduledMatch> {
    let byes = teams.len().next_power_of_two() - teams.len();
    let (bye_teams, playing) = teams.split_at(byes.min(teams.len()));
    bye_teams
        .iter()
        .map(|t| ScheduledMatch::first_round(&t.id, None))
        .chain(power_of_two_schedule(playing))
        .collect()
}

/// Check an oracle proposal against the team list and keep its first round.
///
/// Later rounds are dropped: they are generated from actual results. Round 1 must name
/// known teams only and cover every team exactly once.
pub fn accept_proposal(
    proposal: Schedule,
    teams: &[Team],
) -> Result<Vec<ScheduledMatch>, OracleError> {
    if proposal.strategy.trim().is_empty() {
        return Err(OracleError::Malformed("empty strategy".into()));
    }
    if let Some(m) = proposal.matches.iter().find(|m| m.round == 0) {
        return Err(OracleError::Malformed(format!(
            "round 0 in match {} vs {:?}",
            m.team_a, m.team_b
        )));
    }
    let known: HashSet<&str> = teams.iter().map(|t| t.id.as_str()).collect();
    let first_round: Vec<ScheduledMatch> = proposal
        .matches
        .into_iter()
        .filter(|m| m.round == 1)
        .collect();

    let mut placed = HashSet::new();
    for m in &first_round {
        if m.team_b.as_ref() == Some(&m.team_a) {
            return Err(OracleError::Malformed(format!(
                "team {} paired with itself",
                m.team_a
            )));
        }
        for team in std::iter::once(&m.team_a).chain(m.team_b.iter()) {
            if !known.contains(team.as_str()) {
                return Err(OracleError::Malformed(format!("unknown team {team}")));
            }
            if !placed.insert(team.as_str()) {
                return Err(OracleError::Malformed(format!(
                    "team {team} scheduled twice in round 1"
                )));
            }
        }
    }
    if placed.len() != known.len() {
        return Err(OracleError::Malformed(format!(
            "round 1 covers {} of {} teams",
            placed.len(),
            known.len()
        )));
    }
    Ok(first_round)
}

/// Builds first-round knockout schedules, consulting the oracle only when the team
/// count is not a power of two and an oracle is configured.
#[derive(Clone)]
pub struct SchedulePlanner {
    oracle: Option<Arc<dyn ScheduleOracle>>,
    timeout: Duration,
}

impl Default for SchedulePlanner {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl SchedulePlanner {
    /// Never makes outbound calls.
    pub fn deterministic() -> Self {
        Self {
            oracle: None,
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_oracle(oracle: Arc<dyn ScheduleOracle>, timeout: Duration) -> Self {
        Self {
            oracle: Some(oracle),
            timeout,
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Oracle failures never surface here: they end up in `debug` and the
    /// deterministic fallback is returned instead.
    pub async fn build_schedule(&self, teams: &[Team]) -> Result<ScheduleOutcome, ScheduleError> {
        validate_teams(teams)?;
        let mut trail = Vec::new();

        if teams.is_empty() {
            trail.push("No teams to schedule".to_string());
            return Ok(outcome(Vec::new(), ScheduleSource::Fallback, trail));
        }

        if is_power_of_two(teams.len()) {
            trail.push("Number of teams is power of two - no oracle needed".to_string());
            return Ok(outcome(
                power_of_two_schedule(teams),
                ScheduleSource::PowerOfTwo,
                trail,
            ));
        }

        if let Some(oracle) = &self.oracle {
            trail.push(format!("Consulting schedule oracle for {} teams", teams.len()));
            match self.consult(oracle.as_ref(), teams).await {
                Ok(schedule) => {
                    info!("Using oracle schedule for {} teams", teams.len());
                    trail.push("Oracle schedule accepted".to_string());
                    return Ok(ScheduleOutcome {
                        strategy: schedule.0,
                        matches: schedule.1,
                        source: ScheduleSource::Oracle,
                        debug: trail,
                    });
                }
                Err(e) => {
                    warn!("Schedule oracle failed, falling back to local byes: {e}");
                    trail.push(format!("Oracle failed: {e}"));
                }
            }
        }

        let byes = teams.len().next_power_of_two() - teams.len();
        debug!("Assigning {byes} byes for {} teams", teams.len());
        trail.push(format!("Generated schedule locally with {byes} byes"));
        Ok(outcome(
            fallback_schedule(teams),
            ScheduleSource::Fallback,
            trail,
        ))
    }

    async fn consult(
        &self,
        oracle: &dyn ScheduleOracle,
        teams: &[Team],
    ) -> Result<(String, Vec<ScheduledMatch>), OracleError> {
        let proposal = tokio::time::timeout(self.timeout, oracle.propose_schedule(teams))
            .await
            .map_err(|_| OracleError::Timeout(self.timeout))??;
        let strategy = proposal.strategy.clone();
        let matches = accept_proposal(proposal, teams)?;
        Ok((strategy, matches))
    }
}

fn outcome(
    matches: Vec<ScheduledMatch>,
    source: ScheduleSource,
    debug: Vec<String>,
) -> ScheduleOutcome {
    ScheduleOutcome {
        strategy: KNOCKOUT_STRATEGY.to_string(),
        matches,
        source,
        debug,
    }
}
