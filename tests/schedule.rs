//! Integration tests for the schedule planner: power-of-two fast path, local byes, oracle use
//! and fallback.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use team_tournament_web::logic::{accept_proposal, fallback_schedule};
use team_tournament_web::oracle::parse_completion;
use team_tournament_web::{
    ChatCompletionOracle, MatchSeed, OracleConfig, OracleError, Phase, Schedule, ScheduleError,
    ScheduleOracle, SchedulePlanner, ScheduleSource, ScheduledMatch, Team,
};

fn teams(names: &[&str]) -> Vec<Team> {
    names.iter().map(|n| Team::new(*n, format!("Team {n}"))).collect()
}

fn m(a: &str, b: Option<&str>) -> ScheduledMatch {
    ScheduledMatch {
        round: 1,
        team_a: a.into(),
        team_b: b.map(Into::into),
    }
}

enum Behaviour {
    Fail,
    Answer(Schedule),
    Hang,
}

struct FakeOracle {
    calls: AtomicUsize,
    behaviour: Behaviour,
}

impl FakeOracle {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behaviour,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleOracle for FakeOracle {
    async fn propose_schedule(&self, _teams: &[Team]) -> Result<Schedule, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Fail => Err(OracleError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            Behaviour::Answer(schedule) => Ok(schedule.clone()),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(OracleError::Parse("unreachable".into()))
            }
        }
    }
}

fn planner(oracle: &Arc<FakeOracle>) -> SchedulePlanner {
    SchedulePlanner::with_oracle(oracle.clone(), Duration::from_secs(5))
}

#[tokio::test]
async fn power_of_two_pairs_in_order_without_oracle_call() {
    let oracle = FakeOracle::new(Behaviour::Fail);
    let planner = planner(&oracle);
    let list = teams(&["A", "B", "C", "D"]);

    let first = planner.build_schedule(&list).await.unwrap();
    let second = planner.build_schedule(&list).await.unwrap();

    assert_eq!(first.matches, vec![m("A", Some("B")), m("C", Some("D"))]);
    assert_eq!(first.source, ScheduleSource::PowerOfTwo);
    assert_eq!(first.strategy, "knockout");
    assert_eq!(
        serde_json::to_string(&first.matches).unwrap(),
        serde_json::to_string(&second.matches).unwrap()
    );
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn five_teams_fall_back_to_three_byes_when_oracle_fails() {
    let oracle = FakeOracle::new(Behaviour::Fail);
    let outcome = planner(&oracle)
        .build_schedule(&teams(&["A", "B", "C", "D", "E"]))
        .await
        .unwrap();

    assert_eq!(
        outcome.matches,
        vec![m("A", None), m("B", None), m("C", None), m("D", Some("E"))]
    );
    assert_eq!(outcome.source, ScheduleSource::Fallback);
    assert_eq!(oracle.calls(), 1);
    assert!(outcome.debug.iter().any(|line| line.starts_with("Oracle failed")));
}

#[tokio::test]
async fn deterministic_planner_never_consults_anything() {
    let outcome = SchedulePlanner::deterministic()
        .build_schedule(&teams(&["A", "B", "C"]))
        .await
        .unwrap();
    assert_eq!(outcome.matches, vec![m("A", None), m("B", Some("C"))]);
    assert_eq!(outcome.source, ScheduleSource::Fallback);
}

#[tokio::test]
async fn well_formed_oracle_schedule_is_used() {
    let proposal = Schedule {
        strategy: "knockout".into(),
        matches: vec![
            m("A", Some("B")),
            m("C", Some("D")),
            m("E", Some("F")),
            ScheduledMatch {
                round: 2,
                team_a: "A".into(),
                team_b: Some("C".into()),
            },
        ],
    };
    let oracle = FakeOracle::new(Behaviour::Answer(proposal));
    let outcome = planner(&oracle)
        .build_schedule(&teams(&["A", "B", "C", "D", "E", "F"]))
        .await
        .unwrap();

    assert_eq!(outcome.source, ScheduleSource::Oracle);
    assert_eq!(
        outcome.matches,
        vec![m("A", Some("B")), m("C", Some("D")), m("E", Some("F"))]
    );
}

#[tokio::test]
async fn oracle_schedule_missing_a_team_is_rejected() {
    let proposal = Schedule {
        strategy: "knockout".into(),
        matches: vec![m("A", Some("B")), m("C", None)],
    };
    let oracle = FakeOracle::new(Behaviour::Answer(proposal));
    let list = teams(&["A", "B", "C", "D", "E"]);
    let outcome = planner(&oracle).build_schedule(&list).await.unwrap();

    assert_eq!(outcome.source, ScheduleSource::Fallback);
    assert_eq!(outcome.matches, fallback_schedule(&list));
}

#[tokio::test(start_paused = true)]
async fn hanging_oracle_times_out_into_fallback() {
    let oracle = FakeOracle::new(Behaviour::Hang);
    let outcome = planner(&oracle)
        .build_schedule(&teams(&["A", "B", "C"]))
        .await
        .unwrap();
    assert_eq!(outcome.source, ScheduleSource::Fallback);
    assert!(outcome.debug.iter().any(|line| line.contains("did not answer")));
}

#[tokio::test]
async fn oracle_error_status_ends_up_in_trail() {
    let oracle = FakeOracle::new(Behaviour::Fail);
    let outcome = planner(&oracle)
        .build_schedule(&teams(&["A", "B", "C", "D", "E"]))
        .await
        .unwrap();
    assert_eq!(outcome.source, ScheduleSource::Fallback);
    assert_eq!(outcome.matches.len(), 4);
    assert!(outcome
        .debug
        .iter()
        .any(|line| line.starts_with("Oracle failed") && line.contains("503")));
}

#[test]
fn chat_oracle_is_built_from_config() {
    let oracle = ChatCompletionOracle::new(OracleConfig {
        url: "http://oracle.invalid/v1/chat/completions".into(),
        api_key: "test".into(),
        model: "test".into(),
        timeout: Duration::from_secs(2),
    });
    assert!(oracle.is_ok());
}

#[tokio::test]
async fn single_team_takes_fast_path_with_no_matches() {
    let oracle = FakeOracle::new(Behaviour::Fail);
    let outcome = planner(&oracle)
        .build_schedule(&teams(&["A"]))
        .await
        .unwrap();
    assert_eq!(outcome.source, ScheduleSource::PowerOfTwo);
    assert_eq!(outcome.strategy, "knockout");
    assert!(outcome.matches.is_empty());
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn empty_team_list_schedules_nothing() {
    let oracle = FakeOracle::new(Behaviour::Fail);
    let outcome = planner(&oracle).build_schedule(&[]).await.unwrap();
    assert_eq!(outcome.strategy, "knockout");
    assert!(outcome.matches.is_empty());
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn duplicate_team_ids_are_rejected() {
    let planner = SchedulePlanner::deterministic();
    assert_eq!(
        planner.build_schedule(&teams(&["A", "B", "A"])).await.unwrap_err(),
        ScheduleError::DuplicateTeam("A".into())
    );
}

#[test]
fn fallback_byes_reach_next_power_of_two() {
    let list = teams(&["A", "B", "C", "D", "E", "F"]);
    assert_eq!(
        fallback_schedule(&list),
        vec![m("A", None), m("B", None), m("C", Some("D")), m("E", Some("F"))]
    );
}

#[test]
fn outcome_seeds_mark_byes_decided() {
    let list = teams(&["A", "B", "C"]);
    let outcome = tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(SchedulePlanner::deterministic().build_schedule(&list))
        .unwrap();
    assert_eq!(
        outcome.to_seeds(),
        vec![
            MatchSeed::bye(Phase::Round(1), "A".into()),
            MatchSeed::pending(Phase::Round(1), "B".into(), "C".into()),
        ]
    );
}

#[test]
fn proposal_with_self_pairing_or_unknown_team_is_malformed() {
    let list = teams(&["A", "B", "C"]);
    let self_paired = Schedule {
        strategy: "knockout".into(),
        matches: vec![m("A", Some("A")), m("B", Some("C"))],
    };
    assert!(matches!(
        accept_proposal(self_paired, &list),
        Err(OracleError::Malformed(_))
    ));
    let unknown = Schedule {
        strategy: "knockout".into(),
        matches: vec![m("A", Some("Z")), m("B", Some("C"))],
    };
    assert!(matches!(
        accept_proposal(unknown, &list),
        Err(OracleError::Malformed(_))
    ));
}

#[test]
fn completion_content_is_parsed_with_numeric_ids_and_code_fence() {
    let content = "```json\n{\"strategy\":\"knockout\",\"matches\":[{\"round\":1,\"teamA\":1,\"teamB\":null},{\"round\":1,\"teamA\":2,\"teamB\":3}]}\n```";
    let body = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string();
    let schedule = parse_completion(&body).unwrap();
    assert_eq!(schedule.strategy, "knockout");
    assert_eq!(schedule.matches, vec![m("1", None), m("2", Some("3"))]);
}

#[test]
fn completion_without_schedule_is_a_parse_error() {
    let no_choices = r#"{"choices": []}"#;
    assert!(matches!(parse_completion(no_choices), Err(OracleError::Parse(_))));

    let prose = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": "Sure! Here is a plan." } }]
    })
    .to_string();
    assert!(matches!(parse_completion(&prose), Err(OracleError::Parse(_))));

    assert!(matches!(parse_completion("<html>"), Err(OracleError::Parse(_))));

    let missing_team_b = serde_json::json!({
        "choices": [{ "message": {
            "role": "assistant",
            "content": "{\"strategy\":\"knockout\",\"matches\":[{\"round\":1,\"teamA\":1}]}"
        } }]
    })
    .to_string();
    assert!(matches!(
        parse_completion(&missing_team_b),
        Err(OracleError::Parse(_))
    ));

    let missing_strategy = serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": "{\"matches\": []}" } }]
    })
    .to_string();
    assert!(matches!(
        parse_completion(&missing_strategy),
        Err(OracleError::Parse(_))
    ));
}
