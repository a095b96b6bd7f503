//! Integration tests for knockout progression: results, next round, byes, completion.

use team_tournament_web::logic::{bye_counts, round_status};
use team_tournament_web::{
    compute_next_round, is_round_advanceable, record_result, Bracket, BracketError, GameMatch,
    MatchSeed, MatchStatus, Phase, RoundAdvance,
};
use uuid::Uuid;

fn game(seq: u64, seed: MatchSeed) -> GameMatch {
    GameMatch::from_seed(Uuid::nil(), seq, seed)
}

fn pending(seq: u64, round: u32, a: &str, b: &str) -> GameMatch {
    game(seq, MatchSeed::pending(Phase::Round(round), a.into(), b.into()))
}

fn bye(seq: u64, round: u32, team: &str) -> GameMatch {
    game(seq, MatchSeed::bye(Phase::Round(round), team.into()))
}

/// Team A wins when `a_wins`, else team B.
fn won(seq: u64, round: u32, a: &str, b: &str, a_wins: bool) -> GameMatch {
    let m = pending(seq, round, a, b);
    let (sa, sb) = if a_wins { (10, 7) } else { (7, 10) };
    record_result(&m, sa, sb).unwrap()
}

#[test]
fn record_result_picks_winner_or_draw() {
    let m = pending(0, 1, "A", "B");

    let draw = record_result(&m, 3, 3).unwrap();
    assert_eq!(draw.winner, None);
    assert_eq!((draw.score_a, draw.score_b), (Some(3), Some(3)));
    assert_eq!(draw.status(), MatchStatus::Draw);

    assert_eq!(record_result(&m, 3, 2).unwrap().winner.as_deref(), Some("A"));
    assert_eq!(record_result(&m, 2, 3).unwrap().winner.as_deref(), Some("B"));
    assert_eq!(m.status(), MatchStatus::Pending);
}

#[test]
fn record_result_rejects_bye() {
    let m = bye(0, 1, "A");
    assert_eq!(record_result(&m, 1, 0), Err(BracketError::ScoreOnBye(m.id)));
}

#[test]
fn no_matches_is_not_ready() {
    assert_eq!(compute_next_round(&[], None), Ok(RoundAdvance::NotReady));
    assert!(!is_round_advanceable(&[], None));
}

#[test]
fn pending_or_drawn_match_blocks_next_round() {
    let matches = vec![won(0, 1, "A", "B", true), pending(1, 1, "C", "D")];
    assert_eq!(compute_next_round(&matches, None), Ok(RoundAdvance::NotReady));

    let drawn = record_result(&matches[1], 4, 4).unwrap();
    let matches = vec![matches[0].clone(), drawn];
    assert_eq!(compute_next_round(&matches, None), Ok(RoundAdvance::NotReady));
    assert!(!is_round_advanceable(&matches, None));
}

#[test]
fn decided_round_pairs_winners_in_match_order() {
    let matches = vec![
        won(0, 1, "A", "B", true),
        won(1, 1, "C", "D", false),
        won(2, 1, "E", "F", false),
        won(3, 1, "G", "H", true),
    ];
    let advance = compute_next_round(&matches, None).unwrap();
    assert_eq!(
        advance,
        RoundAdvance::NextRound {
            round: 2,
            pairings: vec![
                MatchSeed::pending(Phase::Round(2), "A".into(), "D".into()),
                MatchSeed::pending(Phase::Round(2), "F".into(), "G".into()),
            ],
        }
    );
    assert!(is_round_advanceable(&matches, None));
}

#[test]
fn odd_winners_bye_goes_to_fewest_byes_then_earliest() {
    // A already had a bye; B and D have none, B comes first.
    let matches = vec![
        bye(0, 1, "A"),
        won(1, 1, "B", "C", true),
        won(2, 1, "D", "E", true),
    ];
    let advance = compute_next_round(&matches, None).unwrap();
    assert_eq!(
        advance,
        RoundAdvance::NextRound {
            round: 2,
            pairings: vec![
                MatchSeed::bye(Phase::Round(2), "B".into()),
                MatchSeed::pending(Phase::Round(2), "A".into(), "D".into()),
            ],
        }
    );
}

#[test]
fn odd_winners_without_history_bye_goes_to_first() {
    let matches = vec![
        won(0, 1, "A", "B", false),
        won(1, 1, "C", "D", true),
        won(2, 1, "E", "F", true),
    ];
    match compute_next_round(&matches, None).unwrap() {
        RoundAdvance::NextRound { pairings, .. } => {
            assert_eq!(pairings[0], MatchSeed::bye(Phase::Round(2), "B".into()));
            assert_eq!(pairings.len(), 2);
        }
        other => panic!("expected next round, got {other:?}"),
    }
}

#[test]
fn bye_history_spans_all_rounds() {
    let matches = vec![
        bye(0, 1, "A"),
        won(1, 1, "B", "C", true),
        won(2, 1, "D", "E", true),
        bye(3, 2, "B"),
        won(4, 2, "A", "D", true),
    ];
    let counts = bye_counts(&matches);
    assert_eq!(counts.get(&"A".to_string()), Some(&1));
    assert_eq!(counts.get(&"B".to_string()), Some(&1));
    assert_eq!(counts.get(&"D".to_string()), None);
}

#[test]
fn single_decided_match_completes() {
    let matches = vec![
        won(0, 1, "A", "B", true),
        won(1, 1, "C", "D", true),
        won(2, 2, "A", "C", false),
    ];
    assert_eq!(
        compute_next_round(&matches, None),
        Ok(RoundAdvance::Complete {
            champion: "C".into()
        })
    );
    assert!(!is_round_advanceable(&matches, None));
    let status = round_status(&matches);
    assert_eq!(status.current_round, Some(2));
    assert_eq!(status.champion.as_deref(), Some("C"));
    assert_eq!(
        Bracket::from_matches(&matches).champion().map(String::as_str),
        Some("C")
    );
}

#[test]
fn final_not_played_is_not_complete() {
    let matches = vec![pending(0, 1, "A", "B")];
    assert_eq!(compute_next_round(&matches, None), Ok(RoundAdvance::NotReady));
    assert_eq!(round_status(&matches).undecided_matches, 1);
}

#[test]
fn repeated_calls_give_identical_pairings() {
    let matches = vec![
        bye(0, 1, "A"),
        won(1, 1, "B", "C", false),
        won(2, 1, "D", "E", true),
        won(3, 1, "F", "G", true),
    ];
    let first = compute_next_round(&matches, None).unwrap();
    let second = compute_next_round(&matches, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn existing_next_round_is_not_advanceable() {
    let matches = vec![
        won(0, 1, "A", "B", true),
        won(1, 1, "C", "D", true),
        pending(2, 2, "A", "C"),
    ];
    assert!(!is_round_advanceable(&matches, Some(1)));
    assert!(matches!(
        compute_next_round(&matches, Some(1)),
        Ok(RoundAdvance::NextRound { round: 2, .. })
    ));
}

#[test]
fn matchdays_are_not_knockout_rounds() {
    let mut m = game(0, MatchSeed::pending(Phase::Matchday(3), "A".into(), "B".into()));
    m = record_result(&m, 1, 0).unwrap();
    assert_eq!(compute_next_round(&[m], None), Ok(RoundAdvance::NotReady));
}

#[test]
fn winner_outside_match_is_rejected() {
    let mut m = pending(0, 1, "A", "B");
    m.winner = Some("Z".into());
    assert_eq!(
        compute_next_round(&[m.clone()], None),
        Err(BracketError::WinnerNotInMatch {
            match_id: m.id,
            winner: "Z".into()
        })
    );
}

#[test]
fn match_without_teams_is_rejected() {
    let mut m = pending(0, 1, "A", "B");
    m.team_a = None;
    m.team_b = None;
    assert_eq!(
        compute_next_round(&[m.clone()], None),
        Err(BracketError::MissingTeams(m.id))
    );
}

#[test]
fn team_twice_in_round_is_rejected() {
    let matches = vec![won(0, 1, "A", "B", true), won(1, 1, "A", "C", true)];
    assert_eq!(
        compute_next_round(&matches, None),
        Err(BracketError::TeamRepeatedInRound {
            team: "A".into(),
            round: 1
        })
    );
}

#[test]
fn unknown_explicit_round_is_rejected() {
    let matches = vec![won(0, 1, "A", "B", true)];
    assert_eq!(
        compute_next_round(&matches, Some(4)),
        Err(BracketError::RoundNotFound(4))
    );
}

#[test]
fn bracket_orders_rounds_numerically() {
    let matches = vec![
        won(0, 1, "A", "B", true),
        won(1, 1, "C", "D", true),
        won(2, 1, "E", "F", true),
        won(3, 1, "G", "H", true),
        won(4, 1, "I", "J", true),
        won(5, 1, "K", "L", true),
        won(6, 1, "M", "N", true),
        won(7, 1, "O", "P", true),
        won(8, 1, "Q", "R", true),
        won(9, 1, "S", "T", true),
        won(10, 1, "U", "V", true),
        pending(11, 10, "W", "X"),
        pending(12, 2, "A", "C"),
    ];
    let numbers: Vec<u32> = Bracket::from_matches(&matches)
        .rounds
        .iter()
        .map(|r| r.number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 10]);
}
