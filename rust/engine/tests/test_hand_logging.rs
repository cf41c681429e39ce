use std::collections::BTreeMap;
use std::fs;

use riverbot_engine::cards::{Card, Rank as R, Suit as S};
use riverbot_engine::logger::{ActionRecord, HandLogger, HandRecord, Street};
use riverbot_engine::player::ActionKind;

fn record(ts: Option<String>) -> HandRecord {
    HandRecord {
        hand_id: "20250102-000001".to_string(),
        hand_number: 1,
        button: 0,
        small_blind: 5,
        big_blind: 10,
        players: vec![0, 1],
        positions: BTreeMap::from([(0, 0), (1, 1)]),
        starting_stacks: BTreeMap::from([(0, 1000), (1, 1000)]),
        actions: vec![ActionRecord {
            street: Street::Preflop,
            player_id: 0,
            kind: ActionKind::Check,
            amount: 0,
            pot_size: 15,
            stack_before: 995,
            stack_after: 995,
            position: 0,
        }],
        board: vec![Card {
            suit: S::Clubs,
            rank: R::Ace,
        }],
        winners: vec![],
        winnings: BTreeMap::new(),
        final_stacks: BTreeMap::new(),
        showdown: false,
        ts,
    }
}

#[test]
fn writes_jsonl_with_lf_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handlog.jsonl");
    let mut logger = HandLogger::create(&path).expect("create logger");
    logger.write(&record(None)).expect("write");
    logger.write(&record(None)).expect("write");
    assert_eq!(logger.written(), 2);
    let bytes = fs::read(&path).expect("read file");
    assert!(bytes.ends_with(b"\n"));
    assert!(!bytes.contains(&b'\r'));
    assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 2);
}

#[test]
fn creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/logs/hands.jsonl");
    let mut logger = HandLogger::create(&path).expect("create logger");
    logger.write(&record(None)).expect("write");
    assert!(path.exists());
}

#[test]
fn ts_is_generated_when_missing_and_preserved_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handlog_ts.jsonl");
    let mut logger = HandLogger::create(&path).expect("create logger");
    // missing ts -> logger should inject it
    logger.write(&record(None)).expect("write");
    let line = fs::read_to_string(&path).unwrap();
    let first: HandRecord = serde_json::from_str(line.lines().next().unwrap()).unwrap();
    assert!(first.ts.is_some(), "ts should be injected");

    // preset ts should be preserved
    let preset = "2030-01-01T00:00:00Z".to_string();
    logger.write(&record(Some(preset.clone()))).expect("write2");
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(&preset), "preset ts must be kept");
}
