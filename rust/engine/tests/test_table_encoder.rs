use riverbot_engine::config::{EncoderConfig, TableConfig};
use riverbot_engine::encoder::{
    TableEncoder, CHECK_CALL, EQUITY_INDEX, FOLD, OPPONENT_FEATURES_INDEX, SPR_INDEX,
};
use riverbot_engine::equity::preflop_heuristic;
use riverbot_engine::errors::GameError;
use riverbot_engine::logger::HandRecord;
use riverbot_engine::player::PlayerAction;

fn config(seats: usize, seed: u64) -> EncoderConfig {
    EncoderConfig {
        table: TableConfig::with_seats(seats),
        seed: Some(seed),
        equity_samples: 50,
        ..EncoderConfig::default()
    }
}

fn call_down(enc: &mut TableEncoder) {
    let mut steps = 0;
    while enc.current_player().is_some() {
        let out = enc.step(CHECK_CALL, None).unwrap();
        steps += 1;
        assert!(steps < 200);
        if out.terminal {
            break;
        }
    }
}

#[test]
fn observation_has_fixed_length() {
    let mut enc = TableEncoder::new(config(6, 1)).unwrap();
    assert_eq!(enc.observation_len(), 89);
    let obs = enc.reset_hand().unwrap();
    assert_eq!(obs.len(), 89);
    while enc.current_player().is_some() {
        let out = enc.step(CHECK_CALL, None).unwrap();
        assert_eq!(out.observation.len(), 89);
    }

    let untracked = EncoderConfig {
        track_opponents: false,
        ..config(6, 1)
    };
    let mut enc = TableEncoder::new(untracked).unwrap();
    assert_eq!(enc.reset_hand().unwrap().len(), OPPONENT_FEATURES_INDEX);
    assert!(enc.tracker().is_none());
}

#[test]
fn observation_values_are_normalized() {
    let mut enc = TableEncoder::new(config(6, 2)).unwrap();
    let obs = enc.reset_hand().unwrap();
    // both hole cards present, board empty
    assert_eq!(obs[5], 1.0);
    assert_eq!(obs[11], 1.0);
    assert!(obs[12..EQUITY_INDEX].iter().all(|v| *v == 0.0));
    assert!((0.0..=1.0).contains(&obs[EQUITY_INDEX]));
    assert_eq!(obs[SPR_INDEX], 1.0, "1000 behind a 15 chip pot");
}

#[test]
fn step_before_reset_fails() {
    let mut enc = TableEncoder::new(config(3, 1)).unwrap();
    assert!(matches!(
        enc.step(CHECK_CALL, None),
        Err(GameError::NoHandInProgress)
    ));
}

#[test]
fn unknown_action_id_is_rejected() {
    let mut enc = TableEncoder::new(config(3, 1)).unwrap();
    enc.reset_hand().unwrap();
    assert!(matches!(
        enc.step(42, None),
        Err(GameError::InvalidAction { id: 42, size: 6 })
    ));
}

#[test]
fn fold_with_nothing_to_call_becomes_check() {
    let mut enc = TableEncoder::new(config(2, 3)).unwrap();
    enc.reset_hand().unwrap();
    assert_eq!(enc.validate_and_convert(FOLD).unwrap(), PlayerAction::Fold);
    enc.step(CHECK_CALL, None).unwrap();
    // big blind has the option
    assert_eq!(enc.current_player(), Some(1));
    assert_eq!(
        enc.validate_and_convert(FOLD).unwrap(),
        PlayerAction::CheckOrCall
    );
    assert_eq!(enc.get_action_description(FOLD), "Check");
}

#[test]
fn pot_fraction_bins_round_to_big_blinds() {
    let mut enc = TableEncoder::new(config(6, 4)).unwrap();
    enc.reset_hand().unwrap();
    // pot 15: 0.5x -> 10, 1x -> 20, 2x -> 30
    assert_eq!(enc.validate_and_convert(2).unwrap(), PlayerAction::Raise(10));
    assert_eq!(enc.validate_and_convert(3).unwrap(), PlayerAction::Raise(20));
    assert_eq!(enc.validate_and_convert(4).unwrap(), PlayerAction::Raise(30));
    assert_eq!(enc.validate_and_convert(5).unwrap(), PlayerAction::AllIn);
}

#[test]
fn explicit_raise_total_overrides_bin() {
    let mut enc = TableEncoder::new(config(6, 5)).unwrap();
    enc.reset_hand().unwrap();
    let out = enc.step(2, Some(60)).unwrap();
    assert_eq!(out.info.action, PlayerAction::Raise(50));
    assert_eq!(out.info.amount, 60);
    assert_eq!(enc.state().pot().current_bet(), 60);
}

#[test]
fn unaffordable_raise_becomes_all_in() {
    let mut enc = TableEncoder::new(config(6, 5)).unwrap();
    enc.reset_hand().unwrap();
    let action = enc.validate_and_convert(2).unwrap();
    assert_eq!(action, PlayerAction::Raise(10));
    let out = enc.step(2, Some(5_000)).unwrap();
    assert_eq!(out.info.action, PlayerAction::AllIn);
}

#[test]
fn valid_actions_depend_on_stack() {
    let mut enc = TableEncoder::new(config(6, 6)).unwrap();
    enc.reset_hand().unwrap();
    assert_eq!(enc.get_valid_actions(), vec![0, 1, 2, 3, 4, 5]);

    let short = EncoderConfig {
        table: TableConfig {
            starting_stack: 20,
            ..TableConfig::with_seats(6)
        },
        ..config(6, 6)
    };
    let mut enc = TableEncoder::new(short).unwrap();
    enc.reset_hand().unwrap();
    assert_eq!(enc.get_valid_actions(), vec![0, 1, 2, 5]);
}

#[test]
fn descriptions_name_amounts() {
    let mut enc = TableEncoder::new(config(6, 7)).unwrap();
    assert_eq!(enc.get_action_description(CHECK_CALL), "Check/Call");
    enc.reset_hand().unwrap();
    assert_eq!(enc.get_action_description(FOLD), "Fold");
    assert_eq!(enc.get_action_description(CHECK_CALL), "Call 10");
    assert_eq!(enc.get_action_description(2), "Raise 0.5x pot (10)");
    assert_eq!(enc.get_action_description(3), "Raise 1x pot (20)");
    assert_eq!(enc.get_action_description(5), "All-in (1000)");
    assert_eq!(enc.get_action_description(9), "Unknown action 9");
    assert_eq!(enc.valid_raise_range().unwrap(), (10, 990));
}

#[test]
fn hero_fold_reward_includes_shaping() {
    let mut enc = TableEncoder::new(config(2, 8)).unwrap();
    enc.reset_hand().unwrap();
    assert_eq!(enc.current_player(), Some(0));
    let cards = enc.state().player(0).unwrap().cards();
    let out = enc.step(FOLD, None).unwrap();
    assert!(out.terminal);
    let expected = -5.0 / 1000.0 + 0.1 * (0.5 - preflop_heuristic(&cards));
    assert!((out.info.reward - expected).abs() < 1e-6);
    let result = out.info.result.unwrap();
    assert_eq!(result.winners, vec![1]);
}

#[test]
fn hero_reward_is_relative_stack_change() {
    let cfg = EncoderConfig {
        hero: 1,
        ..config(2, 8)
    };
    let mut enc = TableEncoder::new(cfg).unwrap();
    enc.reset_hand().unwrap();
    let out = enc.step(FOLD, None).unwrap();
    assert!(out.terminal);
    assert!((out.info.reward - 0.005).abs() < 1e-6);
    assert!(matches!(
        enc.step(CHECK_CALL, None),
        Err(GameError::HandAlreadyComplete)
    ));
}

#[test]
fn same_seed_same_hands() {
    let run = |seed| {
        let mut enc = TableEncoder::new(config(4, seed)).unwrap();
        let mut observations = Vec::new();
        for _ in 0..3 {
            observations.push(enc.reset_hand().unwrap());
            call_down(&mut enc);
            observations.push(enc.observation());
        }
        observations
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn tracker_sees_every_hand() {
    let mut enc = TableEncoder::new(config(3, 9)).unwrap();
    for _ in 0..5 {
        enc.reset_hand().unwrap();
        call_down(&mut enc);
    }
    let tracker = enc.tracker().unwrap();
    assert_eq!(tracker.total_hands(), 5);
    assert_eq!(tracker.profile(2).unwrap().hands_played, 5);
    assert_eq!(enc.state().total_chips(), 3000);
}

#[test]
fn busted_seats_are_refilled() {
    let mut enc = TableEncoder::new(config(2, 10)).unwrap();
    for _ in 0..20 {
        enc.reset_hand().unwrap();
        while enc.current_player().is_some() {
            let all_in = enc.action_space().all_in_id().unwrap();
            if enc.step(all_in, None).unwrap().terminal {
                break;
            }
        }
        assert!(enc.last_result().is_some());
    }
    assert!(enc.state().hand_number() >= 20);
}

#[test]
fn resolved_hands_are_logged() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("riverbot_engine=debug"))
        .with_test_writer()
        .try_init();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("hands.jsonl");
    let mut enc = TableEncoder::new(config(3, 11)).unwrap();
    enc.log_hands_to(&path).unwrap();
    for _ in 0..3 {
        enc.reset_hand().unwrap();
        call_down(&mut enc);
    }
    drop(enc);

    let text = std::fs::read_to_string(&path).unwrap();
    let records: Vec<HandRecord> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.is_resolved() && r.ts.is_some()));
    assert_eq!(records[2].hand_number, 3);
}

#[test]
fn export_requires_tracking() {
    let cfg = EncoderConfig {
        track_opponents: false,
        ..config(3, 1)
    };
    let enc = TableEncoder::new(cfg).unwrap();
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        enc.export_stats(dir.path().join("s.json")),
        Err(GameError::InvalidConfig(_))
    ));
}
