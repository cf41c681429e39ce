use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use riverbot_engine::config::TableConfig;
use riverbot_engine::errors::GameError;
use riverbot_engine::game::GameState;
use riverbot_engine::hand::StandardEvaluator;
use riverbot_engine::player::PlayerAction;

fn play_all_in(gs: &mut GameState) {
    while !gs.is_hand_complete() {
        while gs.current_player().is_some() {
            gs.execute_action(PlayerAction::AllIn).unwrap();
        }
        if !gs.is_hand_complete() {
            gs.advance_betting_round().unwrap();
        }
    }
    gs.resolve_hand(&StandardEvaluator).unwrap();
}

#[test]
fn heads_up_all_in_until_someone_busts() {
    let mut gs = GameState::new(TableConfig::with_seats(2)).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let mut hands = 0;
    loop {
        match gs.start_hand(&mut rng) {
            Ok(()) => {}
            Err(GameError::NotEnoughPlayers { funded }) => {
                assert_eq!(funded, 1);
                break;
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
        play_all_in(&mut gs);
        assert_eq!(gs.total_chips(), 2000);
        hands += 1;
        assert!(hands < 500, "someone should bust eventually");
    }
    let stacks: Vec<u32> = gs.players().iter().map(|p| p.stack()).collect();
    assert!(stacks.contains(&0));
    assert!(stacks.contains(&2000));
}

#[test]
fn busted_player_is_skipped_and_top_up_brings_them_back() {
    let config = TableConfig::with_seats(3);
    let mut gs = GameState::new(config).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(4);

    let busted = loop {
        gs.start_hand(&mut rng).unwrap();
        play_all_in(&mut gs);
        if let Some(p) = gs.players().iter().find(|p| p.stack() == 0) {
            break p.id();
        }
    };
    if gs.players().iter().filter(|p| p.stack() > 0).count() < 2 {
        return;
    }

    gs.start_hand(&mut rng).unwrap();
    assert!(gs.player(busted).unwrap().cards().is_empty());
    assert!(!gs.hand_record().unwrap().players.contains(&busted));
    play_all_in(&mut gs);

    gs.top_up(busted, 1000).unwrap();
    assert_eq!(gs.player(busted).unwrap().winnings(), 0);
    if gs.start_hand(&mut rng).is_ok() {
        assert_eq!(gs.player(busted).unwrap().cards().len(), 2);
    }
}
