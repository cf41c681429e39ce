use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use riverbot_engine::cards::Card;
use riverbot_engine::deck::{unseen_cards, Deck};
use riverbot_engine::errors::GameError;

#[test]
fn fresh_deck_has_52_unique_cards() {
    let mut deck = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(42));
    let mut set = HashSet::new();
    for i in 0..52 {
        let c = deck.deal_card().expect("should have 52 cards");
        assert!(set.insert(c), "card {:?} duplicated at position {}", c, i);
    }
    assert!(
        deck.deal_card().is_none(),
        "after 52 cards, deck should be empty"
    );
    assert!(matches!(deck.deal(), Err(GameError::DeckExhausted)));
}

#[test]
fn shuffle_is_deterministic_with_same_seed() {
    let mut d1 = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(12345));
    let mut d2 = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(12345));
    let a: Vec<Card> = (0..10).map(|_| d1.deal_card().unwrap()).collect();
    let b: Vec<Card> = (0..10).map(|_| d2.deal_card().unwrap()).collect();
    assert_eq!(a, b, "same seed must yield identical order");
}

#[test]
fn shuffle_differs_with_different_seed() {
    let mut d1 = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(1));
    let mut d2 = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(2));
    let a: Vec<Card> = (0..10).map(|_| d1.deal_card().unwrap()).collect();
    let b: Vec<Card> = (0..10).map(|_| d2.deal_card().unwrap()).collect();
    assert_ne!(
        a, b,
        "different seeds should produce different orders (high probability)"
    );
}

#[test]
fn burn_and_deal_follow_holdem_procedure() {
    let mut deck = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(777));

    // preflop: deal 2 each
    let p1 = [deck.deal_card().unwrap(), deck.deal_card().unwrap()];
    let p2 = [deck.deal_card().unwrap(), deck.deal_card().unwrap()];
    assert_ne!(p1, p2);

    // flop
    deck.burn_card();
    let flop = [
        deck.deal_card().unwrap(),
        deck.deal_card().unwrap(),
        deck.deal_card().unwrap(),
    ];
    // turn
    deck.burn_card();
    let turn = deck.deal_card().unwrap();
    // river
    deck.burn_card();
    let river = deck.deal_card().unwrap();

    let mut set = HashSet::new();
    for c in [
        p1[0], p1[1], p2[0], p2[1], flop[0], flop[1], flop[2], turn, river,
    ] {
        assert!(set.insert(c));
    }
    // 52 - 4 hole - 5 board - 3 burns
    assert_eq!(deck.remaining(), 40);
}

#[test]
fn unseen_cards_excludes_known() {
    let known: Vec<Card> = vec!["Ah".parse().unwrap(), "Kd".parse().unwrap()];
    let rest = unseen_cards(&known);
    assert_eq!(rest.len(), 50);
    assert!(!rest.contains(&known[0]));
    assert!(!rest.contains(&known[1]));
}
