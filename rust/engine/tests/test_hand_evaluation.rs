use riverbot_engine::cards::parse_cards;
use riverbot_engine::errors::GameError;
use riverbot_engine::hand::{
    evaluate_cards, showdown_rank, Category, RankingOracle, StandardEvaluator, WORST_RANK,
};

fn rank(text: &str) -> u32 {
    StandardEvaluator
        .evaluate(&parse_cards(text).unwrap())
        .unwrap()
}

/// One seven-card hand per class, strongest first.
const LADDER: [(&str, u8, &str); 9] = [
    ("Th Jh Qh Kh Ah 2c 3d", 1, "Straight Flush"),
    ("Ac Ad Ah As Kc Qd 2h", 2, "Four of a Kind"),
    ("Kc Kd Kh Qc Qd 2h 3s", 3, "Full House"),
    ("2h 7h Jh Qh 9h Ac Kd", 4, "Flush"),
    ("5c 6h 7c 8h 9d 2s 3c", 5, "Straight"),
    ("Qc Qh Qd 2s 3c 4h 9d", 6, "Three of a Kind"),
    ("Jc Jd 4h 4s 9c 2d 3h", 7, "Two Pair"),
    ("Ac Ah 2s 3d 4c 9d 7h", 8, "Pair"),
    ("Ac Kh 9s 8d 7c 3d 2h", 9, "High Card"),
];

#[test]
fn every_class_is_named_and_ordered() {
    let oracle = StandardEvaluator;
    let mut previous = 0;
    for (text, class, name) in LADDER {
        let r = rank(text);
        assert!(r > previous, "{text} should rank below the hand before it");
        assert!(r < WORST_RANK);
        assert_eq!(oracle.rank_class(r), class, "{text}");
        assert_eq!(oracle.class_to_string(class), name);
        previous = r;
    }
    assert_eq!(oracle.class_to_string(0), "Unknown");
    assert_eq!(oracle.rank_class(WORST_RANK), 9);
}

#[test]
fn royal_flush_is_a_straight_flush() {
    let cards = parse_cards("Th Jh Qh Kh Ah 2c 3d").unwrap();
    assert_eq!(evaluate_cards(&cards).category, Category::StraightFlush);
}

#[test]
fn kickers_break_ties_within_a_class() {
    assert!(rank("Ac Kh 9s 8d 7c 3d 2h") < rank("Ac Qh 9s 8d 7c 3d 2h"));
    assert!(rank("Ac Ah Ks 3d 4c 9d 7h") < rank("Ac Ah Qs 3d 4c 9d 7h"));
    // wheel is the lowest straight
    assert!(rank("2c 3h 4c 5h 6d") < rank("Ac 2h 3c 4h 5d"));
    assert_eq!(StandardEvaluator.rank_class(rank("Ac 2h 3c 4h 5d")), 5);
}

#[test]
fn suits_alone_do_not_change_rank() {
    assert_eq!(rank("Ac Kh 9s 8d 7c"), rank("Ad Ks 9h 8c 7d"));
}

#[test]
fn best_five_of_seven_is_used() {
    // the board plays for both: identical ranks
    let board = "Th Jh Qh Kh Ah";
    assert_eq!(rank(&format!("{board} 2c 3d")), rank(&format!("{board} 4s 5s")));
    assert_eq!(rank("Th Jh Qh Kh Ah"), rank("Th Jh Qh Kh Ah 2c"));
}

#[test]
fn oracle_accepts_five_to_seven_cards_only() {
    let oracle = StandardEvaluator;
    let four = parse_cards("Ac Ad Ah As").unwrap();
    assert!(matches!(oracle.evaluate(&four), Err(GameError::Oracle(_))));
    let eight = parse_cards("Ac Ad Ah As Kc Kd Kh Ks").unwrap();
    assert!(matches!(oracle.evaluate(&eight), Err(GameError::Oracle(_))));
    let dup = parse_cards("Ac Ac Ah As Kd").unwrap();
    assert!(matches!(oracle.evaluate(&dup), Err(GameError::Oracle(_))));
}

#[test]
fn incomplete_board_gets_worst_rank() {
    let hole = parse_cards("Ac Ad").unwrap();
    let board = parse_cards("Ah As").unwrap();
    assert_eq!(showdown_rank(&StandardEvaluator, &hole, &board).unwrap(), WORST_RANK);
    let flop = parse_cards("Ah As 2c").unwrap();
    assert!(showdown_rank(&StandardEvaluator, &hole, &flop).unwrap() < WORST_RANK);
    assert_eq!(showdown_rank(&StandardEvaluator, &[], &flop).unwrap(), WORST_RANK);
}
