use std::cmp::Ordering;

use crate::cards::Card;
use crate::errors::GameError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    fn from_index(i: u32) -> Category {
        match i {
            8 => Category::StraightFlush,
            7 => Category::FourOfAKind,
            6 => Category::FullHouse,
            5 => Category::Flush,
            4 => Category::Straight,
            3 => Category::ThreeOfAKind,
            2 => Category::TwoPair,
            1 => Category::OnePair,
            _ => Category::HighCard,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HandStrength {
    pub category: Category,
    // kickers: ordered high -> low for tiebreaks
    pub kickers: [u8; 5],
}

const BASE: u32 = 15;
const CATEGORY_WEIGHT: u32 = BASE * BASE * BASE * BASE * BASE;

/// Rank given to hands that cannot be scored yet (fewer than three
/// community cards). Strictly worse than every real hand.
pub const WORST_RANK: u32 = 9 * CATEGORY_WEIGHT;

impl HandStrength {
    /// Dense ordering key, higher is stronger.
    pub fn score(&self) -> u32 {
        let mut s = self.category as u32 * CATEGORY_WEIGHT;
        let mut w = CATEGORY_WEIGHT / BASE;
        for k in self.kickers {
            s += k as u32 * w;
            w /= BASE;
        }
        s
    }

    /// Lower-is-better rank in `1..WORST_RANK`.
    pub fn rank(&self) -> u32 {
        WORST_RANK - self.score()
    }
}

/// Scores hands for showdown and equity estimation.
///
/// Ranks are lower-is-better. Classes run from 1 (straight flush) to
/// 9 (high card).
pub trait RankingOracle: Send + Sync {
    fn evaluate(&self, cards: &[Card]) -> Result<u32, GameError>;
    fn rank_class(&self, rank: u32) -> u8;
    fn class_to_string(&self, class: u8) -> &'static str;
}

/// Category-and-kicker evaluator over 5 to 7 cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEvaluator;

impl RankingOracle for StandardEvaluator {
    fn evaluate(&self, cards: &[Card]) -> Result<u32, GameError> {
        if !(5..=7).contains(&cards.len()) {
            return Err(GameError::Oracle(format!(
                "expected 5 to 7 cards, got {}",
                cards.len()
            )));
        }
        let mut seen = 0u64;
        for c in cards {
            let bit = 1u64 << c.index();
            if seen & bit != 0 {
                return Err(GameError::Oracle(format!("duplicate card {}", c)));
            }
            seen |= bit;
        }
        Ok(evaluate_cards(cards).rank())
    }

    fn rank_class(&self, rank: u32) -> u8 {
        let score = WORST_RANK.saturating_sub(rank);
        9 - Category::from_index(score / CATEGORY_WEIGHT) as u8
    }

    fn class_to_string(&self, class: u8) -> &'static str {
        match class {
            1 => "Straight Flush",
            2 => "Four of a Kind",
            3 => "Full House",
            4 => "Flush",
            5 => "Straight",
            6 => "Three of a Kind",
            7 => "Two Pair",
            8 => "Pair",
            9 => "High Card",
            _ => "Unknown",
        }
    }
}

/// Rank of a player's best hand, or [`WORST_RANK`] while the board has fewer
/// than three cards or the player holds no cards.
pub fn showdown_rank(
    oracle: &dyn RankingOracle,
    hole: &[Card],
    board: &[Card],
) -> Result<u32, GameError> {
    if board.len() < 3 || hole.len() < 2 {
        return Ok(WORST_RANK);
    }
    let mut cards = Vec::with_capacity(hole.len() + board.len());
    cards.extend_from_slice(hole);
    cards.extend_from_slice(board);
    oracle.evaluate(&cards)
}

pub fn evaluate_hand(cards: &[Card; 7]) -> HandStrength {
    evaluate_cards(cards)
}

/// Best five-card strength among `cards` (any count up to 7).
pub fn evaluate_cards(cards: &[Card]) -> HandStrength {
    let mut rank_counts = [0u8; 15]; // 2..14 used
    let mut suit_counts = [0u8; 4];
    let mut suit_masks = [0u16; 4];
    let mut rank_mask = 0u16;
    for c in cards {
        let r = c.rank.value();
        rank_counts[r as usize] += 1;
        let s = c.suit.index();
        suit_counts[s] += 1;
        suit_masks[s] |= 1 << r;
        rank_mask |= 1 << r;
    }

    let flush_suit = (0..4).find(|&s| suit_counts[s] >= 5);

    if let Some(s) = flush_suit {
        if let Some(high) = straight_high_from_mask(suit_masks[s]) {
            return HandStrength {
                category: Category::StraightFlush,
                kickers: [high, 0, 0, 0, 0],
            };
        }
    }

    if let Some((quad, kicker)) = detect_quads(&rank_counts) {
        return HandStrength {
            category: Category::FourOfAKind,
            kickers: [quad, kicker, 0, 0, 0],
        };
    }

    if let Some((trip, pair)) = detect_full_house(&rank_counts) {
        return HandStrength {
            category: Category::FullHouse,
            kickers: [trip, pair, 0, 0, 0],
        };
    }

    if let Some(s) = flush_suit {
        let mut k = [0u8; 5];
        let top = (2..=14u8).rev().filter(|r| suit_masks[s] & (1 << r) != 0);
        for (slot, r) in k.iter_mut().zip(top) {
            *slot = r;
        }
        return HandStrength {
            category: Category::Flush,
            kickers: k,
        };
    }

    if let Some(high) = straight_high_from_mask(rank_mask) {
        return HandStrength {
            category: Category::Straight,
            kickers: [high, 0, 0, 0, 0],
        };
    }

    // Multiples are returned high -> low.
    let (trips, pairs, singles) = classify_multiples(&rank_counts);
    if let Some(&t) = trips.first() {
        let mut k = [t, 0, 0, 0, 0];
        fill_kickers(&mut k[1..3], &singles);
        return HandStrength {
            category: Category::ThreeOfAKind,
            kickers: k,
        };
    }
    if pairs.len() >= 2 {
        let mut k = [pairs[0], pairs[1], 0, 0, 0];
        // a third pair can play as the kicker
        let mut rest: Vec<u8> = pairs[2..].iter().chain(singles.iter()).copied().collect();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        fill_kickers(&mut k[2..3], &rest);
        return HandStrength {
            category: Category::TwoPair,
            kickers: k,
        };
    }
    if let Some(&p) = pairs.first() {
        let mut k = [p, 0, 0, 0, 0];
        fill_kickers(&mut k[1..4], &singles);
        return HandStrength {
            category: Category::OnePair,
            kickers: k,
        };
    }

    let mut k = [0u8; 5];
    fill_kickers(&mut k, &singles);
    HandStrength {
        category: Category::HighCard,
        kickers: k,
    }
}

pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.kickers.cmp(&b.kickers),
        ord => ord,
    }
}

fn fill_kickers(slots: &mut [u8], ranks: &[u8]) {
    for (slot, r) in slots.iter_mut().zip(ranks) {
        *slot = *r;
    }
}

fn straight_high_from_mask(mask: u16) -> Option<u8> {
    // Treat Ace as 14 and optionally as 1
    let mut m = mask;
    if (m & (1 << 14)) != 0 {
        m |= 1 << 1;
    }
    // Sliding 5-bit window from Ace(14) down to 5
    for high in (5..=14u8).rev() {
        let window = 0b11111u16 << (high - 4);
        if (m & window) == window {
            return Some(high);
        }
    }
    None
}

fn detect_quads(rank_counts: &[u8; 15]) -> Option<(u8, u8)> {
    let quad = (2..=14u8).rev().find(|&r| rank_counts[r as usize] == 4)?;
    let kicker = (2..=14u8)
        .rev()
        .find(|&r| r != quad && rank_counts[r as usize] > 0)
        .unwrap_or(0);
    Some((quad, kicker))
}

fn detect_full_house(rank_counts: &[u8; 15]) -> Option<(u8, u8)> {
    let mut trips: Vec<u8> = vec![];
    let mut pairs: Vec<u8> = vec![];
    for r in (2..=14u8).rev() {
        match rank_counts[r as usize] {
            3 => trips.push(r),
            2 => pairs.push(r),
            _ => {}
        }
    }
    let &t = trips.first()?;
    if let Some(&p) = trips.get(1) {
        return Some((t, p));
    }
    pairs.first().map(|&p| (t, p))
}

fn classify_multiples(rank_counts: &[u8; 15]) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut trips = vec![];
    let mut pairs = vec![];
    let mut singles = vec![];
    for r in (2..=14u8).rev() {
        match rank_counts[r as usize] {
            3 => trips.push(r),
            2 => pairs.push(r),
            1 => singles.push(r),
            _ => {}
        }
    }
    (trips, pairs, singles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    #[test]
    fn wheel_is_five_high_straight() {
        let cards = parse_cards("Ah 2c 3d 4s 5h 9c Kd").unwrap();
        let hs = evaluate_cards(&cards);
        assert_eq!(hs.category, Category::Straight);
        assert_eq!(hs.kickers[0], 5);
    }

    #[test]
    fn third_pair_can_be_the_kicker() {
        let cards = parse_cards("Kh Kc 9d 9s 8h 8c 2d").unwrap();
        let hs = evaluate_cards(&cards);
        assert_eq!(hs.category, Category::TwoPair);
        assert_eq!(hs.kickers, [13, 9, 8, 0, 0]);
    }

    #[test]
    fn worst_rank_is_worse_than_any_real_hand() {
        let cards = parse_cards("7c 5d 4h 3s 2c").unwrap();
        let hs = evaluate_cards(&cards);
        assert!(hs.rank() < WORST_RANK);
        assert_eq!(StandardEvaluator.rank_class(WORST_RANK), 9);
    }
}
