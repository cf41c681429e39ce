use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::cards::Card;
use crate::deck::unseen_cards;
use crate::errors::GameError;
use crate::hand::RankingOracle;
use crate::logger::Street;

/// Returned when the estimate cannot be computed.
pub const NEUTRAL_EQUITY: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EquityKey {
    hole: Vec<Card>,
    board: Vec<Card>,
    street: Street,
}

/// Win probability against one random opponent hand, memoized per
/// decision point.
#[derive(Debug, Clone)]
pub struct EquityEstimator {
    samples: usize,
    cache: HashMap<EquityKey, f32>,
}

impl EquityEstimator {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(1),
            cache: HashMap::new(),
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Forgets every memoized estimate; call when a new hand starts.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Equity of `hole` on `board`, in `[0, 1]`.
    ///
    /// Before the flop a closed-form heuristic is used; from the flop on the
    /// board is completed by Monte Carlo rollouts. Oracle failures are
    /// logged and reported as [`NEUTRAL_EQUITY`].
    pub fn estimate<R: Rng + ?Sized>(
        &mut self,
        hole: &[Card],
        board: &[Card],
        street: Street,
        oracle: &dyn RankingOracle,
        rng: &mut R,
    ) -> f32 {
        if hole.len() < 2 {
            return 0.0;
        }
        if board.len() < 3 {
            return preflop_heuristic(hole);
        }
        let key = EquityKey {
            hole: hole.to_vec(),
            board: board.to_vec(),
            street,
        };
        if let Some(&equity) = self.cache.get(&key) {
            return equity;
        }
        match monte_carlo(hole, board, self.samples, oracle, rng) {
            Ok(equity) => {
                self.cache.insert(key, equity);
                equity
            }
            Err(e) => {
                tracing::warn!(error = %e, "equity rollout failed, using neutral equity");
                NEUTRAL_EQUITY
            }
        }
    }
}

/// Normalized high card plus a pair bonus: 0.3 + 0.35 * high + 0.2 if paired.
pub fn preflop_heuristic(hole: &[Card]) -> f32 {
    let [a, b] = match hole {
        [a, b, ..] => [a, b],
        _ => return 0.0,
    };
    let high = a.rank.value().max(b.rank.value());
    let high_norm = f32::from(high - 2) / 12.0;
    let pair_bonus = if a.rank == b.rank { 0.2 } else { 0.0 };
    (0.3 + 0.35 * high_norm + pair_bonus).clamp(0.0, 1.0)
}

/// Deals a random opponent hand and the rest of the board `samples` times;
/// wins count 1, ties 0.5.
pub fn monte_carlo<R: Rng + ?Sized>(
    hole: &[Card],
    board: &[Card],
    samples: usize,
    oracle: &dyn RankingOracle,
    rng: &mut R,
) -> Result<f32, GameError> {
    let known: Vec<Card> = hole.iter().chain(board).copied().collect();
    let mut unseen = unseen_cards(&known);
    let missing = 5usize.saturating_sub(board.len());
    let draw = 2 + missing;
    if unseen.len() < draw {
        return Err(GameError::DeckExhausted);
    }

    let mut hero = Vec::with_capacity(7);
    let mut villain = Vec::with_capacity(7);
    let mut score = 0.0f64;
    for _ in 0..samples {
        let (drawn, _) = unseen.partial_shuffle(rng, draw);
        let (opp, runout) = drawn.split_at(2);

        hero.clear();
        hero.extend_from_slice(hole);
        hero.extend_from_slice(board);
        hero.extend_from_slice(runout);

        villain.clear();
        villain.extend_from_slice(opp);
        villain.extend_from_slice(board);
        villain.extend_from_slice(runout);

        let ours = oracle.evaluate(&hero)?;
        let theirs = oracle.evaluate(&villain)?;
        score += match ours.cmp(&theirs) {
            std::cmp::Ordering::Less => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Greater => 0.0,
        };
    }
    Ok(((score / samples.max(1) as f64) as f32).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;
    use crate::hand::StandardEvaluator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct BrokenOracle;

    impl RankingOracle for BrokenOracle {
        fn evaluate(&self, _cards: &[Card]) -> Result<u32, GameError> {
            Err(GameError::Oracle("unavailable".into()))
        }
        fn rank_class(&self, _rank: u32) -> u8 {
            9
        }
        fn class_to_string(&self, _class: u8) -> &'static str {
            "Unknown"
        }
    }

    #[test]
    fn pocket_aces_beat_seven_deuce_preflop() {
        let aces = parse_cards("Ah As").unwrap();
        let junk = parse_cards("7c 2d").unwrap();
        assert!(preflop_heuristic(&aces) > preflop_heuristic(&junk));
        assert!((preflop_heuristic(&aces) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn made_nuts_on_river_never_loses() {
        let hole = parse_cards("Ah Kh").unwrap();
        let board = parse_cards("Qh Jh Th 2c 3d").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let eq = monte_carlo(&hole, &board, 100, &StandardEvaluator, &mut rng).unwrap();
        assert_eq!(eq, 1.0);
    }

    #[test]
    fn oracle_failure_falls_back_to_neutral_and_is_not_cached() {
        let hole = parse_cards("Ah Kh").unwrap();
        let board = parse_cards("Qh Jh 2c").unwrap();
        let mut est = EquityEstimator::new(10);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let eq = est.estimate(&hole, &board, Street::Flop, &BrokenOracle, &mut rng);
        assert_eq!(eq, NEUTRAL_EQUITY);
        assert_eq!(est.cached(), 0);
    }

    #[test]
    fn repeated_requests_hit_the_cache() {
        let hole = parse_cards("9s 9d").unwrap();
        let board = parse_cards("2c 7h Kd").unwrap();
        let mut est = EquityEstimator::new(50);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let first = est.estimate(&hole, &board, Street::Flop, &StandardEvaluator, &mut rng);
        let second = est.estimate(&hole, &board, Street::Flop, &StandardEvaluator, &mut rng);
        assert_eq!(first, second);
        assert_eq!(est.cached(), 1);
        est.clear();
        assert_eq!(est.cached(), 0);
    }
}
