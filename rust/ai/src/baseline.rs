//! Reference policies.
//!
//! [`BaselinePolicy`] is a deterministic rule-based player that looks only
//! at the hand features of the observation: estimated equity and pot odds.
//! [`CallPolicy`] and [`RandomPolicy`] are the usual benchmarks.

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha20Rng;
use riverbot_engine::encoder::{CHECK_CALL, EQUITY_INDEX, FIRST_RAISE, FOLD, POT_ODDS_INDEX};

use crate::Policy;

/// Equity at or above which the policy shoves with its largest option.
pub const SHOVE_EQUITY: f32 = 0.85;
/// Equity at or above which the policy raises the smallest bin.
pub const RAISE_EQUITY: f32 = 0.65;
/// Extra equity over the pot odds demanded before calling.
pub const CALL_MARGIN: f32 = 0.05;

/// Rule-based player driven by the equity and pot-odds features.
///
/// # Strategy
///
/// - Equity >= 0.85: the largest valid id (biggest raise or all-in)
/// - Equity >= 0.65: the smallest valid raise, calling if none is valid
/// - Equity beats pot odds by the call margin, or nothing to call: check/call
/// - Otherwise: fold
///
/// # Example
///
/// ```rust
/// use riverbot_ai::Policy;
/// use riverbot_ai::baseline::BaselinePolicy;
/// use riverbot_engine::encoder::{CHECK_CALL, EQUITY_INDEX, FOLD, POT_ODDS_INDEX};
///
/// let mut policy = BaselinePolicy::new();
/// let mut obs = vec![0.0f32; 89];
/// obs[EQUITY_INDEX] = 0.2;
/// obs[POT_ODDS_INDEX] = 0.4;
/// assert_eq!(policy.select_action(&obs, &[0, 1, 2, 5]), FOLD);
///
/// obs[POT_ODDS_INDEX] = 0.0;
/// assert_eq!(policy.select_action(&obs, &[0, 1, 2, 5]), CHECK_CALL);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselinePolicy;

impl BaselinePolicy {
    pub fn new() -> Self {
        Self
    }

    fn decide(equity: f32, pot_odds: f32, valid: &[usize]) -> usize {
        let smallest_raise = valid.iter().copied().filter(|&id| id >= FIRST_RAISE).min();
        let largest = valid.iter().copied().max();

        if equity >= SHOVE_EQUITY {
            if let Some(id) = largest.filter(|&id| id >= FIRST_RAISE) {
                return id;
            }
        }
        if equity >= RAISE_EQUITY {
            if let Some(id) = smallest_raise {
                return id;
            }
        }
        if pot_odds == 0.0 || equity >= pot_odds + CALL_MARGIN {
            CHECK_CALL
        } else {
            FOLD
        }
    }
}

impl Policy for BaselinePolicy {
    fn select_action(&mut self, observation: &[f32], valid_actions: &[usize]) -> usize {
        let (Some(&equity), Some(&pot_odds)) = (
            observation.get(EQUITY_INDEX),
            observation.get(POT_ODDS_INDEX),
        ) else {
            tracing::warn!(len = observation.len(), "observation too short, checking");
            return CHECK_CALL;
        };
        Self::decide(equity, pot_odds, valid_actions)
    }

    fn name(&self) -> &str {
        "BaselinePolicy"
    }
}

/// Checks or calls every decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallPolicy;

impl Policy for CallPolicy {
    fn select_action(&mut self, _observation: &[f32], _valid_actions: &[usize]) -> usize {
        CHECK_CALL
    }

    fn name(&self) -> &str {
        "CallPolicy"
    }
}

/// Uniform choice over the valid ids from its own seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _observation: &[f32], valid_actions: &[usize]) -> usize {
        valid_actions
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CHECK_CALL)
    }

    fn name(&self) -> &str {
        "RandomPolicy"
    }
}
