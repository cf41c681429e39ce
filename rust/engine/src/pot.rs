use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TableConfig;
use crate::errors::GameError;
use crate::player::{ActionKind, Player};

/// A main or side pot and the players who may win it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    /// Player ids in ascending order.
    pub eligible: Vec<usize>,
}

/// Outcome of paying out every pot of a hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Chips won per player id (every seat present, zero if nothing won).
    pub winnings: BTreeMap<usize, u32>,
    pub pots: Vec<Pot>,
    /// Best-ranked contenders of each pot, parallel to `pots`.
    pub pot_winners: Vec<Vec<usize>>,
    pub rake: u32,
}

/// Betting legality and main/side-pot accounting for one table.
///
/// Chips bet during the current round stay "in flight" until
/// [`PotManager::start_new_betting_round`] settles them, so that
/// `settled + in_flight + stacks` always equals the chips the hand
/// started with.
#[derive(Debug, Clone)]
pub struct PotManager {
    small_blind: u32,
    big_blind: u32,
    rake_percent: f64,
    rake_cap: u32,
    min_raise_multiplier: f64,
    settled: u32,
    in_flight: u32,
    current_bet: u32,
    min_raise: u32,
    last_rake: u32,
}

impl PotManager {
    pub fn new(config: &TableConfig) -> Self {
        let mut pm = Self {
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            rake_percent: config.rake_percent,
            rake_cap: config.rake_cap,
            min_raise_multiplier: config.min_raise_multiplier,
            settled: 0,
            in_flight: 0,
            current_bet: 0,
            min_raise: 0,
            last_rake: 0,
        };
        pm.min_raise = pm.base_min_raise();
        pm
    }

    pub fn small_blind(&self) -> u32 {
        self.small_blind
    }
    pub fn big_blind(&self) -> u32 {
        self.big_blind
    }
    /// Highest current-round contribution at the table.
    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }
    /// Smallest legal raise increment.
    pub fn min_raise(&self) -> u32 {
        self.min_raise
    }
    /// Chips collected from completed betting rounds.
    pub fn settled(&self) -> u32 {
        self.settled
    }
    /// Chips bet during the current round.
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }
    /// Everything committed this hand.
    pub fn pot_total(&self) -> u32 {
        self.settled + self.in_flight
    }
    /// Rake taken by the last distribution.
    pub fn last_rake(&self) -> u32 {
        self.last_rake
    }

    pub fn to_call(&self, player: &Player) -> u32 {
        self.current_bet.saturating_sub(player.current_bet())
    }

    fn scaled(&self, chips: u32) -> u32 {
        ((f64::from(chips) * self.min_raise_multiplier).round() as u32).max(1)
    }

    fn base_min_raise(&self) -> u32 {
        self.scaled(self.big_blind)
    }

    pub fn start_new_hand(&mut self) {
        self.settled = 0;
        self.in_flight = 0;
        self.current_bet = 0;
        self.min_raise = self.base_min_raise();
        self.last_rake = 0;
    }

    /// Posts both blinds. Short stacks post what they have and go all-in.
    pub fn post_blinds(&mut self, sb: &mut Player, bb: &mut Player) -> (u32, u32) {
        let s = sb.bet(self.small_blind);
        let b = bb.bet(self.big_blind);
        self.in_flight += s + b;
        self.current_bet = self.big_blind;
        (s, b)
    }

    /// Places a bet of `amount` chips (this turn's total) for `player`.
    ///
    /// Returns the chips actually committed and how the bet resolved:
    /// - `amount` below the call amount (and below the stack) folds the player
    /// - `amount` equal to the call amount is a call, or a check when nothing is owed
    /// - anything larger raises the table's current bet
    /// - emptying the stack is always reported as [`ActionKind::AllIn`]
    pub fn place_bet(&mut self, player: &mut Player, amount: u32) -> (u32, ActionKind) {
        let to_call = self.to_call(player);
        if amount == 0 && to_call == 0 {
            return (0, ActionKind::Check);
        }
        if amount < to_call && amount < player.stack() {
            player.fold();
            return (0, ActionKind::Fold);
        }

        let actual = player.bet(amount);
        self.in_flight += actual;

        let raised = player.current_bet() > self.current_bet;
        if raised {
            let delta = player.current_bet() - self.current_bet;
            self.current_bet = player.current_bet();
            self.min_raise = self.min_raise.max(self.scaled(delta));
        }

        let kind = if player.is_all_in() {
            ActionKind::AllIn
        } else if raised {
            ActionKind::Raise
        } else if actual == 0 {
            ActionKind::Check
        } else {
            ActionKind::Call
        };
        (actual, kind)
    }

    /// Legal raise increments `(min, max)` on top of the call amount.
    pub fn valid_raise_range(&self, player: &Player) -> (u32, u32) {
        let max = player.stack().saturating_sub(self.to_call(player));
        (self.min_raise.min(max), max)
    }

    /// Settles the round's bets and resets round state for the next street.
    pub fn start_new_betting_round(&mut self, players: &mut [Player]) {
        self.settled += self.in_flight;
        self.in_flight = 0;
        for p in players.iter_mut() {
            p.reset_for_new_round();
        }
        self.current_bet = 0;
        self.min_raise = self.base_min_raise();
    }

    /// Splits the hand's contributions into one pot per distinct
    /// contribution level, lowest level first.
    ///
    /// Folded players stay eligible for the pots their chips built; they are
    /// kept from winning by being absent from the rank map at distribution.
    pub fn calculate_side_pots(players: &[Player]) -> Vec<Pot> {
        let mut contributors: Vec<(usize, u32)> = players
            .iter()
            .filter(|p| p.total_bet() > 0)
            .map(|p| (p.id(), p.total_bet()))
            .collect();
        contributors.sort_by_key(|&(id, bet)| (bet, id));

        let mut pots = Vec::new();
        let mut previous = 0u32;
        let mut start = 0usize;
        while start < contributors.len() {
            let remaining = &contributors[start..];
            let level = remaining[0].1;
            let mut eligible: Vec<usize> = remaining.iter().map(|&(id, _)| id).collect();
            eligible.sort_unstable();
            pots.push(Pot {
                amount: (level - previous) * remaining.len() as u32,
                eligible,
            });
            previous = level;
            start += remaining.iter().take_while(|&&(_, bet)| bet == level).count();
        }
        pots
    }

    /// Pays every pot to its best-ranked eligible players.
    ///
    /// `ranks` maps player id to hand rank (lower is better) and must contain
    /// only players still contesting the hand. Contested pots (two or more
    /// ranked players) are raked first. Split pots hand the odd chips one at a
    /// time to the winners in ascending player-id order.
    ///
    /// # Errors
    ///
    /// [`GameError::ChipConservation`] if the chips paid out plus rake differ
    /// from what was committed.
    pub fn distribute_pots(
        &mut self,
        players: &[Player],
        ranks: &BTreeMap<usize, u32>,
    ) -> Result<Distribution, GameError> {
        let pots = Self::calculate_side_pots(players);
        let mut winnings: BTreeMap<usize, u32> = players.iter().map(|p| (p.id(), 0)).collect();
        let mut pot_winners = Vec::with_capacity(pots.len());
        let mut rake_total = 0u32;

        for pot in &pots {
            let contenders: Vec<(usize, u32)> = pot
                .eligible
                .iter()
                .filter_map(|id| ranks.get(id).map(|&r| (*id, r)))
                .collect();
            let Some(best) = contenders.iter().map(|&(_, r)| r).min() else {
                tracing::error!(
                    amount = pot.amount,
                    eligible = ?pot.eligible,
                    "pot has no ranked contender"
                );
                pot_winners.push(Vec::new());
                continue;
            };
            let winners: Vec<usize> = contenders
                .iter()
                .filter(|&&(_, r)| r == best)
                .map(|&(id, _)| id)
                .collect();

            let mut amount = pot.amount;
            if contenders.len() >= 2 && self.rake_percent > 0.0 {
                let rake = ((f64::from(pot.amount) * self.rake_percent).floor() as u32)
                    .min(self.rake_cap);
                amount -= rake;
                rake_total += rake;
            }

            let n = winners.len() as u32;
            let share = amount / n;
            let remainder = amount % n;
            for (i, id) in winners.iter().enumerate() {
                let odd_chip = u32::from((i as u32) < remainder);
                *winnings.entry(*id).or_default() += share + odd_chip;
            }
            pot_winners.push(winners);
        }

        let committed: u64 = pots.iter().map(|p| u64::from(p.amount)).sum();
        let paid: u64 =
            winnings.values().map(|&w| u64::from(w)).sum::<u64>() + u64::from(rake_total);
        if paid != committed || committed != u64::from(self.pot_total()) {
            tracing::error!(
                committed,
                paid,
                tracked = self.pot_total(),
                "pot distribution lost chips"
            );
            return Err(GameError::ChipConservation {
                expected: u64::from(self.pot_total()),
                actual: paid,
            });
        }

        self.settled = 0;
        self.in_flight = 0;
        self.last_rake = rake_total;
        Ok(Distribution {
            winnings,
            pots,
            pot_winners,
            rake: rake_total,
        })
    }
}
