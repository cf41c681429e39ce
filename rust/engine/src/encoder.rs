use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::cards::Card;
use crate::config::EncoderConfig;
use crate::equity::EquityEstimator;
use crate::errors::GameError;
use crate::game::{GameState, HandResult};
use crate::hand::{RankingOracle, StandardEvaluator};
use crate::logger::{HandLogger, Street};
use crate::player::{position_from_button, ActionKind, PlayerAction};
use crate::tracker::OpponentTracker;

pub const CARD_SLOTS: usize = 7;
pub const CARD_FEATURES: usize = 6;
pub const HAND_FEATURES: usize = 3;
pub const GAME_FEATURES: usize = 8;

pub const EQUITY_INDEX: usize = CARD_SLOTS * CARD_FEATURES;
pub const POT_ODDS_INDEX: usize = EQUITY_INDEX + 1;
pub const SPR_INDEX: usize = EQUITY_INDEX + 2;
pub const GAME_FEATURES_INDEX: usize = EQUITY_INDEX + HAND_FEATURES;
pub const OPPONENT_FEATURES_INDEX: usize = GAME_FEATURES_INDEX + GAME_FEATURES;

/// Stack-to-pot ratios at or above this encode as 1.0.
pub const SPR_DIVISOR: f32 = 10.0;
/// Weight of the fold-quality term in the hero reward.
pub const FOLD_SHAPING: f32 = 0.1;

pub const FOLD: usize = 0;
pub const CHECK_CALL: usize = 1;
pub const FIRST_RAISE: usize = 2;

/// A decoded action id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodedAction {
    Fold,
    CheckCall,
    /// Raise by this fraction of the pot
    PotRaise(f64),
    AllIn,
}

/// Ids: fold, check/call, one per raise bin, then all-in if enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    raise_bins: Vec<f64>,
    include_all_in: bool,
}

impl ActionSpace {
    pub fn new(raise_bins: Vec<f64>, include_all_in: bool) -> Self {
        Self {
            raise_bins,
            include_all_in,
        }
    }

    pub fn size(&self) -> usize {
        FIRST_RAISE + self.raise_bins.len() + usize::from(self.include_all_in)
    }

    pub fn raise_bins(&self) -> &[f64] {
        &self.raise_bins
    }

    pub fn all_in_id(&self) -> Option<usize> {
        self.include_all_in
            .then(|| FIRST_RAISE + self.raise_bins.len())
    }

    pub fn decode(&self, id: usize) -> Result<EncodedAction, GameError> {
        match id {
            FOLD => Ok(EncodedAction::Fold),
            CHECK_CALL => Ok(EncodedAction::CheckCall),
            _ => {
                if let Some(&fraction) = self.raise_bins.get(id - FIRST_RAISE) {
                    Ok(EncodedAction::PotRaise(fraction))
                } else if Some(id) == self.all_in_id() {
                    Ok(EncodedAction::AllIn)
                } else {
                    Err(GameError::InvalidAction {
                        id,
                        size: self.size(),
                    })
                }
            }
        }
    }
}

/// Per-step details handed back with the observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub actor: usize,
    pub action: PlayerAction,
    pub kind: ActionKind,
    pub amount: u32,
    pub street: Street,
    /// Set on the step that ended the hand
    pub result: Option<HandResult>,
    /// Hero reward; non-zero only on terminal steps
    pub reward: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub terminal: bool,
    pub info: StepInfo,
}

/// Fixed-shape view of a table for decision-making clients.
///
/// Owns the game, the opponent tracker, the equity cache and the seeded
/// generator that drives both shuffling and equity rollouts. Observations
/// are taken from the acting player's seat, or the hero's once the hand is
/// over.
pub struct TableEncoder {
    config: EncoderConfig,
    state: GameState,
    tracker: Option<OpponentTracker>,
    equity: EquityEstimator,
    oracle: Box<dyn RankingOracle>,
    rng: ChaCha20Rng,
    space: ActionSpace,
    hand_start_stacks: BTreeMap<usize, u32>,
    hero_fold_equity: Option<f32>,
    forwarded: usize,
    last_result: Option<HandResult>,
    hand_log: Option<HandLogger>,
}

impl TableEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self, GameError> {
        Self::with_oracle(config, Box::new(StandardEvaluator))
    }

    pub fn with_oracle(
        config: EncoderConfig,
        oracle: Box<dyn RankingOracle>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::seed_from_u64(rand::random()),
        };
        Ok(Self {
            state: GameState::new(config.table.clone())?,
            tracker: config
                .track_opponents
                .then(|| OpponentTracker::new(config.history_capacity)),
            equity: EquityEstimator::new(config.equity_samples),
            oracle,
            rng,
            space: ActionSpace::new(config.raise_bins.clone(), config.include_all_in),
            hand_start_stacks: BTreeMap::new(),
            hero_fold_equity: None,
            forwarded: 0,
            last_result: None,
            hand_log: None,
            config,
        })
    }

    /// Appends every resolved hand to a JSONL file at `path`.
    pub fn log_hands_to<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GameError> {
        self.hand_log = Some(HandLogger::create(path)?);
        Ok(())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
    pub fn state(&self) -> &GameState {
        &self.state
    }
    pub fn tracker(&self) -> Option<&OpponentTracker> {
        self.tracker.as_ref()
    }
    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }
    pub fn last_result(&self) -> Option<&HandResult> {
        self.last_result.as_ref()
    }
    pub fn current_player(&self) -> Option<usize> {
        self.state.current_player()
    }

    pub fn observation_len(&self) -> usize {
        let opponents = if self.tracker.is_some() {
            self.config.max_opponent_slots * self.config.features_per_opponent
        } else {
            0
        };
        OPPONENT_FEATURES_INDEX + opponents
    }

    /// Deals a new hand and returns the first observation.
    ///
    /// Busted seats are refilled first when `rebuy_busted` is set. If no one
    /// can act after the blinds, the board is run out and the hand resolved
    /// before returning.
    pub fn reset_hand(&mut self) -> Result<Vec<f32>, GameError> {
        if self.config.rebuy_busted {
            let busted: Vec<usize> = self
                .state
                .players()
                .iter()
                .filter(|p| p.stack() == 0 && !p.is_sitting_out())
                .map(|p| p.id())
                .collect();
            for id in busted {
                self.state.top_up(id, self.config.table.starting_stack)?;
                tracing::debug!(player_id = id, "busted seat topped up");
            }
        }

        self.equity.clear();
        self.hero_fold_equity = None;
        self.last_result = None;
        self.forwarded = 0;
        self.state.start_hand(&mut self.rng)?;
        self.hand_start_stacks = self
            .state
            .players()
            .iter()
            .map(|p| (p.id(), p.stack() + p.total_bet()))
            .collect();

        if let (Some(tracker), Some(record)) = (self.tracker.as_mut(), self.state.hand_record()) {
            tracker.start_hand(record);
        }
        self.forward_actions();
        self.run_to_decision()?;
        Ok(self.observation())
    }

    /// Applies `action_id` for the acting player.
    ///
    /// `raise_total` overrides the pot-fraction size of a raise id with an
    /// explicit "raise to" amount for the street.
    pub fn step(
        &mut self,
        action_id: usize,
        raise_total: Option<u32>,
    ) -> Result<StepOutcome, GameError> {
        if !self.state.hand_in_progress() {
            return Err(if self.state.hand_number() == 0 {
                GameError::NoHandInProgress
            } else {
                GameError::HandAlreadyComplete
            });
        }
        let actor = self.state.current_player().ok_or(GameError::NoPlayerToAct)?;
        let action = self.validate_and_convert_with(action_id, raise_total)?;

        if actor == self.config.hero && action == PlayerAction::Fold {
            self.hero_fold_equity = Some(self.equity_for(actor));
        }

        let outcome = self.state.execute_action(action)?;
        self.forward_actions();
        let result = self.run_to_decision()?;
        let terminal = !self.state.hand_in_progress();
        let reward = if terminal { self.hero_reward() } else { 0.0 };

        Ok(StepOutcome {
            observation: self.observation(),
            terminal,
            info: StepInfo {
                actor,
                action,
                kind: outcome.kind,
                amount: outcome.amount,
                street: outcome.street,
                result,
                reward,
            },
        })
    }

    /// Maps an action id to a concrete action for the acting player.
    pub fn validate_and_convert(&self, action_id: usize) -> Result<PlayerAction, GameError> {
        self.validate_and_convert_with(action_id, None)
    }

    fn validate_and_convert_with(
        &self,
        action_id: usize,
        raise_total: Option<u32>,
    ) -> Result<PlayerAction, GameError> {
        let seat = self.state.current_player().ok_or(GameError::NoPlayerToAct)?;
        let player = self.state.player(seat)?;
        let to_call = self.state.pot().to_call(player);
        let stack = player.stack();

        Ok(match self.space.decode(action_id)? {
            EncodedAction::Fold if to_call == 0 => PlayerAction::CheckOrCall,
            EncodedAction::Fold => PlayerAction::Fold,
            EncodedAction::CheckCall => PlayerAction::CheckOrCall,
            EncodedAction::AllIn => PlayerAction::AllIn,
            EncodedAction::PotRaise(fraction) => {
                let raise = match raise_total {
                    Some(total) => total.saturating_sub(self.state.pot().current_bet()),
                    None => self.bin_raise_chips(fraction),
                };
                if to_call.saturating_add(raise) > stack {
                    if stack > to_call {
                        PlayerAction::AllIn
                    } else {
                        PlayerAction::CheckOrCall
                    }
                } else {
                    PlayerAction::Raise(raise)
                }
            }
        })
    }

    /// Pot fraction rounded to the nearest big blind, at least the minimum raise.
    fn bin_raise_chips(&self, fraction: f64) -> u32 {
        let pot = f64::from(self.state.pot().pot_total());
        let bb = self.state.pot().big_blind().max(1);
        let blinds = (pot * fraction / f64::from(bb)).round() as u32;
        (blinds * bb).max(self.state.pot().min_raise())
    }

    /// Ids the acting player can afford without being downgraded.
    pub fn get_valid_actions(&self) -> Vec<usize> {
        let Some(player) = self
            .state
            .current_player()
            .and_then(|seat| self.state.player(seat).ok())
        else {
            return Vec::new();
        };
        let to_call = self.state.pot().to_call(player);
        let stack = player.stack();

        let mut ids = vec![FOLD, CHECK_CALL];
        for (i, &fraction) in self.space.raise_bins().iter().enumerate() {
            if to_call.saturating_add(self.bin_raise_chips(fraction)) <= stack {
                ids.push(FIRST_RAISE + i);
            }
        }
        if let Some(id) = self.space.all_in_id() {
            if stack > 0 {
                ids.push(id);
            }
        }
        ids
    }

    /// Human-readable label for `action_id` in the current spot.
    pub fn get_action_description(&self, action_id: usize) -> String {
        let action = match self.space.decode(action_id) {
            Ok(a) => a,
            Err(_) => return format!("Unknown action {}", action_id),
        };
        let actor = self
            .state
            .current_player()
            .and_then(|seat| self.state.player(seat).ok());
        let Some(player) = actor else {
            return match action {
                EncodedAction::Fold => "Fold".to_string(),
                EncodedAction::CheckCall => "Check/Call".to_string(),
                EncodedAction::PotRaise(f) => format!("Raise {}x pot", f),
                EncodedAction::AllIn => "All-in".to_string(),
            };
        };
        let to_call = self.state.pot().to_call(player);
        match action {
            EncodedAction::Fold if to_call == 0 => "Check".to_string(),
            EncodedAction::Fold => "Fold".to_string(),
            EncodedAction::CheckCall if to_call == 0 => "Check".to_string(),
            EncodedAction::CheckCall => format!("Call {}", to_call.min(player.stack())),
            EncodedAction::PotRaise(f) => {
                format!("Raise {}x pot ({})", f, self.bin_raise_chips(f))
            }
            EncodedAction::AllIn => format!("All-in ({})", player.stack()),
        }
    }

    pub fn valid_raise_range(&self) -> Result<(u32, u32), GameError> {
        let seat = self.state.current_player().ok_or(GameError::NoPlayerToAct)?;
        self.state.valid_raise_range(seat)
    }

    pub fn export_stats<P: AsRef<Path>>(&self, path: P) -> Result<(), GameError> {
        match &self.tracker {
            Some(tracker) => tracker.export_stats(path),
            None => Err(GameError::InvalidConfig(
                "opponent tracking is disabled".into(),
            )),
        }
    }

    fn forward_actions(&mut self) {
        let Some(record) = self.state.hand_record() else {
            return;
        };
        if let Some(tracker) = self.tracker.as_mut() {
            for action in &record.actions[self.forwarded.min(record.actions.len())..] {
                tracker.record_action(action);
            }
        }
        self.forwarded = record.actions.len();
    }

    /// Advances streets nobody has to act on and resolves a finished hand.
    fn run_to_decision(&mut self) -> Result<Option<HandResult>, GameError> {
        while self.state.hand_in_progress()
            && !self.state.is_hand_complete()
            && self.state.is_betting_round_complete()
        {
            self.state.advance_betting_round()?;
        }
        if !(self.state.hand_in_progress() && self.state.is_hand_complete()) {
            return Ok(None);
        }

        let result = self.state.resolve_hand(self.oracle.as_ref())?;
        if let Some(record) = self.state.hand_record() {
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.end_hand(record);
            }
            if let Some(log) = self.hand_log.as_mut() {
                log.write(record)?;
            }
        }
        self.last_result = Some(result.clone());
        Ok(Some(result))
    }

    /// (final - start) / start for the hero, plus fold-quality shaping when
    /// the hero folded.
    fn hero_reward(&self) -> f32 {
        let hero = self.config.hero;
        let start = self.hand_start_stacks.get(&hero).copied().unwrap_or(0);
        if start == 0 {
            return 0.0;
        }
        let finish = self.state.player(hero).map(|p| p.stack()).unwrap_or(0);
        let mut reward = (finish as f32 - start as f32) / start as f32;
        if let Some(equity) = self.hero_fold_equity {
            reward += FOLD_SHAPING * (0.5 - equity);
        }
        reward
    }

    fn equity_for(&mut self, seat: usize) -> f32 {
        let Ok(player) = self.state.player(seat) else {
            return 0.0;
        };
        let hole = player.cards();
        self.equity.estimate(
            &hole,
            self.state.board(),
            self.state.street(),
            self.oracle.as_ref(),
            &mut self.rng,
        )
    }

    /// Observation from the acting seat (the hero's once nobody is to act).
    pub fn observation(&mut self) -> Vec<f32> {
        let seat = self.state.current_player().unwrap_or(self.config.hero);
        let mut obs = Vec::with_capacity(self.observation_len());

        let Ok(player) = self.state.player(seat) else {
            obs.resize(self.observation_len(), 0.0);
            return obs;
        };
        let hole = player.hole_cards();
        let stack = player.stack();
        let own_bet = player.current_bet();
        let to_call = self.state.pot().to_call(player);

        for card in hole.iter().copied() {
            encode_card(&mut obs, card);
        }
        for i in 0..5 {
            encode_card(&mut obs, self.state.board().get(i).copied());
        }

        let pot = self.state.pot().pot_total();
        let equity = self.equity_for(seat);
        let pot_odds = if to_call == 0 {
            0.0
        } else {
            to_call as f32 / (pot + to_call) as f32
        };
        let spr = if pot == 0 {
            1.0
        } else {
            (stack as f32 / pot as f32 / SPR_DIVISOR).min(1.0)
        };
        obs.extend([equity, pot_odds, spr]);

        let starting = self.config.table.starting_stack.max(1) as f32;
        let seats = self.state.seat_count().max(1);
        let button = self.state.button().unwrap_or(0);
        obs.extend([
            stack as f32 / starting,
            pot as f32 / starting,
            own_bet as f32 / starting,
            to_call as f32 / starting,
            self.state.active_count() as f32 / seats as f32,
            position_from_button(seat, button, seats) as f32 / seats as f32,
            self.state.street().index() as f32 / 4.0,
            button as f32 / seats as f32,
        ]);

        if let Some(tracker) = &self.tracker {
            let order: Vec<usize> = (1..seats)
                .map(|step| (seat + step) % seats)
                .filter(|&id| {
                    self.state
                        .player(id)
                        .map(|p| !p.is_sitting_out())
                        .unwrap_or(false)
                })
                .collect();
            obs.extend(tracker.get_observation_features(
                seat,
                &order,
                self.config.max_opponent_slots,
                self.config.features_per_opponent,
            ));
        }
        obs
    }
}

/// Normalized rank, one-hot suit and a presence flag; zeros for an empty slot.
fn encode_card(out: &mut Vec<f32>, card: Option<Card>) {
    match card {
        Some(c) => {
            out.push(f32::from(c.rank.value()) / 14.0);
            let mut suit = [0.0f32; 4];
            suit[c.suit.index()] = 1.0;
            out.extend(suit);
            out.push(1.0);
        }
        None => out.extend([0.0f32; CARD_FEATURES]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ids_follow_bins() {
        let space = ActionSpace::new(vec![0.5, 1.0, 2.0], true);
        assert_eq!(space.size(), 6);
        assert_eq!(space.decode(3).unwrap(), EncodedAction::PotRaise(1.0));
        assert_eq!(space.all_in_id(), Some(5));
        assert_eq!(space.decode(5).unwrap(), EncodedAction::AllIn);
        assert!(space.decode(6).is_err());
    }

    #[test]
    fn no_all_in_id_when_disabled() {
        let space = ActionSpace::new(vec![1.0], false);
        assert_eq!(space.size(), 3);
        assert_eq!(space.all_in_id(), None);
        assert!(space.decode(3).is_err());
    }

    #[test]
    fn card_slots_are_six_wide() {
        let mut out = Vec::new();
        encode_card(&mut out, Some("Ah".parse().unwrap()));
        encode_card(&mut out, None);
        assert_eq!(out.len(), 2 * CARD_FEATURES);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[3], 1.0); // hearts
        assert_eq!(out[5], 1.0);
        assert!(out[6..].iter().all(|v| *v == 0.0));
    }
}
