use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::config::{TableConfig, MAX_SEATS};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::hand::{showdown_rank, RankingOracle, WORST_RANK};
use crate::logger::{format_hand_id, today, ActionRecord, HandRecord, Street};
use crate::player::{position_from_button, ActionKind, Player, PlayerAction};
use crate::pot::{Pot, PotManager};
use crate::rules::{validate_action, ValidatedAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandPhase {
    Idle,
    Running,
    Resolved,
}

/// What a single [`GameState::execute_action`] call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub player_id: usize,
    pub kind: ActionKind,
    pub amount: u32,
    pub street: Street,
    pub round_complete: bool,
    pub hand_complete: bool,
}

/// Final accounting of a resolved hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub hand_number: u64,
    /// Winners of the main pot, ascending
    pub winners: Vec<usize>,
    /// Chips won per player id
    pub winnings: BTreeMap<usize, u32>,
    /// Rank per contending player (lower is better)
    pub ranks: BTreeMap<usize, u32>,
    pub pots: Vec<Pot>,
    pub pot_winners: Vec<Vec<usize>>,
    pub rake: u32,
    pub showdown: bool,
    pub board: Vec<Card>,
}

/// Hand lifecycle for one table: dealing, turn order, street advancement
/// and resolution.
///
/// Streets move strictly forward: Preflop, Flop, Turn, River, Showdown.
/// The caller drives the machine:
///
/// 1. [`GameState::start_hand`] posts blinds and deals hole cards
/// 2. [`GameState::execute_action`] for the player returned by
///    [`GameState::current_player`] until the betting round is complete
/// 3. [`GameState::advance_betting_round`] while the hand is not complete
/// 4. [`GameState::resolve_hand`] once [`GameState::is_hand_complete`]
#[derive(Debug, Clone)]
pub struct GameState {
    config: TableConfig,
    players: Vec<Player>,
    pot: PotManager,
    deck: Deck,
    board: Vec<Card>,
    street: Street,
    phase: HandPhase,
    hand_number: u64,
    button: Option<usize>,
    small_blind_seat: Option<usize>,
    big_blind_seat: Option<usize>,
    current: Option<usize>,
    last_aggressor: Option<usize>,
    round_actions: u32,
    starting_total: u64,
    record: Option<HandRecord>,
}

impl GameState {
    /// A table with `config.seats` players, each holding the starting stack.
    pub fn new(config: TableConfig) -> Result<Self, GameError> {
        config.validate()?;
        let players = (0..config.seats)
            .map(|id| Player::new(id, config.starting_stack))
            .collect();
        Ok(Self {
            pot: PotManager::new(&config),
            config,
            players,
            deck: Deck::new(),
            board: Vec::with_capacity(5),
            street: Street::Preflop,
            phase: HandPhase::Idle,
            hand_number: 0,
            button: None,
            small_blind_seat: None,
            big_blind_seat: None,
            current: None,
            last_aggressor: None,
            round_actions: 0,
            starting_total: 0,
            record: None,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn player(&self, id: usize) -> Result<&Player, GameError> {
        self.players.get(id).ok_or(GameError::UnknownPlayer { id })
    }
    pub fn pot(&self) -> &PotManager {
        &self.pot
    }
    pub fn board(&self) -> &[Card] {
        &self.board
    }
    pub fn street(&self) -> Street {
        self.street
    }
    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }
    pub fn button(&self) -> Option<usize> {
        self.button
    }
    pub fn small_blind_seat(&self) -> Option<usize> {
        self.small_blind_seat
    }
    pub fn big_blind_seat(&self) -> Option<usize> {
        self.big_blind_seat
    }
    /// Seat whose turn it is; `None` between rounds and after the hand.
    pub fn current_player(&self) -> Option<usize> {
        self.current
    }
    /// Last player to raise during the current round.
    pub fn last_aggressor(&self) -> Option<usize> {
        self.last_aggressor
    }
    /// Actions taken in the current betting round.
    pub fn round_actions(&self) -> u32 {
        self.round_actions
    }
    pub fn seat_count(&self) -> usize {
        self.players.len()
    }
    pub fn hand_in_progress(&self) -> bool {
        self.phase == HandPhase::Running
    }
    /// Log of the current (or last) hand.
    pub fn hand_record(&self) -> Option<&HandRecord> {
        self.record.as_ref()
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// Seat offset from the button, 0 when no hand has been dealt.
    pub fn position_of(&self, id: usize) -> usize {
        self.button
            .map(|b| position_from_button(id, b, self.players.len()))
            .unwrap_or(0)
    }

    pub fn to_call(&self, id: usize) -> Result<u32, GameError> {
        Ok(self.pot.to_call(self.player(id)?))
    }

    pub fn valid_raise_range(&self, id: usize) -> Result<(u32, u32), GameError> {
        Ok(self.pot.valid_raise_range(self.player(id)?))
    }

    /// Chips on the table: every stack plus everything committed this hand.
    pub fn total_chips(&self) -> u64 {
        self.players.iter().map(|p| u64::from(p.stack())).sum::<u64>()
            + u64::from(self.pot.pot_total())
    }

    /// Seats a new player with the starting stack between hands.
    pub fn add_player(&mut self) -> Result<usize, GameError> {
        if self.phase == HandPhase::Running {
            return Err(GameError::HandNotComplete);
        }
        if self.players.len() >= MAX_SEATS {
            return Err(GameError::InvalidTableSize {
                seats: self.players.len() + 1,
            });
        }
        let id = self.players.len();
        self.players.push(Player::new(id, self.config.starting_stack));
        self.config.seats = self.players.len();
        tracing::info!(player_id = id, "player seated");
        Ok(id)
    }

    /// Sits a player out from the next hand on. Seat ids stay stable.
    pub fn remove_player(&mut self, id: usize) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or(GameError::UnknownPlayer { id })?;
        player.sit_out();
        tracing::info!(player_id = id, "player sitting out");
        Ok(())
    }

    pub fn sit_in(&mut self, id: usize) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(id)
            .ok_or(GameError::UnknownPlayer { id })?;
        player.sit_in();
        Ok(())
    }

    /// Adds chips to a stack between hands.
    pub fn top_up(&mut self, id: usize, amount: u32) -> Result<(), GameError> {
        if self.phase == HandPhase::Running {
            return Err(GameError::HandNotComplete);
        }
        let player = self
            .players
            .get_mut(id)
            .ok_or(GameError::UnknownPlayer { id })?;
        player.top_up(amount);
        Ok(())
    }

    /// Next seat clockwise from `from` (exclusive) matching `pred`.
    fn next_seat<F: Fn(&Player) -> bool>(&self, from: usize, pred: F) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&seat| pred(&self.players[seat]))
    }

    fn needs_action(&self, p: &Player) -> bool {
        p.can_act() && (!p.has_acted() || p.current_bet() < self.pot.current_bet())
    }

    /// Next seat after `from` that still owes an action this round.
    fn next_to_act(&self, from: usize) -> Option<usize> {
        self.next_seat(from, |p| self.needs_action(p))
            .or_else(|| self.next_seat(from, Player::can_act))
    }

    /// Deals a new hand: rotates the button, posts blinds, deals hole cards.
    ///
    /// # Errors
    ///
    /// - [`GameError::HandNotComplete`] if the previous hand was not resolved
    /// - [`GameError::NotEnoughPlayers`] if fewer than two seats have chips
    pub fn start_hand<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.phase == HandPhase::Running {
            return Err(GameError::HandNotComplete);
        }
        for p in self.players.iter_mut() {
            p.reset_for_new_hand();
        }
        let funded = self.active_count();
        if funded < 2 {
            return Err(GameError::NotEnoughPlayers { funded });
        }

        self.hand_number += 1;
        let seats = self.players.len();
        let button = match self.button {
            Some(prev) => self.next_seat(prev, Player::is_active),
            None => self.next_seat(seats - 1, Player::is_active),
        }
        .ok_or(GameError::NotEnoughPlayers { funded })?;
        let (sb, bb) = if funded == 2 {
            let bb = self
                .next_seat(button, Player::is_active)
                .ok_or(GameError::NotEnoughPlayers { funded })?;
            (button, bb)
        } else {
            let sb = self
                .next_seat(button, Player::is_active)
                .ok_or(GameError::NotEnoughPlayers { funded })?;
            let bb = self
                .next_seat(sb, Player::is_active)
                .ok_or(GameError::NotEnoughPlayers { funded })?;
            (sb, bb)
        };
        self.button = Some(button);
        self.small_blind_seat = Some(sb);
        self.big_blind_seat = Some(bb);

        self.pot.start_new_hand();
        self.board.clear();
        self.street = Street::Preflop;
        self.last_aggressor = None;
        self.round_actions = 0;
        self.starting_total = self.total_chips();

        let dealt: Vec<usize> = (1..=seats)
            .map(|step| (button + step) % seats)
            .filter(|&seat| self.players[seat].is_active())
            .collect();
        let mut record = HandRecord {
            hand_id: format_hand_id(&today(), self.hand_number),
            hand_number: self.hand_number,
            button,
            small_blind: self.pot.small_blind(),
            big_blind: self.pot.big_blind(),
            players: {
                let mut ids = dealt.clone();
                ids.sort_unstable();
                ids
            },
            positions: dealt
                .iter()
                .map(|&id| (id, position_from_button(id, button, seats)))
                .collect(),
            starting_stacks: dealt
                .iter()
                .map(|&id| (id, self.players[id].stack()))
                .collect(),
            actions: Vec::new(),
            board: Vec::new(),
            winners: Vec::new(),
            winnings: BTreeMap::new(),
            final_stacks: BTreeMap::new(),
            showdown: false,
            ts: None,
        };

        self.deck = Deck::shuffled(rng);
        for _ in 0..2 {
            for &seat in &dealt {
                let c = self.deck.deal()?;
                self.players[seat].give_card(c)?;
            }
        }

        let (sb_before, bb_before) = (self.players[sb].stack(), self.players[bb].stack());
        let (sb_player, bb_player) = pair_mut(&mut self.players, sb, bb);
        let (posted_sb, posted_bb) = self.pot.post_blinds(sb_player, bb_player);
        record.actions.push(ActionRecord {
            street: Street::Preflop,
            player_id: sb,
            kind: ActionKind::PostBlind,
            amount: posted_sb,
            pot_size: 0,
            stack_before: sb_before,
            stack_after: self.players[sb].stack(),
            position: position_from_button(sb, button, seats),
        });
        record.actions.push(ActionRecord {
            street: Street::Preflop,
            player_id: bb,
            kind: ActionKind::PostBlind,
            amount: posted_bb,
            pot_size: posted_sb,
            stack_before: bb_before,
            stack_after: self.players[bb].stack(),
            position: position_from_button(bb, button, seats),
        });
        self.record = Some(record);
        self.phase = HandPhase::Running;

        self.current = if self.is_betting_round_complete() {
            None
        } else {
            self.next_to_act(bb)
        };

        tracing::info!(
            hand = self.hand_number,
            button,
            small_blind = sb,
            big_blind = bb,
            players = funded,
            "hand started"
        );
        Ok(())
    }

    /// True when nobody owes an action on this street.
    pub fn is_betting_round_complete(&self) -> bool {
        if self.active_count() <= 1 {
            return true;
        }
        let bet = self.pot.current_bet();
        let actors: Vec<&Player> = self.players.iter().filter(|p| p.can_act()).collect();
        match actors.as_slice() {
            [] => true,
            // a lone player facing no unmatched bet has nobody left to bet against
            [only] if only.current_bet() >= bet => true,
            _ => actors
                .iter()
                .all(|p| p.has_acted() && p.current_bet() >= bet),
        }
    }

    pub fn is_hand_complete(&self) -> bool {
        match self.phase {
            HandPhase::Idle => false,
            HandPhase::Resolved => true,
            HandPhase::Running => self.active_count() <= 1 || self.street == Street::Showdown,
        }
    }

    fn check_conservation(&self) -> Result<(), GameError> {
        let actual = self.total_chips();
        if actual != self.starting_total {
            tracing::error!(
                hand = self.hand_number,
                expected = self.starting_total,
                actual,
                "chip conservation violated"
            );
            return Err(GameError::ChipConservation {
                expected: self.starting_total,
                actual,
            });
        }
        Ok(())
    }

    /// Applies `action` for the player whose turn it is.
    ///
    /// Raises below the minimum follow the table's raise policy. The turn
    /// passes to the next seat that still owes an action; when the round is
    /// complete [`GameState::current_player`] becomes `None`.
    pub fn execute_action(&mut self, action: PlayerAction) -> Result<ActionOutcome, GameError> {
        match self.phase {
            HandPhase::Idle => return Err(GameError::NoHandInProgress),
            HandPhase::Resolved => return Err(GameError::HandAlreadyComplete),
            HandPhase::Running => {}
        }
        if self.is_hand_complete() {
            return Err(GameError::HandAlreadyComplete);
        }
        let seat = self.current.ok_or(GameError::NoPlayerToAct)?;

        let pot_before = self.pot.pot_total();
        let bet_before = self.pot.current_bet();
        let stack_before = self.players[seat].stack();
        let to_call = self.pot.to_call(&self.players[seat]);
        let validated = validate_action(
            stack_before,
            to_call,
            self.pot.min_raise(),
            action,
            self.config.raise_policy,
        )?;

        let player = &mut self.players[seat];
        let (amount, kind) = match validated {
            ValidatedAction::Fold => {
                player.fold();
                (0, ActionKind::Fold)
            }
            other => self.pot.place_bet(player, other.chips()),
        };
        player.mark_acted();
        let stack_after = player.stack();

        if self.pot.current_bet() > bet_before {
            self.last_aggressor = Some(seat);
        }
        self.round_actions += 1;

        let position = self.position_of(seat);
        if let Some(record) = self.record.as_mut() {
            record.actions.push(ActionRecord {
                street: self.street,
                player_id: seat,
                kind,
                amount,
                pot_size: pot_before,
                stack_before,
                stack_after,
                position,
            });
        }
        self.check_conservation()?;

        let round_complete = self.is_betting_round_complete();
        self.current = if round_complete {
            None
        } else {
            self.next_to_act(seat)
        };

        tracing::debug!(
            hand = self.hand_number,
            street = ?self.street,
            player_id = seat,
            kind = ?kind,
            amount,
            pot = self.pot.pot_total(),
            "action executed"
        );

        Ok(ActionOutcome {
            player_id: seat,
            kind,
            amount,
            street: self.street,
            round_complete,
            hand_complete: self.is_hand_complete(),
        })
    }

    /// Moves to the next street: burns and reveals community cards and
    /// resets round state. First to act is the first eligible seat after
    /// the button.
    ///
    /// # Errors
    ///
    /// [`GameError::BettingRoundIncomplete`] while someone still owes an
    /// action, [`GameError::HandAlreadyComplete`] once the hand is over.
    pub fn advance_betting_round(&mut self) -> Result<Street, GameError> {
        match self.phase {
            HandPhase::Idle => return Err(GameError::NoHandInProgress),
            HandPhase::Resolved => return Err(GameError::HandAlreadyComplete),
            HandPhase::Running => {}
        }
        if self.is_hand_complete() {
            return Err(GameError::HandAlreadyComplete);
        }
        if !self.is_betting_round_complete() {
            return Err(GameError::BettingRoundIncomplete);
        }
        let next = self.street.next().ok_or(GameError::HandAlreadyComplete)?;

        let count = next.cards_dealt();
        if count > 0 {
            self.deck.burn_card();
            for _ in 0..count {
                let c = self.deck.deal()?;
                self.board.push(c);
            }
        }
        self.street = next;
        self.pot.start_new_betting_round(&mut self.players);
        self.round_actions = 0;
        self.last_aggressor = None;
        if let Some(record) = self.record.as_mut() {
            record.board = self.board.clone();
        }

        self.current = match (self.street, self.button) {
            (Street::Showdown, _) | (_, None) => None,
            (_, Some(button)) if !self.is_betting_round_complete() => {
                self.next_seat(button, Player::can_act)
            }
            _ => None,
        };

        tracing::debug!(
            hand = self.hand_number,
            street = ?self.street,
            board = ?self.board.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "street advanced"
        );
        Ok(self.street)
    }

    /// Scores every unfolded player, pays out all pots and closes the hand.
    ///
    /// Players with fewer than three community cards on the board get
    /// [`WORST_RANK`]; that only matters when a single player remains.
    pub fn resolve_hand(&mut self, oracle: &dyn RankingOracle) -> Result<HandResult, GameError> {
        match self.phase {
            HandPhase::Idle => return Err(GameError::NoHandInProgress),
            HandPhase::Resolved => return Err(GameError::HandAlreadyComplete),
            HandPhase::Running => {}
        }
        if !self.is_hand_complete() {
            return Err(GameError::HandNotComplete);
        }

        let contenders: Vec<usize> = self
            .players
            .iter()
            .filter(|p| p.is_active())
            .map(Player::id)
            .collect();
        let showdown = contenders.len() >= 2;
        let mut ranks = BTreeMap::new();
        for &id in &contenders {
            let rank = if showdown {
                showdown_rank(oracle, &self.players[id].cards(), &self.board)?
            } else {
                WORST_RANK
            };
            ranks.insert(id, rank);
        }

        let distribution = self.pot.distribute_pots(&self.players, &ranks)?;
        for (&id, &won) in &distribution.winnings {
            if won > 0 {
                self.players[id].add_chips(won);
            }
        }

        let expected = self.starting_total - u64::from(distribution.rake);
        let actual = self.total_chips();
        if actual != expected {
            tracing::error!(hand = self.hand_number, expected, actual, "chips lost at resolution");
            return Err(GameError::ChipConservation { expected, actual });
        }

        let winners = distribution.pot_winners.first().cloned().unwrap_or_default();
        if let Some(record) = self.record.as_mut() {
            record.board = self.board.clone();
            record.winners = winners.clone();
            record.winnings = distribution
                .winnings
                .iter()
                .filter(|(_, w)| **w > 0)
                .map(|(&id, &w)| (id, w))
                .collect();
            record.final_stacks = record
                .players
                .iter()
                .map(|&id| (id, self.players[id].stack()))
                .collect();
            record.showdown = showdown;
        }
        self.phase = HandPhase::Resolved;
        self.current = None;

        tracing::info!(
            hand = self.hand_number,
            winners = ?winners,
            rake = distribution.rake,
            showdown,
            "hand resolved"
        );

        Ok(HandResult {
            hand_number: self.hand_number,
            winners,
            winnings: distribution.winnings,
            ranks,
            pots: distribution.pots,
            pot_winners: distribution.pot_winners,
            rake: distribution.rake,
            showdown,
            board: self.board.clone(),
        })
    }
}

/// Two distinct players borrowed mutably at once.
fn pair_mut(players: &mut [Player], a: usize, b: usize) -> (&mut Player, &mut Player) {
    if a < b {
        let (left, right) = players.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = players.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn started(seats: usize) -> GameState {
        let mut gs = GameState::new(TableConfig::with_seats(seats)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        gs.start_hand(&mut rng).unwrap();
        gs
    }

    #[test]
    fn first_hand_puts_button_on_seat_zero() {
        let gs = started(4);
        assert_eq!(gs.button(), Some(0));
        assert_eq!(gs.small_blind_seat(), Some(1));
        assert_eq!(gs.big_blind_seat(), Some(2));
        assert_eq!(gs.current_player(), Some(3));
    }

    #[test]
    fn heads_up_button_posts_small_blind_and_acts_first() {
        let gs = started(2);
        assert_eq!(gs.small_blind_seat(), Some(0));
        assert_eq!(gs.big_blind_seat(), Some(1));
        assert_eq!(gs.current_player(), Some(0));
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut players = vec![Player::new(0, 1), Player::new(1, 2), Player::new(2, 3)];
        let (a, b) = pair_mut(&mut players, 2, 0);
        assert_eq!((a.id(), b.id()), (2, 0));
    }
}
