use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;

/// What a player asks the table to do on their turn.
///
/// `Raise` carries the raise increment on top of the amount needed to call.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Fold and forfeit the hand
    Fold,
    /// Check when nothing is owed, otherwise call
    CheckOrCall,
    /// Call and raise by the given increment
    Raise(u32),
    /// Commit the whole remaining stack
    AllIn,
}

/// What an action resolved to once the pot manager applied it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
    PostBlind,
}

impl ActionKind {
    /// Chips went in by choice (blind posts do not count).
    pub fn is_voluntary(self) -> bool {
        matches!(self, ActionKind::Call | ActionKind::Raise | ActionKind::AllIn)
    }

    pub fn is_aggressive(self) -> bool {
        matches!(self, ActionKind::Raise | ActionKind::AllIn)
    }
}

/// A seat at the table: chip stack, bets this round and this hand, hole
/// cards and status flags.
///
/// Invariants: a folded player never acts again this hand; an empty stack
/// during a hand always means all-in.
#[derive(Debug, Clone)]
pub struct Player {
    id: usize,
    stack: u32,
    current_bet: u32,
    total_bet: u32,
    hole: [Option<Card>; 2],
    in_hand: bool,
    folded: bool,
    all_in: bool,
    sitting_out: bool,
    acted: bool,
    winnings: u64,
}

impl Player {
    pub fn new(id: usize, stack: u32) -> Self {
        Self {
            id,
            stack,
            current_bet: 0,
            total_bet: 0,
            hole: [None, None],
            in_hand: false,
            folded: false,
            all_in: false,
            sitting_out: false,
            acted: false,
            winnings: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
    pub fn stack(&self) -> u32 {
        self.stack
    }
    /// Chips put in during the current betting round.
    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }
    /// Chips put in during the whole hand.
    pub fn total_bet(&self) -> u32 {
        self.total_bet
    }
    /// Total chips won over the player's lifetime at the table.
    pub fn winnings(&self) -> u64 {
        self.winnings
    }
    pub fn is_folded(&self) -> bool {
        self.folded
    }
    pub fn is_all_in(&self) -> bool {
        self.all_in
    }
    pub fn is_sitting_out(&self) -> bool {
        self.sitting_out
    }
    pub fn has_acted(&self) -> bool {
        self.acted
    }
    /// Dealt into the current hand and not folded.
    pub fn is_active(&self) -> bool {
        self.in_hand && !self.folded
    }
    pub fn can_act(&self) -> bool {
        self.is_active() && !self.all_in
    }

    pub fn hole_cards(&self) -> [Option<Card>; 2] {
        self.hole
    }

    pub fn cards(&self) -> Vec<Card> {
        self.hole.iter().flatten().copied().collect()
    }

    pub fn give_card(&mut self, c: Card) -> Result<(), GameError> {
        match self.hole.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(c);
                Ok(())
            }
            None => Err(GameError::InvalidCard(format!(
                "player {} already holds two cards",
                self.id
            ))),
        }
    }

    /// Moves up to `amount` chips from the stack into the pot and returns
    /// what was actually committed.
    pub fn bet(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.stack);
        self.stack -= actual;
        self.current_bet += actual;
        self.total_bet += actual;
        if self.stack == 0 && self.in_hand {
            self.all_in = true;
        }
        actual
    }

    pub fn fold(&mut self) {
        self.folded = true;
    }

    pub fn mark_acted(&mut self) {
        self.acted = true;
    }

    /// Credits pot winnings to the stack.
    pub fn add_chips(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
        self.winnings += u64::from(amount);
    }

    /// Adds chips bought in between hands; not counted as winnings.
    pub fn top_up(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
    }

    pub fn sit_out(&mut self) {
        self.sitting_out = true;
    }

    pub fn sit_in(&mut self) {
        self.sitting_out = false;
    }

    pub fn reset_for_new_hand(&mut self) {
        self.hole = [None, None];
        self.current_bet = 0;
        self.total_bet = 0;
        self.folded = false;
        self.all_in = false;
        self.acted = false;
        self.in_hand = !self.sitting_out && self.stack > 0;
    }

    pub fn reset_for_new_round(&mut self) {
        self.current_bet = 0;
        self.acted = false;
    }
}

/// Seat offset clockwise from the button: 0 = button, 1 = small blind,
/// 2 = big blind (3+ handed), and so on.
pub fn position_from_button(seat: usize, button: usize, seats: usize) -> usize {
    (seat + seats - button % seats) % seats
}
