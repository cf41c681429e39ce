use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;
use crate::player::ActionKind;

/// Represents a betting street in Texas Hold'em poker.
/// Streets only move forward; `Showdown` is terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    /// Before flop (hole cards dealt)
    Preflop,
    /// After flop (3 community cards)
    Flop,
    /// After turn (4th community card)
    Turn,
    /// After river (5th community card)
    River,
    /// Betting is over and hands are compared
    Showdown,
}

impl Street {
    pub fn next(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => Some(Street::Showdown),
            Street::Showdown => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 1,
            Street::Turn => 2,
            Street::River => 3,
            Street::Showdown => 4,
        }
    }

    /// Community cards revealed when this street begins.
    pub fn cards_dealt(self) -> usize {
        match self {
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
            Street::Preflop | Street::Showdown => 0,
        }
    }
}

/// Records a single player action during a hand, with the pot and stack
/// snapshot around it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The betting street when this action occurred
    pub street: Street,
    pub player_id: usize,
    /// What the action resolved to
    pub kind: ActionKind,
    /// Chips committed by this action
    pub amount: u32,
    /// Pot (settled and in flight) before the action
    pub pot_size: u32,
    pub stack_before: u32,
    pub stack_after: u32,
    /// Seat offset from the button (0 = button)
    pub position: usize,
}

/// Complete record of a poker hand including all actions, board cards, and outcome.
/// Serialized to JSONL format for hand history storage and replay.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    /// Unique identifier for this hand (format: YYYYMMDD-NNNNNN)
    pub hand_id: String,
    pub hand_number: u64,
    pub button: usize,
    pub small_blind: u32,
    pub big_blind: u32,
    /// Players dealt into the hand, ascending
    pub players: Vec<usize>,
    /// Seat offset from the button per dealt-in player
    pub positions: BTreeMap<usize, usize>,
    pub starting_stacks: BTreeMap<usize, u32>,
    /// Chronological list of all actions, blind posts first
    pub actions: Vec<ActionRecord>,
    /// Community cards on the board (up to 5 cards)
    pub board: Vec<Card>,
    /// Main-pot winners; empty until the hand is resolved
    #[serde(default)]
    pub winners: Vec<usize>,
    #[serde(default)]
    pub winnings: BTreeMap<usize, u32>,
    #[serde(default)]
    pub final_stacks: BTreeMap<usize, u32>,
    /// Whether two or more players compared hands
    #[serde(default)]
    pub showdown: bool,
    /// Timestamp when the hand was played (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
}

impl HandRecord {
    pub fn is_resolved(&self) -> bool {
        !self.final_stacks.is_empty()
    }

    /// Players who never folded during the hand.
    pub fn unfolded_players(&self) -> Vec<usize> {
        self.players
            .iter()
            .copied()
            .filter(|id| {
                !self
                    .actions
                    .iter()
                    .any(|a| a.player_id == *id && a.kind == ActionKind::Fold)
            })
            .collect()
    }
}

pub fn format_hand_id(yyyymmdd: &str, seq: u64) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

/// Today's date for hand ids.
pub fn today() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

/// Appends hand records as JSON lines (LF endings only).
pub struct HandLogger {
    writer: BufWriter<File>,
    written: u64,
}

impl HandLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(f),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write(&mut self, record: &HandRecord) -> Result<(), GameError> {
        // inject timestamp if missing
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}
