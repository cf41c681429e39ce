use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::MAX_SEATS;
use crate::errors::GameError;
use crate::logger::{ActionRecord, HandRecord, Street};
use crate::player::ActionKind;
use crate::profile::{
    HandSummary, OpponentProfile, PlayerStyle, OPPONENT_STAT_FEATURES, UNTRACKED_FEATURES,
};
use crate::ring::RingBuffer;

/// A tendency worth adjusting to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExploitKind {
    LooseVpip,
    TightVpip,
    FoldsToThreeBet,
    CallsThreeBets,
    Passive,
    Aggressive,
}

impl ExploitKind {
    pub fn suggestion(self) -> &'static str {
        match self {
            ExploitKind::LooseVpip => "Tighten up and value bet wider",
            ExploitKind::TightVpip => "Steal blinds more and attack in position",
            ExploitKind::FoldsToThreeBet => "3-bet more often with a wider range",
            ExploitKind::CallsThreeBets => "3-bet only for value with premium hands",
            ExploitKind::Passive => "Value bet more, bluff less",
            ExploitKind::Aggressive => "Check-raise more and call down tighter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exploit {
    pub kind: ExploitKind,
    /// Distance past the threshold
    pub severity: f64,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploitableOpponent {
    pub player_id: usize,
    pub hands_played: u32,
    pub style: PlayerStyle,
    /// Sum of all exploit severities
    pub score: f64,
    pub exploits: Vec<Exploit>,
}

#[derive(Serialize)]
struct StatsExport<'a> {
    timestamp: String,
    total_hands: u64,
    opponents: BTreeMap<usize, &'a OpponentProfile>,
}

/// Per-player statistics built from the stream of hand events.
///
/// Profiles live in a fixed table indexed by player id and persist across
/// hands; finished hands are kept in a bounded history.
#[derive(Debug, Clone)]
pub struct OpponentTracker {
    profiles: [Option<OpponentProfile>; MAX_SEATS],
    history: RingBuffer<HandRecord>,
    current: Option<HandRecord>,
    total_hands: u64,
}

impl OpponentTracker {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            profiles: std::array::from_fn(|_| None),
            history: RingBuffer::new(history_capacity),
            current: None,
            total_hands: 0,
        }
    }

    pub fn total_hands(&self) -> u64 {
        self.total_hands
    }

    pub fn profile(&self, player_id: usize) -> Option<&OpponentProfile> {
        self.profiles.get(player_id).and_then(Option::as_ref)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &OpponentProfile> {
        self.profiles.iter().flatten()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Begins a hand from its opening record: players, positions and stacks.
    /// Actions already in `context` are ignored; feed them through
    /// [`OpponentTracker::record_action`].
    pub fn start_hand(&mut self, context: &HandRecord) {
        if let Some(unfinished) = &self.current {
            tracing::warn!(hand = unfinished.hand_number, "previous hand never ended");
        }
        for &id in &context.players {
            match self.profiles.get_mut(id) {
                Some(slot) => {
                    slot.get_or_insert_with(|| OpponentProfile::new(id));
                }
                None => tracing::warn!(player_id = id, "player id outside tracker table"),
            }
        }
        let mut hand = context.clone();
        hand.actions.clear();
        self.current = Some(hand);
    }

    pub fn record_action(&mut self, action: &ActionRecord) {
        let Some(hand) = self.current.as_mut() else {
            tracing::warn!(player_id = action.player_id, "action recorded outside a hand");
            return;
        };
        hand.actions.push(action.clone());
        if let Some(Some(profile)) = self.profiles.get_mut(action.player_id) {
            profile.observe_action(action.kind);
        }
    }

    /// Closes the hand using the resolved record (winners, winnings, final
    /// stacks, board) and recomputes every dealt-in player's rates.
    pub fn end_hand(&mut self, outcome: &HandRecord) {
        let Some(hand) = self.current.take() else {
            tracing::warn!(hand = outcome.hand_number, "hand ended without start");
            return;
        };
        let summaries = summarize(outcome, &hand.actions);
        for (id, summary) in &summaries {
            if let Some(Some(profile)) = self.profiles.get_mut(*id) {
                profile.apply_hand(summary);
            }
        }
        let mut finished = outcome.clone();
        finished.actions = hand.actions;
        self.history.push(finished);
        self.total_hands += 1;
        tracing::debug!(
            hand = outcome.hand_number,
            players = summaries.len(),
            "opponent stats updated"
        );
    }

    /// Fixed-length opponent block: `max_slots * per_slot` values.
    ///
    /// Opponents fill slots in `seat_order` (the hero is skipped); slots with
    /// nobody in them are zero. Untracked players get neutral defaults.
    pub fn get_observation_features(
        &self,
        hero: usize,
        seat_order: &[usize],
        max_slots: usize,
        per_slot: usize,
    ) -> Vec<f32> {
        let mut out = Vec::with_capacity(max_slots * per_slot);
        for id in seat_order
            .iter()
            .copied()
            .filter(|&id| id != hero)
            .take(max_slots)
        {
            match self.profile(id) {
                Some(p) => out.extend(p.features(per_slot)),
                None => {
                    let start = out.len();
                    out.extend(UNTRACKED_FEATURES.iter().copied().take(per_slot));
                    out.resize(start + per_slot, 0.0);
                }
            }
        }
        out.resize(max_slots * per_slot, 0.0);
        out
    }

    /// Stat block plus encoded recent actions for one opponent, see
    /// [`OpponentProfile::opponent_features`]. Untracked players are all zero.
    pub fn opponent_features(
        &self,
        player_id: usize,
        num_seats: usize,
        window: usize,
    ) -> Vec<f32> {
        match self.profile(player_id) {
            Some(p) => p.opponent_features(num_seats, window),
            None => vec![0.0; OPPONENT_STAT_FEATURES + window],
        }
    }

    /// Players with at least `min_hands` hands whose VPIP, fold-to-3-bet or
    /// aggression deviates from balanced play, most exploitable first.
    pub fn get_exploitable_opponents(&self, min_hands: u32) -> Vec<ExploitableOpponent> {
        let mut found: Vec<ExploitableOpponent> = self
            .profiles()
            .filter(|p| p.hands_played >= min_hands)
            .filter_map(|p| {
                let exploits = exploits_for(p);
                if exploits.is_empty() {
                    return None;
                }
                Some(ExploitableOpponent {
                    player_id: p.player_id,
                    hands_played: p.hands_played,
                    style: p.style,
                    score: exploits.iter().map(|e| e.severity).sum(),
                    exploits,
                })
            })
            .collect();
        found.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.player_id.cmp(&b.player_id))
        });
        found
    }

    /// Up to `limit` finished hands `player_id` was dealt into, newest first.
    pub fn recent_hands(&self, player_id: usize, limit: usize) -> Vec<&HandRecord> {
        self.history
            .iter()
            .rev()
            .filter(|h| h.players.contains(&player_id))
            .take(limit)
            .collect()
    }

    pub fn player_count_for_hand(&self, hand_number: u64) -> Option<usize> {
        self.history
            .iter()
            .find(|h| h.hand_number == hand_number)
            .map(|h| h.players.len())
    }

    pub fn average_player_count(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: usize = self.history.iter().map(|h| h.players.len()).sum();
        total as f64 / self.history.len() as f64
    }

    pub fn hand_count_by_player_count(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for h in self.history.iter() {
            *counts.entry(h.players.len()).or_insert(0) += 1;
        }
        counts
    }

    /// Writes `{timestamp, total_hands, opponents}` as pretty JSON.
    pub fn export_stats<P: AsRef<Path>>(&self, path: P) -> Result<(), GameError> {
        let export = StatsExport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            total_hands: self.total_hands,
            opponents: self.profiles().map(|p| (p.player_id, p)).collect(),
        };
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, &export)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!(
            path = %path.as_ref().display(),
            opponents = export.opponents.len(),
            "stats exported"
        );
        Ok(())
    }
}

fn exploits_for(p: &OpponentProfile) -> Vec<Exploit> {
    let mut found = Vec::new();
    let mut push = |kind: ExploitKind, severity: f64| {
        found.push(Exploit {
            kind,
            severity,
            suggestion: kind.suggestion(),
        })
    };
    if p.vpip > 0.50 {
        push(ExploitKind::LooseVpip, p.vpip - 0.50);
    } else if p.vpip < 0.15 {
        push(ExploitKind::TightVpip, 0.15 - p.vpip);
    }
    if p.counters.faced_three_bet > 0 {
        if p.fold_to_three_bet > 0.50 {
            push(ExploitKind::FoldsToThreeBet, p.fold_to_three_bet - 0.50);
        } else if p.fold_to_three_bet < 0.30 {
            push(ExploitKind::CallsThreeBets, 0.30 - p.fold_to_three_bet);
        }
    }
    if p.aggression_factor < 0.8 {
        push(ExploitKind::Passive, 0.8 - p.aggression_factor);
    } else if p.aggression_factor > 3.0 {
        push(ExploitKind::Aggressive, p.aggression_factor - 3.0);
    }
    found
}

/// Replays one hand's actions street by street to decide which
/// opportunities each dealt-in player had and took.
fn summarize(hand: &HandRecord, actions: &[ActionRecord]) -> BTreeMap<usize, HandSummary> {
    let mut out: BTreeMap<usize, HandSummary> = hand
        .players
        .iter()
        .map(|&id| {
            let summary = HandSummary {
                position: hand.positions.get(&id).copied().unwrap_or(0),
                ..HandSummary::default()
            };
            (id, summary)
        })
        .collect();

    let mut folded_on: BTreeMap<usize, Street> = BTreeMap::new();
    let mut street: Option<Street> = None;
    let mut contributed: BTreeMap<usize, u32> = BTreeMap::new();
    let mut table_bet = 0u32;
    let mut preflop_raises = 0u32;
    let mut opener: Option<usize> = None;
    let mut callers_after_open = 0u32;
    let mut preflop_aggressor: Option<usize> = None;
    let mut cbet_made = false;
    let mut acted_on_flop: BTreeSet<usize> = BTreeSet::new();
    let mut answered_cbet: BTreeSet<usize> = BTreeSet::new();

    for a in actions {
        if street != Some(a.street) {
            street = Some(a.street);
            contributed.clear();
            table_bet = 0;
        }
        let id = a.player_id;
        let facing = table_bet;
        let total = contributed.entry(id).or_insert(0);
        *total += a.amount;
        let raised = *total > facing && a.kind != ActionKind::PostBlind;
        table_bet = table_bet.max(*total);
        if a.kind == ActionKind::Fold {
            folded_on.insert(id, a.street);
        }
        let Some(s) = out.get_mut(&id) else {
            continue;
        };

        match a.street {
            Street::Preflop if a.kind != ActionKind::PostBlind => {
                s.vpip |= a.kind.is_voluntary();
                s.pfr |= raised;
                if preflop_raises == 1 && opener != Some(id) {
                    s.three_bet_opportunity = true;
                    s.three_bet |= raised;
                    if callers_after_open > 0 {
                        s.squeeze_opportunity = true;
                        s.squeeze |= raised;
                    }
                }
                if preflop_raises >= 2 && opener == Some(id) && !s.faced_three_bet {
                    s.faced_three_bet = true;
                    s.folded_to_three_bet = a.kind == ActionKind::Fold;
                }
                if raised {
                    preflop_raises += 1;
                    opener.get_or_insert(id);
                    preflop_aggressor = Some(id);
                } else if a.kind == ActionKind::Call && preflop_raises == 1 {
                    callers_after_open += 1;
                }
            }
            Street::Flop => {
                let first_action = acted_on_flop.insert(id);
                if preflop_aggressor == Some(id) {
                    if first_action && facing == 0 {
                        s.cbet_opportunity = true;
                        s.cbet = raised;
                        cbet_made |= raised;
                    }
                } else if cbet_made && answered_cbet.insert(id) {
                    s.faced_cbet = true;
                    s.folded_to_cbet = a.kind == ActionKind::Fold;
                }
            }
            _ => {}
        }
    }

    let flop_reached = hand.board.len() >= 3;
    for (id, s) in out.iter_mut() {
        let folded = folded_on.get(id);
        s.saw_flop = flop_reached && folded != Some(&Street::Preflop);
        s.went_to_showdown = hand.showdown && folded.is_none();
        s.won_chips = hand.winnings.get(id).copied().unwrap_or(0) > 0;
    }
    out
}
