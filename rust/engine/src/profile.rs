use std::collections::BTreeSet;

use serde::Serialize;

use crate::player::ActionKind;
use crate::ring::RingBuffer;

/// Actions kept for the aggression factor.
pub const RECENT_ACTION_WINDOW: usize = 50;
/// Hands needed before a style label is assigned.
pub const MIN_STYLE_HANDS: u32 = 10;
/// Hands at which confidence saturates at 1.0.
pub const CONFIDENCE_HANDS: u32 = 100;
/// Slot features for a player at the table who has no profile yet.
pub const UNTRACKED_FEATURES: [f32; 4] = [0.0, 0.0, 0.33, 0.0];

/// Coarse playing style derived from VPIP, PFR and aggression factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStyle {
    Unknown,
    TightAggressive,
    VeryTight,
    Tight,
    LooseAggressive,
    LoosePassive,
    Balanced,
}

impl PlayerStyle {
    pub fn classify(vpip: f64, pfr: f64, af: f64) -> PlayerStyle {
        if vpip < 0.25 && af > 2.0 {
            PlayerStyle::TightAggressive
        } else if vpip < 0.15 && pfr < 0.12 {
            PlayerStyle::VeryTight
        } else if vpip < 0.25 && pfr < 0.20 {
            PlayerStyle::Tight
        } else if vpip > 0.50 && pfr > 0.35 {
            PlayerStyle::LooseAggressive
        } else if vpip > 0.50 && af < 1.0 {
            PlayerStyle::LoosePassive
        } else {
            PlayerStyle::Balanced
        }
    }
}

/// Raw opportunity/hit counters. Rates are derived from these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileCounters {
    pub vpip_hands: u32,
    pub pfr_hands: u32,
    pub three_bet_opportunities: u32,
    pub three_bets: u32,
    pub faced_three_bet: u32,
    pub folded_to_three_bet: u32,
    pub squeeze_opportunities: u32,
    pub squeezes: u32,
    pub cbet_opportunities: u32,
    pub cbets: u32,
    pub faced_cbet: u32,
    pub folded_to_cbet: u32,
    pub saw_flop: u32,
    pub went_to_showdown: u32,
    pub won_at_showdown: u32,
    pub won_when_saw_flop: u32,
}

/// One player's hand, condensed to what the counters need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandSummary {
    pub position: usize,
    pub vpip: bool,
    pub pfr: bool,
    pub three_bet_opportunity: bool,
    pub three_bet: bool,
    pub faced_three_bet: bool,
    pub folded_to_three_bet: bool,
    /// Open raise and at least one caller in front, no re-raise yet
    pub squeeze_opportunity: bool,
    pub squeeze: bool,
    pub cbet_opportunity: bool,
    pub cbet: bool,
    pub faced_cbet: bool,
    pub folded_to_cbet: bool,
    pub saw_flop: bool,
    pub went_to_showdown: bool,
    pub won_chips: bool,
}

/// Rolling statistics for one player id, kept across hands.
#[derive(Debug, Clone, Serialize)]
pub struct OpponentProfile {
    pub player_id: usize,
    pub hands_played: u32,
    pub counters: ProfileCounters,
    /// Seat offsets from the button this player has been dealt in at
    pub positions: BTreeSet<usize>,
    pub vpip: f64,
    pub pfr: f64,
    pub aggression_factor: f64,
    pub three_bet_rate: f64,
    pub fold_to_three_bet: f64,
    pub squeeze_rate: f64,
    pub cbet_rate: f64,
    pub fold_to_cbet: f64,
    pub showdown_rate: f64,
    pub win_at_showdown_rate: f64,
    pub won_when_saw_flop_rate: f64,
    pub confidence: f64,
    pub style: PlayerStyle,
    #[serde(skip)]
    recent: RingBuffer<ActionKind>,
}

fn ratio(hits: u32, opportunities: u32) -> f64 {
    if opportunities == 0 {
        0.0
    } else {
        f64::from(hits) / f64::from(opportunities)
    }
}

impl OpponentProfile {
    pub fn new(player_id: usize) -> Self {
        Self {
            player_id,
            hands_played: 0,
            counters: ProfileCounters::default(),
            positions: BTreeSet::new(),
            vpip: 0.0,
            pfr: 0.0,
            aggression_factor: 1.0,
            three_bet_rate: 0.0,
            fold_to_three_bet: 0.0,
            squeeze_rate: 0.0,
            cbet_rate: 0.0,
            fold_to_cbet: 0.0,
            showdown_rate: 0.0,
            win_at_showdown_rate: 0.0,
            won_when_saw_flop_rate: 0.0,
            confidence: 0.0,
            style: PlayerStyle::Unknown,
            recent: RingBuffer::new(RECENT_ACTION_WINDOW),
        }
    }

    /// Adds a decision to the recent-action window. Blind posts are ignored.
    pub fn observe_action(&mut self, kind: ActionKind) {
        if kind != ActionKind::PostBlind {
            self.recent.push(kind);
        }
    }

    /// Recent decisions, oldest first.
    pub fn recent_actions(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.recent.iter().copied()
    }

    /// Folds one finished hand into the counters and recomputes every rate.
    pub fn apply_hand(&mut self, hand: &HandSummary) {
        self.hands_played += 1;
        self.positions.insert(hand.position);

        let c = &mut self.counters;
        c.vpip_hands += u32::from(hand.vpip);
        c.pfr_hands += u32::from(hand.pfr);
        c.three_bet_opportunities += u32::from(hand.three_bet_opportunity);
        c.three_bets += u32::from(hand.three_bet);
        c.faced_three_bet += u32::from(hand.faced_three_bet);
        c.folded_to_three_bet += u32::from(hand.folded_to_three_bet);
        c.squeeze_opportunities += u32::from(hand.squeeze_opportunity);
        c.squeezes += u32::from(hand.squeeze);
        c.cbet_opportunities += u32::from(hand.cbet_opportunity);
        c.cbets += u32::from(hand.cbet);
        c.faced_cbet += u32::from(hand.faced_cbet);
        c.folded_to_cbet += u32::from(hand.folded_to_cbet);
        c.saw_flop += u32::from(hand.saw_flop);
        c.went_to_showdown += u32::from(hand.went_to_showdown);
        c.won_at_showdown += u32::from(hand.went_to_showdown && hand.won_chips);
        c.won_when_saw_flop += u32::from(hand.saw_flop && hand.won_chips);

        self.recalculate();
    }

    pub fn recalculate(&mut self) {
        let c = &self.counters;
        self.vpip = ratio(c.vpip_hands, self.hands_played);
        self.pfr = ratio(c.pfr_hands, self.hands_played);
        self.three_bet_rate = ratio(c.three_bets, c.three_bet_opportunities);
        self.fold_to_three_bet = ratio(c.folded_to_three_bet, c.faced_three_bet);
        self.squeeze_rate = ratio(c.squeezes, c.squeeze_opportunities);
        self.cbet_rate = ratio(c.cbets, c.cbet_opportunities);
        self.fold_to_cbet = ratio(c.folded_to_cbet, c.faced_cbet);
        self.showdown_rate = ratio(c.went_to_showdown, c.saw_flop);
        self.win_at_showdown_rate = ratio(c.won_at_showdown, c.saw_flop);
        self.won_when_saw_flop_rate = ratio(c.won_when_saw_flop, c.saw_flop);
        self.aggression_factor = self.recent_aggression_factor();
        self.confidence = (f64::from(self.hands_played) / f64::from(CONFIDENCE_HANDS)).min(1.0);
        self.style = if self.hands_played >= MIN_STYLE_HANDS {
            PlayerStyle::classify(self.vpip, self.pfr, self.aggression_factor)
        } else {
            PlayerStyle::Unknown
        };
    }

    /// (raises + all-ins) / calls over the recent window, 1.0 when the window
    /// holds no calls.
    fn recent_aggression_factor(&self) -> f64 {
        let aggressive = self.recent.iter().filter(|k| k.is_aggressive()).count();
        let calls = self
            .recent
            .iter()
            .filter(|k| **k == ActionKind::Call)
            .count();
        if calls == 0 {
            1.0
        } else {
            aggressive as f64 / calls as f64
        }
    }

    /// Fraction of the table's seat offsets this player has been dealt in at.
    pub fn position_coverage(&self, seats: usize) -> f64 {
        if seats == 0 {
            return 0.0;
        }
        (self.positions.len() as f64 / seats as f64).min(1.0)
    }

    /// Observation slot for this player: vpip, pfr, af/3 and confidence,
    /// followed by fold-to-3-bet, c-bet, showdown and won-when-saw-flop
    /// rates, truncated or zero-padded to `width`.
    pub fn features(&self, width: usize) -> Vec<f32> {
        let all = [
            self.vpip.min(1.0),
            self.pfr.min(1.0),
            (self.aggression_factor / 3.0).min(1.0),
            self.confidence,
            self.fold_to_three_bet,
            self.cbet_rate,
            self.showdown_rate,
            self.won_when_saw_flop_rate,
        ];
        let mut out: Vec<f32> = all.iter().take(width).map(|v| *v as f32).collect();
        out.resize(width, 0.0);
        out
    }

    /// Per-opponent vector: vpip, pfr, af/3, hands/100 and position
    /// coverage, then the last `window` recent actions encoded oldest first
    /// and zero-padded at the end.
    pub fn opponent_features(&self, seats: usize, window: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(OPPONENT_STAT_FEATURES + window);
        out.extend(
            [
                self.vpip.min(1.0),
                self.pfr.min(1.0),
                (self.aggression_factor / 3.0).min(1.0),
                (f64::from(self.hands_played) / f64::from(CONFIDENCE_HANDS)).min(1.0),
                self.position_coverage(seats),
            ]
            .map(|v| v as f32),
        );
        let skip = self.recent.len().saturating_sub(window);
        out.extend(self.recent.iter().skip(skip).map(|k| encode_action(*k)));
        out.resize(OPPONENT_STAT_FEATURES + window, 0.0);
        out
    }
}

/// Leading stat entries of [`OpponentProfile::opponent_features`].
pub const OPPONENT_STAT_FEATURES: usize = 5;

/// Scalar encoding of a decision for the recent-action features.
pub fn encode_action(kind: ActionKind) -> f32 {
    match kind {
        ActionKind::Fold => 0.0,
        ActionKind::Check => 0.2,
        ActionKind::Call => 0.4,
        ActionKind::Raise => 0.8,
        ActionKind::AllIn => 1.0,
        ActionKind::PostBlind => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggression_factor_is_one_without_calls() {
        let mut p = OpponentProfile::new(1);
        p.recalculate();
        assert_eq!(p.aggression_factor, 1.0);
        p.observe_action(ActionKind::Raise);
        p.observe_action(ActionKind::AllIn);
        p.recalculate();
        assert_eq!(p.aggression_factor, 1.0);
        p.observe_action(ActionKind::Call);
        p.observe_action(ActionKind::Call);
        p.observe_action(ActionKind::Call);
        p.observe_action(ActionKind::Call);
        p.recalculate();
        assert_eq!(p.aggression_factor, 0.5);
    }

    #[test]
    fn pure_raiser_keeps_neutral_aggression() {
        let mut p = OpponentProfile::new(2);
        for _ in 0..RECENT_ACTION_WINDOW {
            p.observe_action(ActionKind::Raise);
        }
        p.apply_hand(&HandSummary::default());
        assert_eq!(p.aggression_factor, 1.0);
    }

    #[test]
    fn opponent_features_take_latest_actions() {
        let mut p = OpponentProfile::new(0);
        p.observe_action(ActionKind::Fold);
        p.observe_action(ActionKind::Call);
        p.observe_action(ActionKind::Raise);
        p.apply_hand(&HandSummary {
            position: 1,
            ..HandSummary::default()
        });
        let f = p.opponent_features(4, 2);
        assert_eq!(f.len(), OPPONENT_STAT_FEATURES + 2);
        assert!((f[3] - 0.01).abs() < 1e-6);
        assert_eq!(f[4], 0.25);
        assert_eq!(&f[5..], &[0.4, 0.8]);
        let padded = p.opponent_features(4, 5);
        assert_eq!(&padded[5..], &[0.0, 0.4, 0.8, 0.0, 0.0]);
    }

    #[test]
    fn blind_posts_do_not_enter_window() {
        let mut p = OpponentProfile::new(0);
        p.observe_action(ActionKind::PostBlind);
        assert_eq!(p.recent_actions().count(), 0);
    }

    #[test]
    fn style_needs_sample() {
        let mut p = OpponentProfile::new(0);
        let loose = HandSummary {
            vpip: true,
            pfr: true,
            ..HandSummary::default()
        };
        for _ in 0..MIN_STYLE_HANDS - 1 {
            p.apply_hand(&loose);
        }
        assert_eq!(p.style, PlayerStyle::Unknown);
        p.apply_hand(&loose);
        assert_eq!(p.style, PlayerStyle::LooseAggressive);
        assert!((p.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn features_pad_to_width() {
        let p = OpponentProfile::new(0);
        assert_eq!(p.features(4).len(), 4);
        assert_eq!(p.features(10).len(), 10);
        assert_eq!(p.features(10)[9], 0.0);
    }
}
