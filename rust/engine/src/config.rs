use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::GameError;

pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 10;

/// How raises below the table minimum are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaisePolicy {
    /// Clamp short raises up to the minimum.
    #[default]
    Lenient,
    /// Reject short raises with `GameError::InvalidBetAmount`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub seats: usize,
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    /// Fraction of each contested pot taken as rake (0.0 to 1.0).
    pub rake_percent: f64,
    /// Upper bound on rake per pot; 0 disables rake.
    pub rake_cap: u32,
    /// Minimum raise = last raise delta x multiplier (2.0 for the 2x rule).
    pub min_raise_multiplier: f64,
    pub raise_policy: RaisePolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            seats: 6,
            starting_stack: 1_000,
            small_blind: 5,
            big_blind: 10,
            rake_percent: 0.0,
            rake_cap: 0,
            min_raise_multiplier: 1.0,
            raise_policy: RaisePolicy::Lenient,
        }
    }
}

impl TableConfig {
    pub fn with_seats(seats: usize) -> Self {
        Self {
            seats,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&self.seats) {
            return Err(GameError::InvalidTableSize { seats: self.seats });
        }
        if self.starting_stack == 0 {
            return Err(GameError::InvalidConfig(
                "starting_stack must be >0".into(),
            ));
        }
        if self.big_blind == 0 || self.small_blind > self.big_blind {
            return Err(GameError::InvalidConfig(
                "blinds must satisfy 0 <= small_blind <= big_blind and big_blind > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rake_percent) {
            return Err(GameError::InvalidConfig(
                "rake_percent must be within [0, 1]".into(),
            ));
        }
        if !(self.min_raise_multiplier.is_finite() && self.min_raise_multiplier >= 1.0) {
            return Err(GameError::InvalidConfig(
                "min_raise_multiplier must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub table: TableConfig,
    /// Seat whose reward is reported and whose view is used once a hand ends.
    pub hero: usize,
    /// Raise sizes as fractions of the pot, one action id each.
    pub raise_bins: Vec<f64>,
    pub include_all_in: bool,
    pub track_opponents: bool,
    pub max_opponent_slots: usize,
    pub features_per_opponent: usize,
    pub equity_samples: usize,
    pub history_capacity: usize,
    /// Refill busted seats to the starting stack before each hand.
    pub rebuy_busted: bool,
    pub seed: Option<u64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            hero: 0,
            raise_bins: vec![0.5, 1.0, 2.0],
            include_all_in: true,
            track_opponents: true,
            max_opponent_slots: MAX_SEATS - 1,
            features_per_opponent: 4,
            equity_samples: 200,
            history_capacity: 1_000,
            rebuy_busted: true,
            seed: None,
        }
    }
}

impl EncoderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, GameError> {
        let cfg: EncoderConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        self.table.validate()?;
        if self.hero >= self.table.seats {
            return Err(GameError::InvalidConfig(format!(
                "hero seat {} is outside a {}-seat table",
                self.hero, self.table.seats
            )));
        }
        if self
            .raise_bins
            .iter()
            .any(|f| !f.is_finite() || *f <= 0.0)
        {
            return Err(GameError::InvalidConfig(
                "raise_bins must be positive pot fractions".into(),
            ));
        }
        if self.equity_samples == 0 {
            return Err(GameError::InvalidConfig(
                "equity_samples must be >0".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(GameError::InvalidConfig(
                "history_capacity must be >0".into(),
            ));
        }
        Ok(())
    }
}
