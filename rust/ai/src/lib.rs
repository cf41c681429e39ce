//! # riverbot-ai: Decision Policies for the Table Encoder
//!
//! Policies consume the fixed-length observation produced by
//! [`riverbot_engine::encoder::TableEncoder`] and answer with one of the
//! currently valid action ids. Learning algorithms live elsewhere; this
//! crate holds the reference opponents used for evaluation and testing.
//!
//! ## Core Components
//!
//! - [`Policy`] - Trait for anything that picks an action id
//! - [`baseline`] - Rule-based, call-station and seeded random policies
//! - [`session`] - Drives one or more full hands through an encoder
//! - [`create_policy`] - Factory for policies by name
//!
//! ## Quick Start
//!
//! ```rust
//! use riverbot_ai::create_policy;
//! use riverbot_ai::session::play_hand;
//! use riverbot_engine::config::{EncoderConfig, TableConfig};
//! use riverbot_engine::encoder::TableEncoder;
//!
//! let config = EncoderConfig {
//!     table: TableConfig::with_seats(3),
//!     seed: Some(42),
//!     ..EncoderConfig::default()
//! };
//! let mut table = TableEncoder::new(config).unwrap();
//! let mut seats = vec![
//!     create_policy("baseline", 0).unwrap(),
//!     create_policy("call", 1).unwrap(),
//!     create_policy("random", 2).unwrap(),
//! ];
//!
//! let played = play_hand(&mut table, &mut seats).unwrap();
//! assert!(played.completed);
//! ```
//!
//! ## Policy Kinds
//!
//! - `"baseline"` - Raises, calls or folds on the equity and pot-odds features
//! - `"call"` - Always checks or calls
//! - `"random"` - Uniform over the valid ids, reproducible from a seed

use riverbot_engine::errors::GameError;

pub mod baseline;
pub mod session;

/// Chooses an action id for the seat that is to act.
///
/// # Example Implementation
///
/// ```rust
/// use riverbot_ai::Policy;
/// use riverbot_engine::encoder::CHECK_CALL;
///
/// struct Stubborn;
///
/// impl Policy for Stubborn {
///     fn select_action(&mut self, _observation: &[f32], _valid: &[usize]) -> usize {
///         CHECK_CALL
///     }
///
///     fn name(&self) -> &str {
///         "Stubborn"
///     }
/// }
/// ```
pub trait Policy: Send {
    /// Picks one id out of `valid_actions` given the encoder's observation.
    ///
    /// Returning an id outside `valid_actions` is allowed; the encoder still
    /// downgrades it to something legal.
    fn select_action(&mut self, observation: &[f32], valid_actions: &[usize]) -> usize;

    fn name(&self) -> &str;
}

/// Creates a policy by kind name. `seed` only matters for `"random"`.
///
/// # Errors
///
/// [`GameError::InvalidConfig`] for an unknown kind.
///
/// # Example
///
/// ```rust
/// use riverbot_ai::create_policy;
///
/// let policy = create_policy("baseline", 0).unwrap();
/// assert_eq!(policy.name(), "BaselinePolicy");
/// assert!(create_policy("oracle", 0).is_err());
/// ```
pub fn create_policy(kind: &str, seed: u64) -> Result<Box<dyn Policy>, GameError> {
    match kind {
        "baseline" => Ok(Box::new(baseline::BaselinePolicy::new())),
        "call" => Ok(Box::new(baseline::CallPolicy)),
        "random" => Ok(Box::new(baseline::RandomPolicy::new(seed))),
        other => Err(GameError::InvalidConfig(format!(
            "unknown policy kind: {}",
            other
        ))),
    }
}
