//! # riverbot-engine: Multiplayer Hold'em Hand Engine
//!
//! A deterministic Texas Hold'em engine for 2 to 10 seats. Deals hands,
//! drives betting through four streets, builds side pots for all-ins,
//! scores showdowns and exposes every decision point as a fixed-shape
//! observation with a discrete action set.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and deck construction
//! - [`deck`] - Deck dealing and shuffling from a caller-supplied RNG
//! - [`hand`] - Hand evaluation and the [`hand::RankingOracle`] trait
//! - [`player`] - Player state, actions, and stack management
//! - [`rules`] - Raise validation (lenient or strict)
//! - [`pot`] - Betting legality, side pots and payout
//! - [`game`] - Hand state machine: turn order, streets, resolution
//! - [`profile`] / [`tracker`] - Rolling opponent statistics
//! - [`equity`] - Heuristic and Monte Carlo equity estimates
//! - [`encoder`] - Observation vector and action ids for decision clients
//! - [`logger`] - HandRecord serialization and JSONL hand history
//! - [`config`] - Table and encoder configuration (TOML)
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use riverbot_engine::config::EncoderConfig;
//! use riverbot_engine::encoder::{TableEncoder, CHECK_CALL};
//!
//! let config = EncoderConfig {
//!     seed: Some(42),
//!     ..EncoderConfig::default()
//! };
//! let mut table = TableEncoder::new(config).unwrap();
//! let obs = table.reset_hand().unwrap();
//! assert_eq!(obs.len(), table.observation_len());
//!
//! // Everyone calls down until the hand ends
//! let mut steps = 0;
//! while table.current_player().is_some() && steps < 200 {
//!     let out = table.step(CHECK_CALL, None).unwrap();
//!     steps += 1;
//!     if out.terminal {
//!         break;
//!     }
//! }
//! assert!(table.last_result().is_some());
//! ```
//!
//! ## Deterministic Gameplay
//!
//! Randomness is always passed in explicitly, so the same seed replays the
//! same hand:
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//! use riverbot_engine::deck::Deck;
//!
//! let mut a = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(7));
//! let mut b = Deck::shuffled(&mut ChaCha20Rng::seed_from_u64(7));
//! assert_eq!(a.deal_card(), b.deal_card());
//! ```

pub mod cards;
pub mod config;
pub mod deck;
pub mod encoder;
pub mod equity;
pub mod errors;
pub mod game;
pub mod hand;
pub mod logger;
pub mod player;
pub mod pot;
pub mod profile;
pub mod ring;
pub mod rules;
pub mod tracker;
