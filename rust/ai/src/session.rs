//! Plays whole hands through a [`TableEncoder`], one policy per seat.

use riverbot_engine::encoder::TableEncoder;
use riverbot_engine::errors::GameError;
use riverbot_engine::game::HandResult;

use crate::Policy;

/// Decisions allowed per hand before the driver gives up on it.
pub const MAX_STEPS_PER_HAND: usize = 500;

/// What happened in one driven hand.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedHand {
    pub hand_number: u64,
    /// Decisions taken by the policies
    pub steps: usize,
    /// False if the step limit was hit before the hand resolved
    pub completed: bool,
    /// Hero reward from the terminal step; 0.0 when nobody had to act
    pub hero_reward: f32,
    pub result: Option<HandResult>,
}

/// Deals a hand and asks `policies[seat]` for every decision until the hand
/// resolves or [`MAX_STEPS_PER_HAND`] is reached.
///
/// # Errors
///
/// [`GameError::InvalidConfig`] if a seat to act has no policy; any error
/// from dealing or stepping the hand.
pub fn play_hand(
    encoder: &mut TableEncoder,
    policies: &mut [Box<dyn Policy>],
) -> Result<PlayedHand, GameError> {
    let mut observation = encoder.reset_hand()?;
    let hand_number = encoder.state().hand_number();
    let mut steps = 0;
    let mut hero_reward = 0.0;

    while let Some(seat) = encoder.current_player() {
        if steps >= MAX_STEPS_PER_HAND {
            tracing::warn!(hand = hand_number, steps, "step limit reached, abandoning hand");
            return Ok(PlayedHand {
                hand_number,
                steps,
                completed: false,
                hero_reward,
                result: None,
            });
        }
        let valid = encoder.get_valid_actions();
        let policy = policies.get_mut(seat).ok_or_else(|| {
            GameError::InvalidConfig(format!("no policy for seat {}", seat))
        })?;
        let action_id = policy.select_action(&observation, &valid);
        tracing::debug!(
            hand = hand_number,
            seat,
            policy = policy.name(),
            action = %encoder.get_action_description(action_id),
            "policy decision"
        );

        let outcome = encoder.step(action_id, None)?;
        steps += 1;
        observation = outcome.observation;
        if outcome.terminal {
            hero_reward = outcome.info.reward;
            break;
        }
    }

    Ok(PlayedHand {
        hand_number,
        steps,
        completed: encoder.last_result().is_some(),
        hero_reward,
        result: encoder.last_result().cloned(),
    })
}

/// Plays `hands` hands in a row and returns each summary.
pub fn play_hands(
    encoder: &mut TableEncoder,
    policies: &mut [Box<dyn Policy>],
    hands: usize,
) -> Result<Vec<PlayedHand>, GameError> {
    (0..hands).map(|_| play_hand(encoder, policies)).collect()
}
