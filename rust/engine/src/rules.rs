use crate::config::RaisePolicy;
use crate::errors::GameError;
use crate::player::PlayerAction as A;

/// A requested action resolved into the chips it commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    /// Call for the given amount.
    Call(u32),
    /// Commit the given total this turn (call + raise increment).
    Raise(u32),
    /// Commit the whole remaining stack.
    AllIn(u32),
}

impl ValidatedAction {
    /// Chips this action hands to the pot manager.
    pub fn chips(&self) -> u32 {
        match self {
            ValidatedAction::Fold | ValidatedAction::Check => 0,
            ValidatedAction::Call(n) | ValidatedAction::Raise(n) | ValidatedAction::AllIn(n) => *n,
        }
    }
}

/// Validates a player action according to betting rules and stack size.
///
/// Converts a [`crate::player::PlayerAction`] into a [`ValidatedAction`],
/// enforcing the minimum raise and collapsing anything the stack cannot
/// cover into an all-in.
///
/// # Arguments
///
/// * `stack` - Player's remaining chip stack
/// * `to_call` - Amount needed to call the current bet
/// * `min_raise` - Minimum raise increment at the table
/// * `action` - The action the player wishes to perform
/// * `policy` - Whether a short raise is clamped up or rejected
///
/// # Errors
///
/// [`GameError::InvalidBetAmount`] when `policy` is [`RaisePolicy::Strict`]
/// and the raise increment is below `min_raise`.
///
/// # Examples
///
/// ```
/// use riverbot_engine::config::RaisePolicy;
/// use riverbot_engine::player::PlayerAction;
/// use riverbot_engine::rules::{validate_action, ValidatedAction};
///
/// // Short raise is clamped to the minimum
/// let v = validate_action(1000, 50, 100, PlayerAction::Raise(20), RaisePolicy::Lenient);
/// assert_eq!(v.unwrap(), ValidatedAction::Raise(150));
///
/// // Not enough behind for the full raise
/// let v = validate_action(80, 50, 100, PlayerAction::Raise(100), RaisePolicy::Lenient);
/// assert_eq!(v.unwrap(), ValidatedAction::AllIn(80));
/// ```
pub fn validate_action(
    stack: u32,
    to_call: u32,
    min_raise: u32,
    action: A,
    policy: RaisePolicy,
) -> Result<ValidatedAction, GameError> {
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::CheckOrCall => {
            if to_call == 0 {
                Ok(ValidatedAction::Check)
            } else if stack <= to_call {
                Ok(ValidatedAction::AllIn(stack))
            } else {
                Ok(ValidatedAction::Call(to_call))
            }
        }
        A::Raise(amount) => {
            if amount.saturating_add(to_call) >= stack {
                return Ok(ValidatedAction::AllIn(stack));
            }
            if amount >= min_raise {
                return Ok(ValidatedAction::Raise(to_call + amount));
            }
            match policy {
                RaisePolicy::Strict => Err(GameError::InvalidBetAmount {
                    amount,
                    minimum: min_raise,
                }),
                RaisePolicy::Lenient => {
                    tracing::warn!(amount, minimum = min_raise, "raise below minimum clamped");
                    if to_call.saturating_add(min_raise) >= stack {
                        Ok(ValidatedAction::AllIn(stack))
                    } else {
                        Ok(ValidatedAction::Raise(to_call + min_raise))
                    }
                }
            }
        }
        A::AllIn => Ok(ValidatedAction::AllIn(stack)),
    }
}
