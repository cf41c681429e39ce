use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Table must seat between 2 and 10 players, got {seats}")]
    InvalidTableSize { seats: usize },
    #[error("Need at least 2 players with chips to deal a hand, found {funded}")]
    NotEnoughPlayers { funded: usize },
    #[error("Invalid bet amount: {amount}, minimum: {minimum}")]
    InvalidBetAmount { amount: u32, minimum: u32 },
    #[error("No hand in progress")]
    NoHandInProgress,
    #[error("Hand already complete")]
    HandAlreadyComplete,
    #[error("Hand is not complete yet")]
    HandNotComplete,
    #[error("Betting round is not complete")]
    BettingRoundIncomplete,
    #[error("No player can act")]
    NoPlayerToAct,
    #[error("Unknown action id {id} (action space has {size} actions)")]
    InvalidAction { id: usize, size: usize },
    #[error("Unknown player {id}")]
    UnknownPlayer { id: usize },
    #[error("Deck exhausted")]
    DeckExhausted,
    #[error("Invalid card: {0}")]
    InvalidCard(String),
    #[error("Hand ranking failed: {0}")]
    Oracle(String),
    #[error("Chip conservation violated: expected {expected}, found {actual}")]
    ChipConservation { expected: u64, actual: u64 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
