use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown card rank: {0}")]
    InvalidRank(String),

    #[error("unknown move: {0}")]
    InvalidMove(String),

    #[error("invalid bet: {0}")]
    InvalidBet(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
