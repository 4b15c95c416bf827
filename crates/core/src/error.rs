use thiserror::Error;

/// Errors that can occur in the planning core
#[derive(Error, Debug)]
pub enum ArborError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid reward bounds: {0}")]
    InvalidBounds(String),

    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Action {0} is not a child of the search root")]
    UnknownChild(String),

    #[error("No legal actions available")]
    NoLegalActions,
}

/// Convenience Result type for planning operations
pub type Result<T> = std::result::Result<T, ArborError>;
