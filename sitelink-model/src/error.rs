use thiserror::Error;

/// Errors raised while parsing or validating model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown request status: {0}")]
    InvalidStatus(String),

    #[error("unknown communication kind: {0}")]
    InvalidCommunication(String),

    #[error("unknown request kind: {0}")]
    InvalidRequestKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
