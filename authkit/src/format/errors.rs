use thiserror::Error;

/// Failure to turn a token string back into a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),
}

/// Failure to turn a value into a token string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Failed to serialize claims: {0}")]
    Serialization(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error("Token too large: maximum {max} bytes, got {actual}")]
    TooLarge { max: usize, actual: usize },
}

/// Either direction of a format failing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
}
